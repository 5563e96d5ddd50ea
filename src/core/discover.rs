//! Template discovery: walks the template root and selects renderable files.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Leading marker for partials (`_header.haml`).
const PARTIAL_MARKER: char = '_';
/// Leading marker for hidden files (`.swp`, `.DS_Store`).
const HIDDEN_MARKER: char = '.';
/// Separator between a file's stem and its extension.
const EXTENSION_SEPARATOR: char = '.';

/// A template file found under the template root.
///
/// Templates are discovered fresh on every build pass and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
  path: PathBuf,
  relative: PathBuf,
  name: String,
}

impl Template {
  /// Builds a `Template` for `path`, which must live under `root` and be
  /// valid UTF-8 so it can be addressed by name.
  pub(crate) fn new(root: &Path, path: PathBuf) -> Option<Self> {
    let relative = path.strip_prefix(root).ok()?.to_path_buf();
    let name = relative
      .components()
      .map(|c| c.as_os_str().to_str())
      .collect::<Option<Vec<_>>>()?
      .join("/");

    Some(Self { path, relative, name })
  }

  /// The full path of the source file.
  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Path relative to the template root.
  pub fn relative_path(&self) -> &Path {
    &self.relative
  }

  /// The `/`-separated relative path. This is the name the template is
  /// registered under in Tera and the key used for context lookup.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Relative path with the last extension removed (`sub/page.haml` -> `sub/page`).
  pub fn base_name(&self) -> PathBuf {
    self.relative.with_extension("")
  }

  pub fn extension(&self) -> Option<&str> {
    self.relative.extension().and_then(|e| e.to_str())
  }

  /// Where the rendered page goes: the relative path under `output_root`
  /// with its last extension replaced by `extension`.
  pub fn output_path(&self, output_root: &Path, extension: &str) -> PathBuf {
    output_root.join(self.relative.with_extension(extension))
  }
}

/// Returns true if a file with this name should be rendered on its own.
///
/// Partials (leading underscore), hidden files (leading dot) and names
/// without any extension separator are excluded.
pub fn should_render(file_name: &str) -> bool {
  !file_name.starts_with(PARTIAL_MARKER) && is_loadable(file_name)
}

/// Files Tera should know about: everything renderable plus partials, so that
/// `include` and `extends` can reach them.
pub(crate) fn is_loadable(file_name: &str) -> bool {
  !file_name.starts_with(HIDDEN_MARKER) && file_name.split(EXTENSION_SEPARATOR).count() > 1
}

/// Lazily walks `root` depth-first, yielding renderable templates in
/// lexicographic order per directory.
///
/// A missing root yields nothing. Call again to restart the walk.
pub fn find_templates(root: &Path) -> TemplateWalk {
  TemplateWalk::new(root, should_render)
}

pub(crate) fn find_loadable(root: &Path) -> TemplateWalk {
  TemplateWalk::new(root, is_loadable)
}

/// Iterator returned by [`find_templates`].
pub struct TemplateWalk {
  root: PathBuf,
  entries: walkdir::IntoIter,
  accept: fn(&str) -> bool,
}

impl TemplateWalk {
  fn new(root: &Path, accept: fn(&str) -> bool) -> Self {
    let entries = WalkDir::new(root)
      .follow_links(true)
      .sort_by_file_name()
      .into_iter();

    Self {
      root: root.to_path_buf(),
      entries,
      accept,
    }
  }
}

impl std::fmt::Debug for TemplateWalk {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TemplateWalk").field("root", &self.root).finish_non_exhaustive()
  }
}

impl Iterator for TemplateWalk {
  type Item = Template;

  fn next(&mut self) -> Option<Template> {
    loop {
      let entry = match self.entries.next()? {
        Ok(entry) => entry,
        Err(e) => {
          log::debug!("Skipping unreadable entry under {}: {}", self.root.display(), e);
          continue;
        }
      };

      if !entry.file_type().is_file() {
        continue;
      }

      let Some(file_name) = entry.file_name().to_str() else {
        log::debug!("Skipping file with a non UTF-8 name: {}", entry.path().display());
        continue;
      };
      if !(self.accept)(file_name) {
        continue;
      }

      match Template::new(&self.root, entry.into_path()) {
        Some(template) => return Some(template),
        None => log::debug!("Skipping template with a non UTF-8 path under {}", self.root.display()),
      }
    }
  }
}
