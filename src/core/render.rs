//! Renders a single template and writes the page next to its siblings.

use crate::core::discover::Template;
use crate::error::{PagefireError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

/// Renders `template` with `context` and writes the result under
/// `output_root`, replacing the template's extension with `extension`.
///
/// Any existing file is truncated and overwritten in a single write.
/// Returns the path that was written.
pub fn render_template(
  tera: &Tera,
  template: &Template,
  context: &Context,
  output_root: &Path,
  extension: &str,
) -> Result<PathBuf> {
  log::info!("Building {}...", template.name());

  let body = tera.render(template.name(), context)?;
  let output = template.output_path(output_root, extension);
  write_output(&output, &body)?;

  Ok(output)
}

fn write_output(path: &Path, body: &str) -> Result<()> {
  let wrap = |source| PagefireError::Write {
    path: path.to_path_buf(),
    source,
  };

  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent).map_err(wrap)?;
  }
  fs::write(path, body).map_err(wrap)
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  fn tera_with(name: &str, content: &str) -> Tera {
    let mut tera = Tera::default();
    tera.add_raw_template(name, content).unwrap();
    tera
  }

  #[test]
  fn test_render_writes_html_next_to_relative_path() {
    let out = tempdir().unwrap();
    let root = Path::new("/templates");
    let template = Template::new(root, root.join("sub").join("page.haml")).unwrap();
    let tera = tera_with("sub/page.haml", "Hello, {{ name }}!");
    let mut context = Context::new();
    context.insert("name", "World");

    let written = render_template(&tera, &template, &context, out.path(), "html").unwrap();

    assert_eq!(written, out.path().join("sub").join("page.html"));
    assert_eq!(fs::read_to_string(&written).unwrap(), "Hello, World!");
  }

  #[test]
  fn test_render_truncates_existing_output() {
    let out = tempdir().unwrap();
    let root = Path::new("/templates");
    let template = Template::new(root, root.join("index.haml")).unwrap();
    fs::write(out.path().join("index.html"), "a much longer stale page body").unwrap();
    let tera = tera_with("index.haml", "fresh");

    render_template(&tera, &template, &Context::new(), out.path(), "html").unwrap();

    assert_eq!(fs::read_to_string(out.path().join("index.html")).unwrap(), "fresh");
  }

  #[test]
  fn test_undefined_variable_is_an_error_and_writes_nothing() {
    let out = tempdir().unwrap();
    let root = Path::new("/templates");
    let template = Template::new(root, root.join("index.haml")).unwrap();
    let tera = tera_with("index.haml", "{{ missing }}");

    let result = render_template(&tera, &template, &Context::new(), out.path(), "html");

    assert!(matches!(result, Err(PagefireError::Tera(_))));
    assert!(!out.path().join("index.html").exists());
  }
}
