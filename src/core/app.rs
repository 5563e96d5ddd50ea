use crate::core::context::ContextRegistry;
use crate::core::discover::{Template, TemplateWalk, find_loadable, find_templates};
use crate::core::render::render_template;
use crate::error::{BoxError, Result};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

/// Default extension for rendered pages.
pub const DEFAULT_OUTPUT_EXTENSION: &str = "html";

type TeraConfigurator = Box<dyn Fn(&mut Tera) + Send + Sync>;

/// Outcome of a successful build pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
  /// Written pages, in render order.
  pub rendered: Vec<PathBuf>,
}

impl BuildReport {
  pub fn len(&self) -> usize {
    self.rendered.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rendered.is_empty()
  }
}

/// A template tree plus everything needed to turn it into pages.
///
/// It holds the Tera engine loaded by the most recent pass, the context
/// registry and the output configuration. It is created using the
/// `Site::builder()` method and is safe to share across threads.
pub struct Site {
  template_root: PathBuf,
  output_root: PathBuf,
  extension: String,
  registry: ContextRegistry,
  /// Site-wide variables placed beneath every per-template context.
  globals: Context,
  tera_configurator: Option<TeraConfigurator>,
  /// Swapped for a freshly loaded instance at the start of every pass.
  tera: RwLock<Tera>,
  /// Held for the whole of a pass so passes never overlap.
  build_lock: Mutex<()>,
}

impl Site {
  /// Creates a new `SiteBuilder` for the templates under `template_root`.
  pub fn builder(template_root: impl Into<PathBuf>) -> SiteBuilder {
    SiteBuilder::new(template_root)
  }

  pub fn template_root(&self) -> &Path {
    &self.template_root
  }

  pub fn output_root(&self) -> &Path {
    &self.output_root
  }

  pub fn extension(&self) -> &str {
    &self.extension
  }

  pub fn registry(&self) -> &ContextRegistry {
    &self.registry
  }

  /// The renderable templates currently on disk.
  pub fn templates(&self) -> TemplateWalk {
    find_templates(&self.template_root)
  }

  /// Performs one full build pass.
  ///
  /// The template tree is reloaded from disk, then every renderable template
  /// is rendered with its resolved context and written under the output root.
  /// The first failure aborts the pass; pages already written stay on disk.
  pub fn build(&self) -> Result<BuildReport> {
    let _pass = self.build_lock.lock();

    *self.tera.write() = self.load_tera()?;
    let tera = self.tera.read();

    let mut report = BuildReport::default();
    for template in self.templates() {
      let context = self.resolve_context(&template)?;
      let output = render_template(&tera, &template, &context, &self.output_root, &self.extension)?;
      report.rendered.push(output);
    }

    Ok(report)
  }

  /// Renders a single template by name with the engine from the latest pass,
  /// without writing anything.
  pub fn render(&self, name: &str, context: Context) -> Result<String> {
    let tera = self.tera.read();

    let mut final_context = self.globals.clone();
    final_context.extend(context);

    Ok(tera.render(name, &final_context)?)
  }

  fn resolve_context(&self, template: &Template) -> Result<Context> {
    let mut context = self.globals.clone();
    context.extend(self.registry.resolve(template.name())?);
    Ok(context)
  }

  fn load_tera(&self) -> Result<Tera> {
    let mut tera = Tera::default();
    // Pages get context values exactly as given; `configure_tera` can opt back in.
    tera.autoescape_on(vec![]);
    if let Some(configure) = &self.tera_configurator {
      configure(&mut tera);
    }

    let files: Vec<(PathBuf, Option<String>)> = find_loadable(&self.template_root)
      .map(|t| {
        let name = t.name().to_string();
        (t.path().to_path_buf(), Some(name))
      })
      .collect();
    log::debug!("Loading {} template file(s) from {}", files.len(), self.template_root.display());
    tera.add_template_files(files)?;

    Ok(tera)
  }
}

impl std::fmt::Debug for Site {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Site")
      .field("template_root", &self.template_root)
      .field("output_root", &self.output_root)
      .field("extension", &self.extension)
      .field("registry", &self.registry)
      .finish_non_exhaustive()
  }
}

/// A builder for creating a configured `Site`.
pub struct SiteBuilder {
  template_root: PathBuf,
  output_root: PathBuf,
  extension: String,
  registry: ContextRegistry,
  globals: Context,
  tera_configurator: Option<TeraConfigurator>,
}

impl SiteBuilder {
  pub(crate) fn new(template_root: impl Into<PathBuf>) -> Self {
    Self {
      template_root: template_root.into(),
      output_root: PathBuf::from("."),
      extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
      registry: ContextRegistry::new(),
      globals: Context::new(),
      tera_configurator: None,
    }
  }

  /// Directory pages are written into. Defaults to the working directory.
  pub fn output_root(mut self, path: impl Into<PathBuf>) -> Self {
    self.output_root = path.into();
    self
  }

  /// Extension given to rendered pages, without the dot. Defaults to `html`.
  pub fn extension(mut self, extension: impl Into<String>) -> Self {
    self.extension = extension.into().trim_start_matches('.').to_string();
    self
  }

  /// Adds a global variable that will be available to all templates.
  ///
  /// Per-template context values with the same key take precedence.
  pub fn add_global<S: Into<String>, T: Serialize>(mut self, key: S, value: T) -> Self {
    self.globals.insert(key.into(), &value);
    self
  }

  /// Registers a context generator for the template at `path` (relative to
  /// the template root, `/`-separated).
  pub fn register_context<P, F>(mut self, path: P, generator: F) -> Self
  where
    P: Into<String>,
    F: Fn() -> std::result::Result<Context, BoxError> + Send + Sync + 'static,
  {
    self.registry.register(path, generator);
    self
  }

  /// Binds the rows of `csv_file` to `key` in the context of `path`.
  pub fn register_csv<P, K, F>(mut self, path: P, key: K, csv_file: F) -> Self
  where
    P: Into<String>,
    K: Into<String>,
    F: Into<PathBuf>,
  {
    self.registry.register_csv(path, key, csv_file);
    self
  }

  /// Replaces the whole registry with one populated elsewhere.
  pub fn registry(mut self, registry: ContextRegistry) -> Self {
    self.registry = registry;
    self
  }

  /// Provides a closure to run on every freshly loaded `Tera` instance.
  ///
  /// This is where custom functions, filters, testers or autoescape
  /// settings are registered. It runs once per build pass.
  pub fn configure_tera<F>(mut self, configurator: F) -> Self
  where
    F: Fn(&mut Tera) + Send + Sync + 'static,
  {
    self.tera_configurator = Some(Box::new(configurator));
    self
  }

  /// Consumes the builder to construct the `Site`.
  ///
  /// The template root is made absolute when it exists and the template tree
  /// is loaded once, so syntax errors surface here. A missing root is not an
  /// error; it simply has no templates.
  pub fn build(self) -> Result<Site> {
    let template_root = match fs::canonicalize(&self.template_root) {
      Ok(root) => root,
      Err(e) if e.kind() == ErrorKind::NotFound => {
        log::warn!("Template root does not exist: {}", self.template_root.display());
        self.template_root
      }
      Err(e) => return Err(e.into()),
    };

    let mut site = Site {
      template_root,
      output_root: self.output_root,
      extension: self.extension,
      registry: self.registry,
      globals: self.globals,
      tera_configurator: self.tera_configurator,
      tera: RwLock::new(Tera::default()),
      build_lock: Mutex::new(()),
    };
    let tera = site.load_tera()?;
    site.tera = RwLock::new(tera);

    Ok(site)
  }
}
