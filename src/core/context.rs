//! Per-template context generators.

use crate::core::data::load_csv;
use crate::error::{BoxError, PagefireError, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use tera::Context;

/// A zero-argument function producing the context for one template.
pub type ContextGenerator = Box<dyn Fn() -> std::result::Result<Context, BoxError> + Send + Sync>;

/// Maps template names (`sub/page.haml`) to the generator that builds their context.
///
/// Populated before the first build and only read afterwards. Templates with no
/// registered generator render with an empty context.
#[derive(Default)]
pub struct ContextRegistry {
  generators: HashMap<String, ContextGenerator>,
}

impl ContextRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `generator` for the template at `path`, replacing any earlier one.
  pub fn register<P, F>(&mut self, path: P, generator: F) -> &mut Self
  where
    P: Into<String>,
    F: Fn() -> std::result::Result<Context, BoxError> + Send + Sync + 'static,
  {
    self.generators.insert(path.into(), Box::new(generator));
    self
  }

  /// Registers a generator that loads `csv_file` on every build and exposes
  /// its rows to the template as `key`.
  pub fn register_csv<P, K, F>(&mut self, path: P, key: K, csv_file: F) -> &mut Self
  where
    P: Into<String>,
    K: Into<String>,
    F: Into<PathBuf>,
  {
    let key = key.into();
    let csv_file = csv_file.into();

    self.register(path, move || {
      let rows = load_csv(&csv_file)?;
      let mut context = Context::new();
      context.insert(key.as_str(), &rows);
      Ok(context)
    })
  }

  pub fn contains(&self, path: &str) -> bool {
    self.generators.contains_key(path)
  }

  pub fn len(&self) -> usize {
    self.generators.len()
  }

  pub fn is_empty(&self) -> bool {
    self.generators.is_empty()
  }

  /// Runs the generator registered for `path` and returns its context verbatim,
  /// or an empty context if none is registered.
  pub fn resolve(&self, path: &str) -> Result<Context> {
    match self.generators.get(path) {
      Some(generator) => generator().map_err(|source| PagefireError::Context {
        template: path.to_string(),
        source,
      }),
      None => Ok(Context::new()),
    }
  }
}

impl std::fmt::Debug for ContextRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let mut paths: Vec<&String> = self.generators.keys().collect();
    paths.sort();
    f.debug_struct("ContextRegistry").field("paths", &paths).finish()
  }
}
