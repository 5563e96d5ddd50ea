//! Optional `pagefire.toml` configuration.
//!
//! ```toml
//! templates = "templates"
//! output = "public"
//! extension = "html"
//! poll_interval = 0.5
//!
//! [globals]
//! site_name = "My Site"
//!
//! [contexts."people.html"]
//! csv = "data/people.csv"
//! key = "people"
//! ```

use crate::core::app::{DEFAULT_OUTPUT_EXTENSION, SiteBuilder};
use crate::core::reload::{DEFAULT_POLL_INTERVAL, WatchOptions};
use crate::error::{PagefireError, Result};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "pagefire.toml";

/// Site configuration. Every field has a default, so an absent file is
/// equivalent to an empty one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
  /// Template root.
  pub templates: PathBuf,
  /// Directory pages are written into.
  pub output: PathBuf,
  /// Extension of rendered pages.
  pub extension: String,
  /// Seconds between keep-alive ticks in watch mode.
  pub poll_interval: f64,
  /// Variables available to every template.
  pub globals: toml::Table,
  /// CSV-backed contexts keyed by template path.
  pub contexts: BTreeMap<String, CsvContext>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CsvContext {
  pub csv: PathBuf,
  #[serde(default = "default_csv_key")]
  pub key: String,
}

fn default_csv_key() -> String {
  "rows".to_string()
}

impl Default for SiteConfig {
  fn default() -> Self {
    Self {
      templates: PathBuf::from("templates"),
      output: PathBuf::from("."),
      extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
      poll_interval: DEFAULT_POLL_INTERVAL.as_secs_f64(),
      globals: toml::Table::new(),
      contexts: BTreeMap::new(),
    }
  }
}

impl SiteConfig {
  pub fn from_toml(src: &str) -> Result<Self> {
    toml::from_str(src).map_err(|e| PagefireError::Config(e.to_string()))
  }

  /// Reads `path`. Relative paths inside the file are resolved against the
  /// directory containing it.
  pub fn load(path: &Path) -> Result<Self> {
    let src = fs::read_to_string(path)
      .map_err(|e| PagefireError::Config(format!("cannot read {}: {}", path.display(), e)))?;
    let mut config = Self::from_toml(&src)?;

    if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      config.rebase(base);
    }
    Ok(config)
  }

  /// Loads `explicit` if given (it must exist), otherwise `pagefire.toml` in
  /// the working directory if present, otherwise the defaults.
  pub fn discover(explicit: Option<&Path>) -> Result<Self> {
    match explicit {
      Some(path) => Self::load(path),
      None => {
        let default = Path::new(DEFAULT_CONFIG_FILE);
        if default.is_file() {
          log::debug!("Using {}", DEFAULT_CONFIG_FILE);
          Self::load(default)
        } else {
          Ok(Self::default())
        }
      }
    }
  }

  fn rebase(&mut self, base: &Path) {
    let rebase = |p: &mut PathBuf| {
      if p.is_relative() {
        *p = base.join(&*p);
      }
    };
    rebase(&mut self.templates);
    rebase(&mut self.output);
    for context in self.contexts.values_mut() {
      rebase(&mut context.csv);
    }
  }

  pub fn watch_options(&self) -> Result<WatchOptions> {
    if !self.poll_interval.is_finite() || self.poll_interval <= 0.0 {
      return Err(PagefireError::Config(format!(
        "poll_interval must be a positive number of seconds, got {}",
        self.poll_interval
      )));
    }
    Ok(WatchOptions {
      poll_interval: Duration::from_secs_f64(self.poll_interval),
    })
  }

  /// A `SiteBuilder` carrying everything in this configuration.
  pub fn builder(&self) -> SiteBuilder {
    let mut builder = SiteBuilder::new(&self.templates)
      .output_root(&self.output)
      .extension(&self.extension);

    for (key, value) in &self.globals {
      builder = builder.add_global(key, value);
    }
    for (template, source) in &self.contexts {
      builder = builder.register_csv(template, &source.key, &source.csv);
    }
    builder
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn test_empty_file_is_default() {
    assert_eq!(SiteConfig::from_toml("").unwrap(), SiteConfig::default());
  }

  #[test]
  fn test_full_file() {
    let config = SiteConfig::from_toml(
      r#"
        templates = "site"
        output = "public"
        extension = "htm"
        poll_interval = 0.25

        [globals]
        site_name = "Demo"

        [contexts."people.html"]
        csv = "data/people.csv"
        key = "people"

        [contexts."places.html"]
        csv = "data/places.csv"
      "#,
    )
    .unwrap();

    assert_eq!(config.templates, PathBuf::from("site"));
    assert_eq!(config.output, PathBuf::from("public"));
    assert_eq!(config.extension, "htm");
    assert_eq!(config.watch_options().unwrap().poll_interval, Duration::from_millis(250));
    assert_eq!(config.globals["site_name"].as_str(), Some("Demo"));
    assert_eq!(config.contexts["people.html"].key, "people");
    assert_eq!(config.contexts["places.html"].key, "rows");
  }

  #[test]
  fn test_unknown_field_is_rejected() {
    let result = SiteConfig::from_toml("template_dir = \"x\"");

    assert!(matches!(result, Err(PagefireError::Config(_))));
  }

  #[test]
  fn test_non_positive_poll_interval_is_rejected() {
    for poll_interval in [0.0, -1.0, f64::NAN] {
      let config = SiteConfig {
        poll_interval,
        ..SiteConfig::default()
      };
      assert!(config.watch_options().is_err());
    }
  }

  #[test]
  fn test_load_resolves_relative_paths_against_file() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("pagefire.toml");
    fs::write(
      &path,
      "output = \"/abs/out\"\n[contexts.\"a.html\"]\ncsv = \"a.csv\"\n",
    )
    .unwrap();

    let config = SiteConfig::load(&path).unwrap();

    assert_eq!(config.templates, temp_dir.path().join("templates"));
    assert_eq!(config.output, PathBuf::from("/abs/out"));
    assert_eq!(config.contexts["a.html"].csv, temp_dir.path().join("a.csv"));
  }

  #[test]
  fn test_missing_explicit_file_is_an_error() {
    let temp_dir = tempdir().unwrap();

    let result = SiteConfig::discover(Some(&temp_dir.path().join("nope.toml")));

    assert!(matches!(result, Err(PagefireError::Config(_))));
  }

  #[test]
  fn test_builder_applies_globals_and_contexts() {
    let temp_dir = tempdir().unwrap();
    let templates = temp_dir.path().join("templates");
    fs::create_dir(&templates).unwrap();
    fs::write(
      templates.join("people.html"),
      "{{ site_name }}:{% for p in people %}{{ p.name }};{% endfor %}",
    )
    .unwrap();
    fs::write(temp_dir.path().join("people.csv"), "name\nAda\nGrace\n").unwrap();
    fs::write(
      temp_dir.path().join("pagefire.toml"),
      "output = \"out\"\n[globals]\nsite_name = \"Demo\"\n[contexts.\"people.html\"]\ncsv = \"people.csv\"\nkey = \"people\"\n",
    )
    .unwrap();

    let config = SiteConfig::load(&temp_dir.path().join("pagefire.toml")).unwrap();
    config.builder().build().unwrap().build().unwrap();

    let page = fs::read_to_string(temp_dir.path().join("out").join("people.html")).unwrap();
    assert_eq!(page, "Demo:Ada;Grace;");
  }
}
