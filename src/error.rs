use std::path::PathBuf;
use thiserror::Error;

/// A specialized `Result` type for `pagefire` operations.
pub type Result<T, E = PagefireError> = std::result::Result<T, E>;

/// Boxed error returned by context generators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The primary error type for all `pagefire` operations.
#[derive(Debug, Error)]
pub enum PagefireError {
  /// An error originating from the `tera` templating engine, either while
  /// loading the template tree or while rendering a single template.
  #[error("Tera error: {0}")]
  Tera(#[from] tera::Error),

  /// An I/O error, typically from walking the template tree.
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  /// Writing a rendered page failed.
  #[error("failed to write {}: {source}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// A CSV data file could not be read or parsed.
  #[error("failed to load CSV {}: {source}", path.display())]
  Csv {
    path: PathBuf,
    #[source]
    source: csv::Error,
  },

  /// A registered context generator failed.
  #[error("context generator for '{template}' failed: {source}")]
  Context {
    template: String,
    #[source]
    source: BoxError,
  },

  /// The configuration file is unreadable or invalid.
  #[error("configuration error: {0}")]
  Config(String),

  /// An error from the file watcher.
  #[error("File watcher error: {0}")]
  Watcher(#[from] notify::Error),

  /// The rebuild worker panicked or was cancelled.
  #[error("rebuild worker failed: {0}")]
  Worker(#[from] tokio::task::JoinError),
}
