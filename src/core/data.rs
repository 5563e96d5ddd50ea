//! CSV data loading for context generators.

use crate::error::{PagefireError, Result};
use std::collections::HashMap;
use std::path::Path;

/// One CSV row, keyed by header.
pub type Record = HashMap<String, String>;

/// Reads a CSV file with a header row into one [`Record`] per data row,
/// in file order. All values are kept as text.
///
/// Rows whose field count differs from the header are rejected.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Record>> {
  let path = path.as_ref();
  let wrap = |source| PagefireError::Csv {
    path: path.to_path_buf(),
    source,
  };

  let mut reader = csv::ReaderBuilder::new()
    .has_headers(true)
    .from_path(path)
    .map_err(wrap)?;

  reader
    .deserialize::<Record>()
    .collect::<std::result::Result<Vec<_>, _>>()
    .map_err(wrap)
}
