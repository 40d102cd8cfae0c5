//! Loading the static lookup tables from disk.

use std::fs;
use std::io;
use std::path::Path;

use lexeme_types::{CategoryTable, LanguageTable};
use tracing::warn;

use crate::error::ConfigError;

/// Language metadata from `path`, or the bundled table when `None`.
pub fn language_table(path: Option<&Path>) -> Result<LanguageTable, ConfigError> {
    match path {
        Some(path) => load(path, LanguageTable::from_json_str),
        None => Ok(LanguageTable::bundled()),
    }
}

/// Lexical category table from `path`, or the bundled table when `None`.
pub fn category_table(path: Option<&Path>) -> Result<CategoryTable, ConfigError> {
    match path {
        Some(path) => load(path, CategoryTable::from_json_str),
        None => Ok(CategoryTable::bundled()),
    }
}

// A missing table is not fatal: it yields an empty table, which filters out
// every record downstream.
fn load<T: Default>(
    path: &Path,
    parse: fn(&str) -> serde_json::Result<T>,
) -> Result<T, ConfigError> {
    match fs::read_to_string(path) {
        Ok(raw) => parse(&raw).map_err(|source| ConfigError::TableInvalid {
            path: path.to_path_buf(),
            source,
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("lookup table {} not found, using an empty table", path.display());
            Ok(T::default())
        }
        Err(source) => Err(ConfigError::TableUnreadable {
            path: path.to_path_buf(),
            source,
        }),
    }
}
