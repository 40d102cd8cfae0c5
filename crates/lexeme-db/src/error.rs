use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal setup or input problems. A run that hits one writes nothing.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("dump file not found: {}", path.display())]
    DumpNotFound { path: PathBuf },
    #[error("failed to read dump {}: {source}", path.display())]
    DumpUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read lookup table {}: {source}", path.display())]
    TableUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid lookup table {}: {source}", path.display())]
    TableInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A single dump line that could not be turned into a record.
#[derive(Debug, Error)]
pub enum RecordParseError {
    #[error("malformed lexeme JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Saving or loading an index file failed.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to write index {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode index {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("index file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read index {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("corrupt index {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures that end a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
