//! Error types for nbsync.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for synchronization operations.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Conversion error in {}: {message}", path.display())]
    Conversion { path: PathBuf, message: String },

    #[error("Watch error: {0}")]
    Watch(String),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("{0}")]
    Other(String),
}

impl From<notify::Error> for SyncError {
    fn from(err: notify::Error) -> Self {
        SyncError::Watch(err.to_string())
    }
}

impl From<walkdir::Error> for SyncError {
    fn from(err: walkdir::Error) -> Self {
        match err.into_io_error() {
            Some(io) => SyncError::Io(io),
            None => SyncError::Other("filesystem loop detected".to_string()),
        }
    }
}

/// Result type alias for synchronization operations.
pub type Result<T> = std::result::Result<T, SyncError>;
