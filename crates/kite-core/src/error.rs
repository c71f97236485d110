//! Error type for operations that surface failures to the caller

use std::path::PathBuf;

/// Failures that are not absorbed per-file.
#[derive(Debug, thiserror::Error)]
pub enum KiteError {
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("File not found in repository: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("Invalid pattern: {0}")]
    Pattern(String),
}

impl KiteError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        KiteError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, KiteError>;
