use std::path::PathBuf;

use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure a cleaning run can end with. All of them are terminal.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Raw directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("No files found with pattern {0}")]
    NoMatchingFiles(String),

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Planning error: {0}")]
    Plan(String),

    #[error("Write error: {0}")]
    Write(String),

    #[error("Verification failed: {0}")]
    VerificationMismatch(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Hashing error: {0}")]
    Hash(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Hash(e.to_string())
    }
}
