use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or saving settings and libraries.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Library or settings file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    /// Backup directory cannot be created or written to.
    #[error("Backup directory not writable: {0}")]
    BackupDirNotWritable(PathBuf),
    /// Failed to create backup file.
    #[error("Failed to create backup: {0}")]
    BackupFailed(String),
    /// Atomic write operation failed.
    #[error("Atomic write failed: {0}")]
    WriteFailed(String),
    /// The library did not pass validation; nothing was written.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
    /// File content is not valid JSON for the expected type.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Serialising a library failed.
    #[error("Failed to serialise library: {0}")]
    Serialize(#[source] serde_json::Error),
    /// File watcher could not be set up.
    #[error("File watch failed: {0}")]
    Watch(#[from] notify::Error),
    /// Generic I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
