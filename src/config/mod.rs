//! Library file management with atomic writes and backup support.
//!
//! This module provides safe, transactional operations for the hotkey
//! library file and the process settings. Key features:
//!
//! - **Atomic writes**: Uses temp-file-then-rename to prevent corruption
//! - **Automatic backups**: Every save creates a timestamped backup
//! - **Validation**: A library with structural errors is never written
//! - **Live reload**: `LibraryWatcher` tells the daemon when the file changes
//!
//! # Example
//!
//! ```no_run
//! use keytrap::config::LibraryStore;
//!
//! let store = LibraryStore::open("/home/user/.config/keytrap/library.json".into())?;
//! let mut library = store.read_library()?;
//! library.add_list("Global", None).ok();
//! store.save(&library)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::core::Library;

mod error;
pub mod settings;
pub mod transaction;
pub mod validator;
pub mod watcher;

pub use error::ConfigError;
pub use settings::Settings;
pub use transaction::LibraryTransaction;
pub use validator::{LibraryValidator, ValidationLevel, ValidationReport};
pub use watcher::LibraryWatcher;

/// Owns the library file and its backup directory.
///
/// Reads are plain; writes go through `LibraryTransaction` so a failed or
/// invalid save leaves the previous file in place.
#[derive(Debug)]
pub struct LibraryStore {
    library_path: PathBuf,
    backup_dir: PathBuf,
}

impl LibraryStore {
    /// Opens an existing library file.
    ///
    /// Creates the `backups/` directory next to the file if needed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the file doesn't exist.
    /// Returns `ConfigError::BackupDirNotWritable` if the backup directory
    /// cannot be created.
    pub fn open(library_path: PathBuf) -> Result<Self, ConfigError> {
        if !library_path.exists() {
            return Err(ConfigError::NotFound(library_path));
        }

        if library_path.read_link().is_ok() {
            warn!(path = %library_path.display(), "library file is a symlink");
        }

        // e.g. ~/.config/keytrap/library.json → ~/.config/keytrap/backups/
        let backup_dir = library_path
            .parent()
            .ok_or_else(|| ConfigError::BackupDirNotWritable(library_path.clone()))?
            .join("backups");

        if !backup_dir.exists() {
            fs::create_dir_all(&backup_dir)
                .map_err(|_| ConfigError::BackupDirNotWritable(backup_dir.clone()))?;
        }

        if backup_dir.metadata()?.permissions().readonly() {
            return Err(ConfigError::BackupDirNotWritable(backup_dir));
        }

        Ok(Self {
            library_path,
            backup_dir,
        })
    }

    /// Opens the library, writing an empty one first if the file is missing
    pub fn open_or_create(library_path: PathBuf) -> Result<Self, ConfigError> {
        if !library_path.exists() {
            if let Some(parent) = library_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let empty = serde_json::to_string_pretty(&Library::new())
                .map_err(ConfigError::Serialize)?;
            fs::write(&library_path, empty)?;
            info!(path = %library_path.display(), "created empty library");
        }
        Self::open(library_path)
    }

    pub fn path(&self) -> &Path {
        &self.library_path
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Reads and parses the library file.
    pub fn read_library(&self) -> Result<Library, ConfigError> {
        let content = fs::read_to_string(&self.library_path)?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: self.library_path.clone(),
            source,
        })
    }

    /// Validates and atomically writes `library`.
    ///
    /// Returns the path of the backup taken before writing.
    pub fn save(&self, library: &Library) -> Result<PathBuf, ConfigError> {
        let tx = LibraryTransaction::begin(self)?;
        let backup = tx.backup_path().to_path_buf();
        tx.commit_with_validation(library)?;
        info!(path = %self.library_path.display(), "library saved");
        Ok(backup)
    }

    /// Backups of this library, oldest first.
    pub fn list_backups(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let prefix = self.file_name()?;
        let mut backups: Vec<PathBuf> = fs::read_dir(&self.backup_dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(&format!("{}.", prefix)))
            })
            .collect();
        backups.sort();
        Ok(backups)
    }

    fn file_name(&self) -> Result<String, ConfigError> {
        self.library_path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                ConfigError::BackupFailed(format!(
                    "library path has no file name: {}",
                    self.library_path.display()
                ))
            })
    }

    pub(crate) fn create_timestamped_backup(&self) -> Result<PathBuf, ConfigError> {
        let content = fs::read_to_string(&self.library_path)?;

        // YYYY-MM-DD_HHMMSS_mmm so saves within one second keep distinct backups
        let timestamp = Local::now().format("%Y-%m-%d_%H%M%S_%3f");
        let backup_path = self
            .backup_dir
            .join(format!("{}.{}", self.file_name()?, timestamp));

        fs::write(&backup_path, &content)
            .map_err(|e| ConfigError::BackupFailed(format!("{}: {}", backup_path.display(), e)))?;

        Ok(backup_path)
    }
}

#[cfg(test)]
mod tests;
