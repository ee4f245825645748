// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Library transaction management with automatic backups
//!
//! Provides atomic write operations for the library file.

use atomic_write_file::AtomicWriteFile;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{error, warn};

use crate::config::{validator::LibraryValidator, ConfigError, LibraryStore};
use crate::core::Library;

/// Atomic library transaction with automatic backup.
///
/// # Lifecycle
///
/// 1. `begin()` - Creates timestamped backup immediately
/// 2. The editor prepares the new library (in memory)
/// 3. `commit_with_validation()` - Writes atomically or `rollback()` - Restores original
///
/// # Example
///
/// ```no_run
/// use keytrap::config::{LibraryStore, LibraryTransaction};
/// use keytrap::core::Library;
/// use std::path::PathBuf;
///
/// let store = LibraryStore::open(PathBuf::from("library.json"))?;
/// let tx = LibraryTransaction::begin(&store)?;
///
/// match tx.commit_with_validation(&Library::new()) {
///     Ok(()) => println!("Library updated"),
///     Err(e) => eprintln!("Commit failed: {}", e),
/// }
/// # Ok::<(), keytrap::config::ConfigError>(())
/// ```
pub struct LibraryTransaction<'a> {
    store: &'a LibraryStore,
    backup_path: PathBuf,
}

impl<'a> LibraryTransaction<'a> {
    /// Begins a new transaction by creating a timestamped backup.
    ///
    /// # Errors
    ///
    /// Returns an error if the library cannot be read or the backup cannot
    /// be written. Nothing has been modified in that case.
    pub fn begin(store: &'a LibraryStore) -> Result<Self, ConfigError> {
        let backup_path = store.create_timestamped_backup()?;

        Ok(Self { store, backup_path })
    }

    /// Backup taken by `begin()`
    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Validates `library` and commits it.
    ///
    /// Error-level issues block the commit with
    /// `ConfigError::ValidationFailed`; warnings are logged and the commit
    /// proceeds.
    pub fn commit_with_validation(self, library: &Library) -> Result<(), ConfigError> {
        let report = LibraryValidator::new().validate(library);

        if report.has_errors() {
            let errors = report.errors().collect::<Vec<_>>();
            for issue in &errors {
                error!(subject = %issue.subject, "{}", issue.message);
            }
            return Err(ConfigError::ValidationFailed(format!(
                "{} validation error(s) detected",
                errors.len()
            )));
        }

        for issue in report.warnings() {
            warn!(subject = %issue.subject, "{}", issue.message);
        }

        let content = serde_json::to_string_pretty(library).map_err(ConfigError::Serialize)?;
        self.commit(&content)
    }

    /// Atomically replaces the library file with `new_content`.
    ///
    /// On error the original file is untouched and the backup remains.
    pub fn commit(self, new_content: &str) -> Result<(), ConfigError> {
        write_atomically(self.store.path(), new_content)
    }

    /// Restores the library from the backup created during `begin()`.
    pub fn rollback(&self) -> Result<(), ConfigError> {
        let backup_content = fs::read_to_string(&self.backup_path)?;
        write_atomically(self.store.path(), &backup_content)
    }
}

fn write_atomically(path: &Path, content: &str) -> Result<(), ConfigError> {
    let mut file = AtomicWriteFile::options()
        .open(path)
        .map_err(|e| ConfigError::WriteFailed(format!("Failed to open for atomic write: {}", e)))?;

    file.write_all(content.as_bytes())
        .map_err(|e| ConfigError::WriteFailed(format!("Failed to write content: {}", e)))?;

    file.commit()
        .map_err(|e| ConfigError::WriteFailed(format!("Failed to commit atomic write: {}", e)))?;

    Ok(())
}
