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

//! Process settings shared by the daemon, the editor and the CLI
//!
//! Settings live in a small JSON file. Every field has a default, so a
//! missing file or a partial file is fine. Paths may start with `~`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::ConfigError;

pub const DEFAULT_SETTINGS_PATH: &str = "~/.config/keytrap/settings.json";

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Library JSON file
    pub library_path: PathBuf,
    /// Socket the editor listens on for trapping queries
    pub editor_socket: PathBuf,
    /// Identity the daemon expects as front application before querying
    pub editor_identity: String,
    /// Identity the daemon sends with its requests
    pub daemon_identity: String,
    /// Deadline for one trapping query
    pub ipc_timeout_ms: u64,
    /// How long a trapping answer is trusted by the dispatcher
    pub trapping_cache_ttl_ms: u64,
    /// Check captured shortcuts against the registry before publishing
    pub verify_hotkey: bool,
    /// Capture command-modified keys while recording
    pub block_key_equivalents: bool,
    /// Bound on buffered dispatcher diagnostics
    pub diagnostics_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            library_path: PathBuf::from("~/.config/keytrap/library.json"),
            editor_socket: PathBuf::from("~/.config/keytrap/editor.sock"),
            editor_identity: "org.keytrap.editor".to_string(),
            daemon_identity: "org.keytrap.daemon".to_string(),
            ipc_timeout_ms: 500,
            trapping_cache_ttl_ms: 1000,
            verify_hotkey: true,
            block_key_equivalents: true,
            diagnostics_capacity: 64,
        }
    }
}

/// Expands a leading `~` (and `$VARS`) in a path
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => PathBuf::from(shellexpand::tilde(&raw).into_owned()),
    }
}

impl Settings {
    /// Loads settings from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let path = expand_path(path);
        if !path.exists() {
            return Ok(Self::default().expanded());
        }

        let content = fs::read_to_string(&path)?;
        let settings: Settings =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
        Ok(settings.expanded())
    }

    /// Settings with every path tilde-expanded
    pub fn expanded(mut self) -> Self {
        self.library_path = expand_path(&self.library_path);
        self.editor_socket = expand_path(&self.editor_socket);
        self
    }

    pub fn ipc_timeout(&self) -> Duration {
        Duration::from_millis(self.ipc_timeout_ms)
    }

    pub fn trapping_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.trapping_cache_ttl_ms)
    }
}
