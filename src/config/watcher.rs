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

//! File system watcher for live library reload
//!
//! Uses OS-level file watching via the notify crate. The editor saves with
//! temp-file-then-rename, which replaces the watched inode, so the parent
//! directory is watched and events are filtered by file name.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::{
    ffi::OsString,
    path::Path,
    sync::mpsc::{channel, Receiver},
};

use crate::config::ConfigError;

/// Watches the library file for modifications
pub struct LibraryWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    file_name: OsString,
}

impl LibraryWatcher {
    pub fn new(path: &Path) -> Result<Self, ConfigError> {
        let file_name = path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| ConfigError::NotFound(path.to_path_buf()))?;
        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let (tx, rx) = channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        Ok(LibraryWatcher {
            _watcher: watcher,
            rx,
            file_name,
        })
    }

    /// Checks for library modification events (non-blocking)
    ///
    /// Drains every pending event, so a burst of writes reads as one change.
    pub fn check_for_changes(&self) -> bool {
        let mut changed = false;
        while let Ok(event_result) = self.rx.try_recv() {
            if let Ok(event) = event_result {
                changed |= self.is_library_change(&event);
            }
        }
        changed
    }

    fn is_library_change(&self, event: &Event) -> bool {
        matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
            && event
                .paths
                .iter()
                .any(|p| p.file_name() == Some(self.file_name.as_os_str()))
    }
}
