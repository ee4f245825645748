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

//! Daemon assembly
//!
//! Loads the library, builds the registry, starts the action worker and
//! wires the dispatcher to it. Reloads replace the registry contents in
//! place, so the dispatcher never sees a half-built index.

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{ConfigError, LibraryStore, LibraryWatcher, Settings};
use crate::core::{Conflict, KeyEvent, Registry};
use crate::engine::dispatcher::{Diagnostic, DispatchOutcome, Dispatcher};
use crate::engine::front::FrontApplication;
use crate::engine::state::DaemonState;
use crate::engine::worker::{ActionWorker, Executor};
use crate::engine::EngineError;
use crate::ipc::{BlockingTrappingProbe, IpcClient};

pub struct Daemon {
    store: LibraryStore,
    state: Arc<DaemonState>,
    dispatcher: Dispatcher,
    worker: ActionWorker,
    watcher: Option<LibraryWatcher>,
}

impl Daemon {
    /// Loads the library and starts dispatching
    ///
    /// `executor` receives the shared state and returns the configured
    /// executor (platform, plugins, probe...). Conflicting triggers are
    /// skipped with a warning.
    pub fn start(
        store: LibraryStore,
        settings: &Settings,
        front: Arc<dyn FrontApplication>,
        executor: impl FnOnce(Arc<DaemonState>) -> Executor,
    ) -> Result<Self, EngineError> {
        let library = store.read_library()?;
        let (registry, conflicts) = Registry::from_library(&library);
        log_conflicts(&conflicts);
        info!(
            triggers = registry.len(),
            path = %store.path().display(),
            "library loaded"
        );

        let state = Arc::new(DaemonState::new(
            Arc::new(registry),
            settings.trapping_cache_ttl(),
        ));
        let worker = ActionWorker::spawn(executor(Arc::clone(&state))).map_err(EngineError::Worker)?;
        let dispatcher = Dispatcher::new(
            Arc::clone(&state),
            front,
            worker.queue(),
            settings.diagnostics_capacity,
        );

        Ok(Self {
            store,
            state,
            dispatcher,
            worker,
            watcher: None,
        })
    }

    /// See `Dispatcher::on_key_event`
    pub fn on_key_event(&self, event: &KeyEvent) -> DispatchOutcome {
        self.dispatcher.on_key_event(event)
    }

    pub fn drain_diagnostics(&self) -> Vec<Diagnostic> {
        self.dispatcher.drain_diagnostics()
    }

    pub fn registry(&self) -> &Arc<Registry> {
        self.state.registry()
    }

    pub fn state(&self) -> &Arc<DaemonState> {
        &self.state
    }

    /// Re-reads the library and swaps the registry contents
    ///
    /// On a read error the current registry stays in place.
    pub fn reload(&self) -> Result<Vec<Conflict>, ConfigError> {
        let library = self.store.read_library()?;
        let conflicts = self.registry().replace_from(&library);
        log_conflicts(&conflicts);
        info!(triggers = self.registry().len(), "library reloaded");
        Ok(conflicts)
    }

    /// Starts watching the library file for `poll_reload`
    pub fn watch(&mut self) -> Result<(), ConfigError> {
        self.watcher = Some(LibraryWatcher::new(self.store.path())?);
        Ok(())
    }

    /// Reloads if the watched library changed since the last poll
    ///
    /// `Ok(None)` when nothing changed or no watch is active.
    pub fn poll_reload(&self) -> Result<Option<Vec<Conflict>>, ConfigError> {
        match &self.watcher {
            Some(watcher) if watcher.check_for_changes() => self.reload().map(Some),
            _ => Ok(None),
        }
    }

    /// Stops the worker after the jobs already queued
    pub fn shutdown(self) {
        self.worker.shutdown();
        info!("daemon stopped");
    }
}

/// Probe that asks the editor over its socket, but only while it is in front
pub fn editor_probe(
    settings: &Settings,
    front: Arc<dyn FrontApplication>,
) -> std::io::Result<BlockingTrappingProbe> {
    let client = IpcClient::new(&settings.editor_socket, &settings.daemon_identity)
        .with_timeout(settings.ipc_timeout())
        .with_front_check(front, &settings.editor_identity);
    BlockingTrappingProbe::new(client)
}

fn log_conflicts(conflicts: &[Conflict]) {
    for conflict in conflicts {
        warn!(%conflict, "trigger skipped");
    }
}
