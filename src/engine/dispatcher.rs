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

//! Key event resolution
//!
//! `Dispatcher::on_key_event` runs on the capture layer's thread for every
//! keystroke. It must answer immediately whether the key is consumed, so it
//! only reads: one registry snapshot load, the front application, a few
//! atomics. Matched work goes to the `ActionWorker`.
//!
//! # Resolution order
//! 1. Non key-down events or a recording editor → `Unhandled`
//! 2. Front application override, then the global scope
//! 3. Paused daemon → `Unhandled`, except for the pause/resume trigger
//! 4. Owning list disabled → `Suppressed` (consumed, nothing runs)
//! 5. Otherwise the job is queued → `Dispatched`

use parking_lot::Mutex;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use tracing::debug;

use crate::core::{DaemonControl, KeyCombo, KeyEvent, KeyEventKind, Registry, TriggerId};
use crate::engine::front::FrontApplication;
use crate::engine::state::DaemonState;
use crate::engine::worker::{DispatchJob, JobQueue};

/// What happened to a key event
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DispatchOutcome {
    /// No enabled trigger matched; the key goes on to the application
    Unhandled,
    /// A trigger matched but its list is disabled; the key is swallowed
    Suppressed,
    /// The trigger's actions were queued
    Dispatched,
}

impl DispatchOutcome {
    /// Whether the capture layer should swallow the event
    pub fn consumes(self) -> bool {
        !matches!(self, DispatchOutcome::Unhandled)
    }
}

/// Problem noticed on the event path
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub trigger: TriggerId,
    pub combo: KeyCombo,
    pub message: String,
}

pub struct Dispatcher {
    registry: Arc<Registry>,
    state: Arc<DaemonState>,
    front: Arc<dyn FrontApplication>,
    jobs: JobQueue,
    diagnostics_tx: SyncSender<Diagnostic>,
    diagnostics_rx: Mutex<Receiver<Diagnostic>>,
}

impl Dispatcher {
    /// `diagnostics_capacity` bounds the buffer; extra entries are dropped
    pub fn new(
        state: Arc<DaemonState>,
        front: Arc<dyn FrontApplication>,
        jobs: JobQueue,
        diagnostics_capacity: usize,
    ) -> Self {
        let (diagnostics_tx, diagnostics_rx) = mpsc::sync_channel(diagnostics_capacity);
        Self {
            registry: Arc::clone(state.registry()),
            state,
            front,
            jobs,
            diagnostics_tx,
            diagnostics_rx: Mutex::new(diagnostics_rx),
        }
    }

    /// Resolves one key event
    pub fn on_key_event(&self, event: &KeyEvent) -> DispatchOutcome {
        if event.kind != KeyEventKind::KeyDown || self.state.cached_trapping() {
            return DispatchOutcome::Unhandled;
        }

        let front = self.front.bundle_id();
        let Some(resolution) =
            self.registry
                .find(event.key_code, event.modifiers, front.as_deref().map(String::as_str))
        else {
            return DispatchOutcome::Unhandled;
        };

        let trigger = &resolution.trigger.trigger;
        if self.state.is_paused() && !resolution.trigger.switches_status() {
            return DispatchOutcome::Unhandled;
        }
        if !resolution.list_enabled {
            debug!(trigger = %trigger.id, list = %trigger.list, "list disabled, suppressing");
            return DispatchOutcome::Suppressed;
        }

        debug!(trigger = %trigger.id, combo = %trigger.combo, "dispatching");
        let (id, combo) = (trigger.id, trigger.combo);
        let job = DispatchJob {
            trigger: Arc::clone(&resolution.trigger),
            event: *event,
        };
        if !self.jobs.submit(job) {
            self.diagnose(Diagnostic {
                trigger: id,
                combo,
                message: "action worker is not running".to_string(),
            });
        }
        DispatchOutcome::Dispatched
    }

    fn diagnose(&self, diagnostic: Diagnostic) {
        // Full buffer: the oldest entries are still there, drop this one
        let _ = self.diagnostics_tx.try_send(diagnostic);
    }

    /// Takes everything buffered so far
    pub fn drain_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics_rx.lock().try_iter().collect()
    }
}
