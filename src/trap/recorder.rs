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

//! Shortcut recording state machine
//!
//! ```text
//!            set_trapping(true)          key captured
//!   Idle ───────────────────────▶ Trapping ───────────▶ Verifying ──┐
//!    ▲                              │  ▲                            │
//!    │      set_trapping(false)     │  │ Proceed / PassThrough      │
//!    ├──────────────────────────────┘  └─────────                   │
//!    └──────────────────────────────────────────────────────────────┘
//!                      Caught / Conflict / Rejected
//! ```
//!
//! Verification is skipped when `verify_hotkey` is off, and for keys the
//! daemon forwarded with `handle_caught` (they are registered by definition).

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use tracing::debug;

use crate::config::Settings;
use crate::core::{Conflict, KeyCaught, KeyCombo, KeyEvent, KeyEventKind, Registry, Scope};
use crate::trap::state::TrappingState;

/// Recorder phase
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TrapState {
    Idle,
    Trapping,
    Verifying,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TrapSettings {
    /// Check captured shortcuts against the registry before publishing
    pub verify_hotkey: bool,
    /// Capture command-modified keys; when off they are swallowed
    pub block_key_equivalents: bool,
}

impl Default for TrapSettings {
    fn default() -> Self {
        Self {
            verify_hotkey: true,
            block_key_equivalents: true,
        }
    }
}

impl From<&Settings> for TrapSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            verify_hotkey: settings.verify_hotkey,
            block_key_equivalents: settings.block_key_equivalents,
        }
    }
}

/// Lets the editor UI keep some keys while recording
pub trait TrapDelegate: Send {
    /// True lets a key equivalent (e.g. Cmd+W) act normally
    fn need_perform_key_equivalent(&self, _event: &KeyEvent) -> bool {
        false
    }

    /// True lets a key (e.g. Escape, Return) through without capturing it
    fn need_proceed_key_event(&self, _event: &KeyEvent) -> bool {
        false
    }
}

/// What the recorder did with an event
#[derive(Clone, Debug, PartialEq)]
pub enum TrapOutcome {
    /// Not recording; handle the event normally
    NotTrapping,
    /// Key equivalent the delegate wants performed
    PassThrough,
    /// Delivered without capture; still recording
    Proceed,
    /// Key equivalent neither captured nor performed
    Swallowed,
    /// Shortcut captured and published
    Caught(KeyCaught),
    /// Shortcut already registered in the scope; nothing published
    Conflict(Conflict),
    /// Not a usable shortcut; nothing published
    Rejected(KeyCombo),
}

type TransitionObserver = Box<dyn FnMut(TrapState, TrapState) + Send>;

pub struct TrapRecorder {
    shared: Arc<TrappingState>,
    window: u64,
    settings: TrapSettings,
    state: TrapState,
    delegate: Option<Box<dyn TrapDelegate>>,
    subscribers: Vec<Sender<KeyCaught>>,
    observer: Option<TransitionObserver>,
}

impl TrapRecorder {
    /// Recorder for one editor window; `window` must be non-zero
    pub fn new(shared: Arc<TrappingState>, window: u64, settings: TrapSettings) -> Self {
        Self {
            shared,
            window,
            settings,
            state: TrapState::Idle,
            delegate: None,
            subscribers: Vec::new(),
            observer: None,
        }
    }

    pub fn with_delegate(mut self, delegate: Box<dyn TrapDelegate>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    /// Calls `observer(from, to)` on every state change
    pub fn on_transition(&mut self, observer: impl FnMut(TrapState, TrapState) + Send + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Receives one `KeyCaught` per captured shortcut
    pub fn subscribe(&mut self) -> Receiver<KeyCaught> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn state(&self) -> TrapState {
        self.state
    }

    pub fn is_trapping(&self) -> bool {
        self.state != TrapState::Idle
    }

    pub fn settings(&self) -> TrapSettings {
        self.settings
    }

    /// Starts or stops recording; repeated calls are no-ops
    pub fn set_trapping(&mut self, trapping: bool) {
        match (trapping, self.state) {
            (true, TrapState::Idle) => {
                self.shared.begin(self.window);
                self.transition(TrapState::Trapping);
            }
            (false, TrapState::Trapping | TrapState::Verifying) => {
                self.finish();
            }
            _ => {}
        }
    }

    /// Offers a key event to the recorder
    ///
    /// `registry` and `scope` are used for verification.
    pub fn handle_key_event(&mut self, event: &KeyEvent, registry: &Registry, scope: Scope) -> TrapOutcome {
        if self.state != TrapState::Trapping {
            return TrapOutcome::NotTrapping;
        }
        if event.kind != KeyEventKind::KeyDown {
            return TrapOutcome::Proceed;
        }

        if event.is_key_equivalent() {
            if self
                .delegate
                .as_ref()
                .is_some_and(|d| d.need_perform_key_equivalent(event))
            {
                return TrapOutcome::PassThrough;
            }
            if !self.settings.block_key_equivalents {
                return TrapOutcome::Swallowed;
            }
        } else if self
            .delegate
            .as_ref()
            .is_some_and(|d| d.need_proceed_key_event(event))
        {
            return TrapOutcome::Proceed;
        }

        let verify = self.settings.verify_hotkey.then_some((registry, scope));
        self.capture(KeyCaught::from(event), verify)
    }

    /// Captures a hotkey the daemon swallowed and forwarded
    ///
    /// The key is registered already, so it is not verified.
    pub fn handle_caught(&mut self, caught: KeyCaught) -> TrapOutcome {
        if self.state != TrapState::Trapping {
            return TrapOutcome::NotTrapping;
        }
        self.capture(caught, None)
    }

    fn capture(&mut self, caught: KeyCaught, verify: Option<(&Registry, Scope)>) -> TrapOutcome {
        let outcome = match verify {
            Some((registry, scope)) => {
                self.transition(TrapState::Verifying);
                Self::verify(caught, registry, scope)
            }
            None => TrapOutcome::Caught(caught),
        };

        if let TrapOutcome::Caught(caught) = &outcome {
            self.publish(*caught);
        } else {
            debug!(?outcome, "captured shortcut not published");
        }

        self.finish();
        outcome
    }

    fn verify(caught: KeyCaught, registry: &Registry, scope: Scope) -> TrapOutcome {
        let combo = caught.combo();
        if !combo.is_valid() {
            return TrapOutcome::Rejected(combo);
        }

        match registry.lookup(scope, combo) {
            Some(existing) => TrapOutcome::Conflict(Conflict {
                existing: existing.trigger.id,
                candidate: None,
                combo,
                scope,
            }),
            None => TrapOutcome::Caught(caught),
        }
    }

    fn publish(&mut self, caught: KeyCaught) {
        debug!(key_code = caught.key_code, modifier_mask = caught.modifier_mask, "shortcut caught");
        self.subscribers.retain(|tx| tx.send(caught).is_ok());
    }

    fn finish(&mut self) {
        self.shared.end(self.window);
        self.transition(TrapState::Idle);
    }

    fn transition(&mut self, to: TrapState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        if let Some(observer) = self.observer.as_mut() {
            observer(from, to);
        }
    }
}

impl Drop for TrapRecorder {
    fn drop(&mut self) {
        self.shared.end(self.window);
    }
}
