// Copyright 2025 bakri (tidynest@proton.me)
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

//! keytrap - global hotkey triggers with editor/daemon trap synchronisation
//!
//! A background daemon swallows bound key combinations and runs their
//! actions. A separate editor records new shortcuts; while it records, the
//! daemon asks it over IPC and stands down so the keystroke reaches the
//! recorder instead of firing an action.
//!
//! # Features
//!
//! - **Registry:** O(1), lock-free lookup with per-application overrides
//! - **Dispatch:** Non-blocking event path, actions on a worker thread
//! - **Recording:** Idle → Trapping → Verifying → Idle with conflict checks
//! - **IPC:** JSON-lines over a Unix socket with explicit deadlines
//! - **Persistence:** Validated, atomic library writes with timestamped backups
//!
//! # Architecture
//!
//! - **`core`:** Hotkey model (types, triggers, lists, actions, registry)
//! - **`config`:** Settings and library files (atomic writes, backups, watching)
//! - **`engine`:** Daemon runtime (dispatcher, action worker, state)
//! - **`trap`:** Shortcut recording state machine
//! - **`ipc`:** Daemon ↔ editor trapping queries
//! - **`editor`:** Editor-side controller
//!
//! Both processes run their code from this crate; the platform key-event
//! source and OS effects plug in through `Platform` and `FrontApplication`.
//!
//! # Examples
//!
//! ## Parsing a shortcut
//!
//! ```
//! use keytrap::core::{parser::parse_shortcut, ModifierMask};
//!
//! let combo = parse_shortcut("CMD+SHIFT+K")?;
//! assert!(combo.modifiers.contains(ModifierMask::COMMAND | ModifierMask::SHIFT));
//! # Ok::<(), keytrap::core::parser::ParseError>(())
//! ```
//!
//! ## Resolving a keystroke
//!
//! ```
//! use keytrap::core::{parser::parse_shortcut, ListId, Registry, Trigger, TriggerId};
//!
//! let registry = Registry::new();
//! registry.add_list(ListId(1), None, true);
//! let combo = parse_shortcut("CMD+SPACE")?;
//! registry.register(Trigger::new(TriggerId(1), ListId(1), combo), false)?;
//!
//! let hit = registry.find(combo.key_code, combo.modifiers, None);
//! assert_eq!(hit.map(|r| r.trigger.trigger.id), Some(TriggerId(1)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod core;
pub mod editor;
pub mod engine;
pub mod ipc;
pub mod trap;

// Re-export commonly used types for convenience
pub use core::{
    Action, KeyCaught, KeyCombo, KeyEvent, Library, ModifierMask, Registry, Trigger,
};
pub use engine::{Daemon, DispatchOutcome};
