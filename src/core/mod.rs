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

//! src/core/mod.rs
//!
//! Core hotkey model
//!
//! This module contains the data structures and algorithms shared by the
//! daemon and the editor:
//! - Type definitions for key combos, events and identifiers
//! - Triggers, lists, applications and the persisted library
//! - The action contract and its variants
//! - The trigger registry with O(1), lock-free lookup
//! - Conflict detection, shortcut parsing and input validation
//!
//! Nothing here touches the OS or the network, so all of it is unit-tested
//! without a display server or a running peer.

pub mod action;
pub mod conflict;
pub mod library;
pub mod list;
pub mod parser;
pub mod registry;
pub mod trigger;
pub mod types;
pub mod validator;

pub use action::{
    Action, ActionContext, ActionError, ActionKind, DaemonAction, DaemonControl, MenuAction,
    NoPlugins, Platform, PluginAction, PluginHost, SystemAction,
};
pub use conflict::{Conflict, ConflictDetector, ConflictGroup};
pub use library::{Library, LibraryError};
pub use list::{Application, Entry, HotkeyList};
pub use registry::{RegisteredTrigger, Registry, RegistryError, Resolution};
pub use trigger::{Trigger, TriggerCallback};
pub use types::*;
pub use validator::{validate_action, validate_trigger, ValidationError};

#[cfg(test)]
mod tests;
