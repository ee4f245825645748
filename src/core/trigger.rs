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

//! src/core/trigger.rs
//!
//! Trigger definition
//!
//! A trigger is a key combination (plus optional character) owned by exactly
//! one hotkey list. Registration state lives in the registry, not here, so a
//! `Trigger` value can be cloned into snapshots freely.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::core::types::{KeyCombo, ListId, TriggerId};

/// Typed replacement for a target/selector callback
///
/// Legacy single-callback triggers carry one of these instead of an action
/// list. `is_valid` is checked before every invocation.
pub trait TriggerCallback: Send + Sync {
    /// Whether the callback can still be invoked
    fn is_valid(&self) -> bool {
        true
    }

    fn invoke(&self, trigger: &Trigger);
}

/// A bound key combination
#[derive(Clone, Deserialize, Serialize)]
pub struct Trigger {
    pub id: TriggerId,
    pub combo: KeyCombo,

    /// Character produced by the key when it was recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<u16>,

    /// Owning list (non-owning back reference)
    pub list: ListId,

    /// Replace an identical registered trigger instead of conflicting
    #[serde(default)]
    pub overwrite: bool,

    /// Run every bound action instead of only the first
    #[serde(default)]
    pub has_many_action: bool,

    #[serde(skip)]
    callback: Option<Arc<dyn TriggerCallback>>,
}

impl Trigger {
    pub fn new(id: TriggerId, list: ListId, combo: KeyCombo) -> Self {
        Self {
            id,
            combo,
            character: None,
            list,
            overwrite: false,
            has_many_action: false,
            callback: None,
        }
    }

    pub fn with_character(mut self, character: u16) -> Self {
        self.character = Some(character);
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_callback(mut self, callback: Arc<dyn TriggerCallback>) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn set_has_many_action(&mut self, flag: bool) {
        self.has_many_action = flag;
    }

    pub fn callback(&self) -> Option<&Arc<dyn TriggerCallback>> {
        self.callback.as_ref()
    }

    /// Invokes the callback if one is set and still valid
    ///
    /// Returns whether anything ran.
    pub fn fire(&self) -> bool {
        match &self.callback {
            Some(callback) if callback.is_valid() => {
                callback.invoke(self);
                true
            }
            _ => false,
        }
    }

    /// Human-readable shortcut text, e.g. `CMD+SHIFT+K`
    pub fn description(&self) -> String {
        self.combo.to_string()
    }

    /// True when both triggers describe the same keystroke
    ///
    /// Identity, list and flags are ignored.
    pub fn is_equivalent(&self, other: &Trigger) -> bool {
        self.combo == other.combo && self.character == other.character
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("id", &self.id)
            .field("combo", &self.combo)
            .field("character", &self.character)
            .field("list", &self.list)
            .field("overwrite", &self.overwrite)
            .field("has_many_action", &self.has_many_action)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trigger #{} ({})", self.id, self.combo)
    }
}
