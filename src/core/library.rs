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

//! src/core/library.rs
//!
//! The full set of lists, applications and triggers
//!
//! The library is the persisted model. Only the editor mutates it; the daemon
//! loads it and turns it into a registry snapshot (`Registry::replace_from`).
//! Identifiers are allocated here as `max + 1` so ids stay stable across
//! save/load round trips.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::action::Action;
use crate::core::conflict::{ConflictDetector, ConflictGroup};
use crate::core::list::{Application, Entry, HotkeyList};
use crate::core::trigger::Trigger;
use crate::core::types::{AppId, KeyCombo, ListId, Scope, TriggerId};

/// Structural errors when editing a library
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum LibraryError {
    #[error("Unknown list #{0}")]
    UnknownList(ListId),

    #[error("Unknown trigger #{0}")]
    UnknownTrigger(TriggerId),

    #[error("Unknown application #{0}")]
    UnknownApplication(AppId),
}

/// Lists, applications and triggers as loaded from disk
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Library {
    #[serde(default)]
    pub applications: Vec<Application>,

    #[serde(default)]
    pub lists: Vec<HotkeyList>,

    #[serde(default)]
    pub triggers: Vec<Trigger>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn application(&self, id: AppId) -> Option<&Application> {
        self.applications.iter().find(|a| a.id == id)
    }

    pub fn application_by_bundle(&self, bundle_id: &str) -> Option<&Application> {
        self.applications.iter().find(|a| a.bundle_id == bundle_id)
    }

    pub fn list(&self, id: ListId) -> Option<&HotkeyList> {
        self.lists.iter().find(|l| l.id == id)
    }

    pub fn list_mut(&mut self, id: ListId) -> Option<&mut HotkeyList> {
        self.lists.iter_mut().find(|l| l.id == id)
    }

    pub fn trigger(&self, id: TriggerId) -> Option<&Trigger> {
        self.triggers.iter().find(|t| t.id == id)
    }

    /// Scope a list's triggers are effective in
    pub fn scope_of(&self, list: ListId) -> Option<Scope> {
        self.list(list).map(HotkeyList::scope)
    }

    /// Adds an application, or returns the existing one with that bundle id
    pub fn add_application(&mut self, bundle_id: &str, name: &str) -> AppId {
        if let Some(existing) = self.application_by_bundle(bundle_id) {
            return existing.id;
        }

        let id = AppId(self.applications.iter().map(|a| a.id.0).max().unwrap_or(0) + 1);
        self.applications.push(Application {
            id,
            bundle_id: bundle_id.to_string(),
            name: name.to_string(),
            enabled: true,
        });
        id
    }

    pub fn add_list(&mut self, name: &str, application: Option<AppId>) -> Result<ListId, LibraryError> {
        if let Some(app) = application {
            if self.application(app).is_none() {
                return Err(LibraryError::UnknownApplication(app));
            }
        }

        let id = ListId(self.lists.iter().map(|l| l.id.0).max().unwrap_or(0) + 1);
        self.lists.push(HotkeyList::new(id, name, application));
        Ok(id)
    }

    /// Creates a trigger owned by `list`
    pub fn add_trigger(
        &mut self,
        list: ListId,
        combo: KeyCombo,
        character: Option<u16>,
        overwrite: bool,
    ) -> Result<TriggerId, LibraryError> {
        if self.list(list).is_none() {
            return Err(LibraryError::UnknownList(list));
        }

        let id = TriggerId(self.triggers.iter().map(|t| t.id.0).max().unwrap_or(0) + 1);
        let mut trigger = Trigger::new(id, list, combo).with_overwrite(overwrite);
        trigger.character = character;
        self.triggers.push(trigger);
        Ok(id)
    }

    /// Appends `action` to `trigger` in its owning list
    ///
    /// The second binding for a trigger turns on `has_many_action`.
    pub fn bind(&mut self, trigger: TriggerId, action: Action) -> Result<(), LibraryError> {
        let list_id = self
            .trigger(trigger)
            .map(|t| t.list)
            .ok_or(LibraryError::UnknownTrigger(trigger))?;

        let list = self
            .list_mut(list_id)
            .ok_or(LibraryError::UnknownList(list_id))?;
        list.entries.push(Entry { trigger, action });
        let count = list.binding_count(trigger);

        if count > 1 {
            if let Some(t) = self.triggers.iter_mut().find(|t| t.id == trigger) {
                t.set_has_many_action(true);
            }
        }
        Ok(())
    }

    /// Removes a trigger and every entry bound to it
    pub fn remove_trigger(&mut self, id: TriggerId) -> Result<Trigger, LibraryError> {
        let index = self
            .triggers
            .iter()
            .position(|t| t.id == id)
            .ok_or(LibraryError::UnknownTrigger(id))?;
        let trigger = self.triggers.remove(index);

        if let Some(list) = self.list_mut(trigger.list) {
            list.entries.retain(|entry| entry.trigger != id);
        }
        Ok(trigger)
    }

    /// Removes a list and the triggers it owns
    pub fn remove_list(&mut self, id: ListId) -> Result<HotkeyList, LibraryError> {
        let index = self
            .lists
            .iter()
            .position(|l| l.id == id)
            .ok_or(LibraryError::UnknownList(id))?;
        self.triggers.retain(|t| t.list != id);
        Ok(self.lists.remove(index))
    }

    pub fn set_list_enabled(&mut self, id: ListId, enabled: bool) -> Result<(), LibraryError> {
        let list = self.list_mut(id).ok_or(LibraryError::UnknownList(id))?;
        list.enabled = enabled;
        Ok(())
    }

    /// Actions bound to a trigger, in list order
    pub fn actions_for(&self, trigger: &Trigger) -> Vec<Action> {
        self.list(trigger.list)
            .map(|list| list.actions_for(trigger.id).cloned().collect())
            .unwrap_or_default()
    }

    /// Offline duplicate check over every list
    pub fn find_conflicts(&self) -> Vec<ConflictGroup> {
        let mut detector = ConflictDetector::new();
        for trigger in &self.triggers {
            if let Some(scope) = self.scope_of(trigger.list) {
                detector.add_trigger(scope, trigger.combo, trigger.id, trigger.overwrite);
            }
        }
        detector.find_conflicts()
    }
}
