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

//! src/core/registry.rs
//!
//! Trigger registry with O(1) lookup and wait-free reads
//!
//! Registered triggers are indexed by `(scope, combo)`. The whole index lives
//! in an immutable `Snapshot` behind an `ArcSwap`:
//! - Readers (`find`, `lookup`) load the current snapshot without locking,
//!   which keeps the key-event path inside its latency budget
//! - Writers serialise on a mutex, clone the snapshot, modify the clone and
//!   publish it with a single atomic store
//!
//! # Override priority
//! `find` checks the front application's scope before the global scope. An
//! application trigger in a disabled list falls back to an enabled global
//! trigger; if neither is enabled the application trigger is returned so the
//! dispatcher can suppress the event.

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::core::action::{Action, ActionKind, DaemonAction};
use crate::core::conflict::Conflict;
use crate::core::library::Library;
use crate::core::trigger::Trigger;
use crate::core::types::{AppId, KeyCode, KeyCombo, ListId, ModifierMask, Scope, TriggerId};

/// Registry mutation errors
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RegistryError {
    #[error(transparent)]
    Conflict(#[from] Conflict),

    #[error("Unknown list #{0}")]
    UnknownList(ListId),

    #[error("Trigger #{0} is not registered")]
    NotRegistered(TriggerId),
}

/// A live trigger together with its bound actions
#[derive(Clone, Debug)]
pub struct RegisteredTrigger {
    pub trigger: Trigger,
    pub scope: Scope,
    /// Bound actions in list order
    pub actions: Vec<Action>,
}

impl RegisteredTrigger {
    /// Actions a dispatch should run
    ///
    /// Every bound action when `has_many_action` is set, otherwise the first.
    pub fn actions_to_run(&self) -> &[Action] {
        if self.trigger.has_many_action {
            &self.actions
        } else {
            &self.actions[..self.actions.len().min(1)]
        }
    }

    /// Whether a dispatch would pause or resume the daemon
    ///
    /// Such triggers stay live while the daemon is paused.
    pub fn switches_status(&self) -> bool {
        self.actions_to_run()
            .iter()
            .any(|a| matches!(a.kind, ActionKind::BuiltIn(DaemonAction::SwitchStatus)))
    }
}

/// Result of a lookup
#[derive(Clone, Debug)]
pub struct Resolution {
    pub trigger: Arc<RegisteredTrigger>,
    /// Whether the owning list was enabled in the snapshot that was read
    pub list_enabled: bool,
}

#[derive(Clone, Copy, Debug)]
struct ListState {
    application: Option<AppId>,
    enabled: bool,
}

impl ListState {
    fn scope(&self) -> Scope {
        match self.application {
            Some(app) => Scope::Application(app),
            None => Scope::Global,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct AppState {
    id: AppId,
    enabled: bool,
}

#[derive(Clone, Debug, Default)]
struct Snapshot {
    slots: HashMap<(Scope, KeyCombo), TriggerId>,
    triggers: HashMap<TriggerId, Arc<RegisteredTrigger>>,
    lists: HashMap<ListId, ListState>,
    /// Keyed by bundle identifier
    applications: HashMap<String, AppState>,
}

impl Snapshot {
    fn register(
        &mut self,
        trigger: Trigger,
        overwrite: bool,
        actions: Option<Vec<Action>>,
    ) -> Result<(), RegistryError> {
        let list = self
            .lists
            .get(&trigger.list)
            .ok_or(RegistryError::UnknownList(trigger.list))?;
        let scope = list.scope();
        let key = (scope, trigger.combo);

        if let Some(&existing) = self.slots.get(&key) {
            if existing != trigger.id {
                if !(overwrite || trigger.overwrite) {
                    return Err(Conflict {
                        existing,
                        candidate: Some(trigger.id),
                        combo: trigger.combo,
                        scope,
                    }
                    .into());
                }
                debug!(%existing, replacement = %trigger.id, combo = %trigger.combo, "overwriting trigger");
                self.remove(existing);
            }
        }

        // Re-registering an id keeps its actions unless new ones are given
        let previous = self.remove(trigger.id);
        let actions = actions
            .or_else(|| previous.map(|p| p.actions.clone()))
            .unwrap_or_default();

        self.slots.insert(key, trigger.id);
        self.triggers.insert(
            trigger.id,
            Arc::new(RegisteredTrigger {
                trigger,
                scope,
                actions,
            }),
        );
        Ok(())
    }

    fn remove(&mut self, id: TriggerId) -> Option<Arc<RegisteredTrigger>> {
        let removed = self.triggers.remove(&id)?;
        let key = (removed.scope, removed.trigger.combo);
        if self.slots.get(&key) == Some(&id) {
            self.slots.remove(&key);
        }
        Some(removed)
    }

    fn resolve(&self, scope: Scope, combo: KeyCombo) -> Option<Resolution> {
        let id = self.slots.get(&(scope, combo))?;
        let trigger = self.triggers.get(id)?;
        let list_enabled = self
            .lists
            .get(&trigger.trigger.list)
            .map(|l| l.enabled)
            .unwrap_or(false);

        Some(Resolution {
            trigger: Arc::clone(trigger),
            list_enabled,
        })
    }

    fn trigger_mut(&mut self, id: TriggerId) -> Result<&mut RegisteredTrigger, RegistryError> {
        self.triggers
            .get_mut(&id)
            .map(Arc::make_mut)
            .ok_or(RegistryError::NotRegistered(id))
    }
}

/// Registered triggers, readable without locks
pub struct Registry {
    snap: ArcSwap<Snapshot>,
    write: Mutex<()>,
}

impl Registry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            snap: ArcSwap::from_pointee(Snapshot::default()),
            write: Mutex::new(()),
        }
    }

    /// Builds a registry from a library
    ///
    /// Triggers that conflict with an earlier one are skipped and returned.
    /// Triggers of enabled lists are registered before those of disabled
    /// lists.
    pub fn from_library(library: &Library) -> (Self, Vec<Conflict>) {
        let registry = Self::new();
        let conflicts = registry.replace_from(library);
        (registry, conflicts)
    }

    /// Replaces the whole snapshot with the contents of `library`
    ///
    /// Used by the daemon on reload. Readers see either the old or the new
    /// snapshot, never a mix.
    pub fn replace_from(&self, library: &Library) -> Vec<Conflict> {
        let mut next = Snapshot::default();
        let mut conflicts = Vec::new();

        for app in &library.applications {
            next.applications.insert(
                app.bundle_id.clone(),
                AppState {
                    id: app.id,
                    enabled: app.enabled,
                },
            );
        }
        for list in &library.lists {
            next.lists.insert(
                list.id,
                ListState {
                    application: list.application,
                    enabled: list.enabled,
                },
            );
        }
        // Enabled lists claim their combos before disabled ones
        let (live, dormant): (Vec<&Trigger>, Vec<&Trigger>) = library
            .triggers
            .iter()
            .partition(|t| next.lists.get(&t.list).is_some_and(|l| l.enabled));
        for trigger in live.into_iter().chain(dormant) {
            let actions = library.actions_for(trigger);
            match next.register(trigger.clone(), false, Some(actions)) {
                Ok(()) => {}
                Err(RegistryError::Conflict(conflict)) => conflicts.push(conflict),
                Err(e) => debug!(trigger = %trigger.id, error = %e, "skipping trigger"),
            }
        }

        let _guard = self.write.lock();
        self.snap.store(Arc::new(next));
        conflicts
    }

    fn try_update<R>(
        &self,
        f: impl FnOnce(&mut Snapshot) -> Result<R, RegistryError>,
    ) -> Result<R, RegistryError> {
        let _guard = self.write.lock();
        let mut next = Snapshot::clone(&self.snap.load());
        let result = f(&mut next)?;
        self.snap.store(Arc::new(next));
        Ok(result)
    }

    /// Declares a list so its triggers can be registered
    pub fn add_list(&self, id: ListId, application: Option<AppId>, enabled: bool) {
        let _ = self.try_update(|snap| {
            snap.lists.insert(id, ListState { application, enabled });
            Ok(())
        });
    }

    /// Removes a list and unregisters its triggers
    pub fn remove_list(&self, id: ListId) -> Result<(), RegistryError> {
        self.try_update(|snap| {
            snap.lists.remove(&id).ok_or(RegistryError::UnknownList(id))?;
            let owned: Vec<TriggerId> = snap
                .triggers
                .values()
                .filter(|t| t.trigger.list == id)
                .map(|t| t.trigger.id)
                .collect();
            for trigger in owned {
                snap.remove(trigger);
            }
            Ok(())
        })
    }

    /// Declares an application that can own override lists
    pub fn add_application(&self, id: AppId, bundle_id: &str, enabled: bool) {
        let _ = self.try_update(|snap| {
            snap.applications
                .insert(bundle_id.to_string(), AppState { id, enabled });
            Ok(())
        });
    }

    /// Enables or disables an application's overrides
    ///
    /// Returns false if no application has that bundle id.
    pub fn set_application_enabled(&self, bundle_id: &str, enabled: bool) -> bool {
        self.try_update(|snap| match snap.applications.get_mut(bundle_id) {
            Some(app) => {
                app.enabled = enabled;
                Ok(true)
            }
            None => Ok(false),
        })
        .unwrap_or(false)
    }

    /// Registers a trigger in its list's scope
    ///
    /// Fails with `Conflict` if another trigger already holds the same combo
    /// in that scope, unless `overwrite` (or the trigger's own `overwrite`
    /// flag) is set, in which case the holder is unregistered.
    pub fn register(&self, trigger: Trigger, overwrite: bool) -> Result<(), RegistryError> {
        self.try_update(|snap| snap.register(trigger, overwrite, None))
    }

    /// Unregisters a trigger; returns whether it was registered
    pub fn unregister(&self, id: TriggerId) -> bool {
        self.try_update(|snap| Ok(snap.remove(id).is_some()))
            .unwrap_or(false)
    }

    /// Appends an action to a registered trigger
    ///
    /// A second action sets `has_many_action`, as `Library::bind` does.
    pub fn bind(&self, id: TriggerId, action: Action) -> Result<(), RegistryError> {
        self.try_update(|snap| {
            let registered = snap.trigger_mut(id)?;
            registered.actions.push(action);
            if registered.actions.len() > 1 {
                registered.trigger.set_has_many_action(true);
            }
            Ok(())
        })
    }

    pub fn set_has_many_action(&self, id: TriggerId, flag: bool) -> Result<(), RegistryError> {
        self.try_update(|snap| {
            snap.trigger_mut(id)?.trigger.set_has_many_action(flag);
            Ok(())
        })
    }

    pub fn set_list_enabled(&self, id: ListId, enabled: bool) -> Result<(), RegistryError> {
        self.try_update(|snap| {
            let list = snap.lists.get_mut(&id).ok_or(RegistryError::UnknownList(id))?;
            list.enabled = enabled;
            Ok(())
        })
    }

    /// Flips a list's enabled flag and returns the new value
    pub fn toggle_list(&self, id: ListId) -> Result<bool, RegistryError> {
        self.try_update(|snap| {
            let list = snap.lists.get_mut(&id).ok_or(RegistryError::UnknownList(id))?;
            list.enabled = !list.enabled;
            Ok(list.enabled)
        })
    }

    pub fn is_list_enabled(&self, id: ListId) -> Option<bool> {
        self.snap.load().lists.get(&id).map(|l| l.enabled)
    }

    pub fn is_registered(&self, id: TriggerId) -> bool {
        self.snap.load().triggers.contains_key(&id)
    }

    /// The trigger registered for `combo` in exactly `scope`
    pub fn lookup(&self, scope: Scope, combo: KeyCombo) -> Option<Arc<RegisteredTrigger>> {
        self.snap.load().resolve(scope, combo).map(|r| r.trigger)
    }

    /// Resolves a keystroke for the given front application
    ///
    /// `application` is the front application's bundle id. Lock-free.
    pub fn find(
        &self,
        key_code: KeyCode,
        modifiers: ModifierMask,
        application: Option<&str>,
    ) -> Option<Resolution> {
        let snap = self.snap.load();
        let combo = KeyCombo::new(key_code, modifiers);

        let app_hit = application
            .and_then(|bundle| snap.applications.get(bundle))
            .filter(|app| app.enabled)
            .and_then(|app| snap.resolve(Scope::Application(app.id), combo));

        if let Some(hit) = &app_hit {
            if hit.list_enabled {
                return app_hit;
            }
        }

        match snap.resolve(Scope::Global, combo) {
            Some(global) if global.list_enabled => Some(global),
            global => app_hit.or(global),
        }
    }

    /// Every registered trigger, ordered by id
    pub fn triggers(&self) -> Vec<Arc<RegisteredTrigger>> {
        let snap = self.snap.load();
        let mut all: Vec<_> = snap.triggers.values().cloned().collect();
        all.sort_by_key(|t| t.trigger.id);
        all
    }

    pub fn len(&self) -> usize {
        self.snap.load().triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
