//! Hotkey lists and applications
//!
//! A list is a named, independently enable-able set of trigger→action
//! entries. Lists owned by an application only apply while that application
//! is front-most and shadow the global lists for the same combo.

use serde::{Deserialize, Serialize};

use crate::core::action::Action;
use crate::core::types::{AppId, ListId, Scope, TriggerId};

fn enabled_by_default() -> bool {
    true
}

/// An application that can own override lists
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Application {
    pub id: AppId,
    /// Bundle identifier reported by the OS for the front application
    pub bundle_id: String,
    pub name: String,
    /// Disabled applications contribute no overrides
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

/// One trigger→action binding, in list order
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Entry {
    pub trigger: TriggerId,
    pub action: Action,
}

/// A named collection of bindings
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct HotkeyList {
    pub id: ListId,
    pub name: String,

    #[serde(default = "enabled_by_default")]
    pub enabled: bool,

    /// Owning application; `None` is the global scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<AppId>,

    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl HotkeyList {
    pub fn new(id: ListId, name: &str, application: Option<AppId>) -> Self {
        Self {
            id,
            name: name.to_string(),
            enabled: true,
            application,
            entries: Vec::new(),
        }
    }

    pub fn scope(&self) -> Scope {
        match self.application {
            Some(app) => Scope::Application(app),
            None => Scope::Global,
        }
    }

    /// Actions bound to `trigger`, in list order
    pub fn actions_for(&self, trigger: TriggerId) -> impl Iterator<Item = &Action> {
        self.entries
            .iter()
            .filter(move |entry| entry.trigger == trigger)
            .map(|entry| &entry.action)
    }

    pub fn binding_count(&self, trigger: TriggerId) -> usize {
        self.actions_for(trigger).count()
    }
}
