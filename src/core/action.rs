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

//! src/core/action.rs
//!
//! Action execution contract
//!
//! Every action bound to a trigger is an `Action`: shared attributes (name,
//! icon, confirmation flag) around a closed `ActionKind` union. Execution goes
//! through three collaborator traits so the core never touches the OS itself:
//! - `Platform`: system effects (log out, sleep, accessibility toggles, ...)
//! - `PluginHost`: externally loaded plugin actions, opaque to the core
//! - `DaemonControl`: the daemon's own switches (pause, toggle a list)
//!
//! `execute` never blocks on UI. Actions whose `should_confirm()` is true must
//! be confirmed by the caller before `execute` runs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::trigger::Trigger;
use crate::core::types::ListId;

/// Failure of a single action
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ActionError {
    /// The OS refused the operation (e.g. session switch without rights)
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The platform has no implementation for this effect
    #[error("{0} is not supported on this platform")]
    Unsupported(String),

    /// Plugin action whose plugin is not loaded
    #[error("Plugin '{0}' is not loaded")]
    PluginUnavailable(String),

    /// Confirmation was required and refused
    #[error("'{0}' was not confirmed")]
    NotConfirmed(String),

    #[error("Unknown list #{0}")]
    UnknownList(ListId),

    #[error("Action failed: {0}")]
    Failed(String),

    /// The action panicked; the worker caught it
    #[error("Action panicked: {0}")]
    Panicked(String),
}

/// Built-in system actions
///
/// Each variant persists under its four-character code.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "code")]
pub enum SystemAction {
    #[serde(rename = "Logo")]
    LogOut,
    #[serde(rename = "Slep")]
    Sleep,
    #[serde(rename = "Rest")]
    Restart,
    #[serde(rename = "Halt")]
    ShutDown,
    #[serde(rename = "ScSa")]
    ScreenSaver,
    /// Fast user switch to another session
    #[serde(rename = "Swit")]
    SwitchSession {
        uid: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_name: Option<String>,
    },
    #[serde(rename = "Gray")]
    ToggleGrayscale,
    #[serde(rename = "Pola")]
    TogglePolarity,
    #[serde(rename = "Epty")]
    EmptyTrash,
}

impl SystemAction {
    /// Persisted four-character code
    pub fn code(&self) -> &'static str {
        match self {
            SystemAction::LogOut => "Logo",
            SystemAction::Sleep => "Slep",
            SystemAction::Restart => "Rest",
            SystemAction::ShutDown => "Halt",
            SystemAction::ScreenSaver => "ScSa",
            SystemAction::SwitchSession { .. } => "Swit",
            SystemAction::ToggleGrayscale => "Gray",
            SystemAction::TogglePolarity => "Pola",
            SystemAction::EmptyTrash => "Epty",
        }
    }

    /// Variants that lose user state; confirmation defaults to on for these
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            SystemAction::LogOut
                | SystemAction::Restart
                | SystemAction::ShutDown
                | SystemAction::SwitchSession { .. }
                | SystemAction::EmptyTrash
        )
    }

    fn describe(&self) -> String {
        match self {
            SystemAction::LogOut => "Log out".to_string(),
            SystemAction::Sleep => "Sleep".to_string(),
            SystemAction::Restart => "Restart".to_string(),
            SystemAction::ShutDown => "Shut down".to_string(),
            SystemAction::ScreenSaver => "Start screen saver".to_string(),
            SystemAction::SwitchSession { uid, user_name } => match user_name {
                Some(name) => format!("Switch to {}", name),
                None => format!("Switch to user {}", uid),
            },
            SystemAction::ToggleGrayscale => "Toggle grayscale".to_string(),
            SystemAction::TogglePolarity => "Toggle display polarity".to_string(),
            SystemAction::EmptyTrash => "Empty trash".to_string(),
        }
    }

    fn execute(&self, platform: &dyn Platform) -> Result<(), ActionError> {
        match self {
            SystemAction::LogOut => platform.log_out(),
            SystemAction::Sleep => platform.sleep(),
            SystemAction::Restart => platform.restart(),
            SystemAction::ShutDown => platform.shut_down(),
            SystemAction::ScreenSaver => platform.start_screen_saver(),
            SystemAction::SwitchSession { uid, user_name } => {
                platform.switch_session(*uid, user_name.as_deref())
            }
            SystemAction::ToggleGrayscale => platform.toggle_grayscale(),
            SystemAction::TogglePolarity => platform.toggle_polarity(),
            SystemAction::EmptyTrash => platform.empty_trash(),
        }
    }
}

/// Presses a menu item of the front application through accessibility
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MenuAction {
    pub menu_title: String,
    pub menu_item_title: String,
}

/// Actions handled by the daemon itself
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum DaemonAction {
    /// Bring up the editor
    LaunchEditor,
    /// Pause or resume all hotkey dispatch
    SwitchStatus,
    /// Enable or disable one list
    SwitchListStatus { list: ListId },
}

/// Externally supplied action, opaque to the core
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PluginAction {
    /// Reverse-DNS identifier of the providing plugin
    pub plugin_id: String,
    /// Plugin-owned state, stored and returned untouched
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Closed set of action variants
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "variant", content = "data", rename_all = "snake_case")]
pub enum ActionKind {
    System(SystemAction),
    Accessibility(MenuAction),
    BuiltIn(DaemonAction),
    Plugin(PluginAction),
}

impl ActionKind {
    fn default_icon(&self) -> &'static str {
        match self {
            ActionKind::System(_) => "system",
            ActionKind::Accessibility(_) => "accessibility",
            ActionKind::BuiltIn(_) => "keytrap",
            ActionKind::Plugin(_) => "plugin",
        }
    }
}

/// An executable side effect bound to a trigger
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Action {
    /// Display name; empty means "derive from the variant"
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Ask before running
    #[serde(default)]
    pub confirm: bool,

    pub kind: ActionKind,
}

/// Everything an action may touch while executing
pub struct ActionContext<'a> {
    pub trigger: &'a Trigger,
    pub platform: &'a dyn Platform,
    pub plugins: &'a dyn PluginHost,
    pub control: &'a dyn DaemonControl,
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            name: String::new(),
            icon: None,
            confirm: false,
            kind,
        }
    }

    /// System action; destructive variants ask for confirmation by default
    pub fn system(action: SystemAction) -> Self {
        let confirm = action.is_destructive();
        Self {
            confirm,
            ..Self::new(ActionKind::System(action))
        }
    }

    pub fn menu(menu_title: &str, menu_item_title: &str) -> Self {
        Self::new(ActionKind::Accessibility(MenuAction {
            menu_title: menu_title.to_string(),
            menu_item_title: menu_item_title.to_string(),
        }))
    }

    pub fn plugin(plugin_id: &str, payload: serde_json::Value) -> Self {
        Self::new(ActionKind::Plugin(PluginAction {
            plugin_id: plugin_id.to_string(),
            payload,
        }))
    }

    pub fn daemon(action: DaemonAction) -> Self {
        Self::new(ActionKind::BuiltIn(action))
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_confirm(mut self, confirm: bool) -> Self {
        self.confirm = confirm;
        self
    }

    pub fn should_confirm(&self) -> bool {
        self.confirm
    }

    /// Icon reference, falling back to the variant's default
    pub fn icon(&self) -> &str {
        self.icon
            .as_deref()
            .unwrap_or_else(|| self.kind.default_icon())
    }

    /// Human-readable description
    pub fn description(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }

        match &self.kind {
            ActionKind::System(system) => system.describe(),
            ActionKind::Accessibility(menu) => {
                format!("{} > {}", menu.menu_title, menu.menu_item_title)
            }
            ActionKind::BuiltIn(DaemonAction::LaunchEditor) => "Open editor".to_string(),
            ActionKind::BuiltIn(DaemonAction::SwitchStatus) => "Pause/resume hotkeys".to_string(),
            ActionKind::BuiltIn(DaemonAction::SwitchListStatus { list }) => {
                format!("Enable/disable list #{}", list)
            }
            ActionKind::Plugin(plugin) => plugin.plugin_id.clone(),
        }
    }

    /// Runs the action
    pub fn execute(&self, context: &ActionContext<'_>) -> Result<(), ActionError> {
        match &self.kind {
            ActionKind::System(system) => system.execute(context.platform),
            ActionKind::Accessibility(menu) => context
                .platform
                .press_menu_item(&menu.menu_title, &menu.menu_item_title),
            ActionKind::BuiltIn(DaemonAction::LaunchEditor) => context.platform.launch_editor(),
            ActionKind::BuiltIn(DaemonAction::SwitchStatus) => {
                let paused = context.control.is_paused();
                context.control.set_paused(!paused);
                Ok(())
            }
            ActionKind::BuiltIn(DaemonAction::SwitchListStatus { list }) => {
                context.control.toggle_list(*list).map(|_| ())
            }
            ActionKind::Plugin(plugin) => context.plugins.execute(plugin, context),
        }
    }
}

/// OS effects used by built-in actions
///
/// Every method defaults to `ActionError::Unsupported`, so a platform only
/// implements what it can do.
pub trait Platform: Send + Sync {
    fn log_out(&self) -> Result<(), ActionError> {
        Err(ActionError::Unsupported("log out".to_string()))
    }

    fn sleep(&self) -> Result<(), ActionError> {
        Err(ActionError::Unsupported("sleep".to_string()))
    }

    fn restart(&self) -> Result<(), ActionError> {
        Err(ActionError::Unsupported("restart".to_string()))
    }

    fn shut_down(&self) -> Result<(), ActionError> {
        Err(ActionError::Unsupported("shut down".to_string()))
    }

    fn start_screen_saver(&self) -> Result<(), ActionError> {
        Err(ActionError::Unsupported("screen saver".to_string()))
    }

    fn switch_session(&self, _uid: u32, _user_name: Option<&str>) -> Result<(), ActionError> {
        Err(ActionError::Unsupported("session switch".to_string()))
    }

    fn toggle_grayscale(&self) -> Result<(), ActionError> {
        Err(ActionError::Unsupported("grayscale".to_string()))
    }

    fn toggle_polarity(&self) -> Result<(), ActionError> {
        Err(ActionError::Unsupported("display polarity".to_string()))
    }

    fn empty_trash(&self) -> Result<(), ActionError> {
        Err(ActionError::Unsupported("empty trash".to_string()))
    }

    fn press_menu_item(&self, _menu_title: &str, _item_title: &str) -> Result<(), ActionError> {
        Err(ActionError::Unsupported("menu items".to_string()))
    }

    fn launch_editor(&self) -> Result<(), ActionError> {
        Err(ActionError::Unsupported("editor launch".to_string()))
    }
}

/// Executes plugin actions
pub trait PluginHost: Send + Sync {
    fn execute(&self, action: &PluginAction, context: &ActionContext<'_>) -> Result<(), ActionError>;
}

/// Host with no plugins loaded
pub struct NoPlugins;

impl PluginHost for NoPlugins {
    fn execute(&self, action: &PluginAction, _context: &ActionContext<'_>) -> Result<(), ActionError> {
        Err(ActionError::PluginUnavailable(action.plugin_id.clone()))
    }
}

/// The daemon's own switches, as seen by built-in actions
pub trait DaemonControl: Send + Sync {
    fn is_paused(&self) -> bool;

    fn set_paused(&self, paused: bool);

    /// Flips a list's enabled flag, returning the new value
    fn toggle_list(&self, list: ListId) -> Result<bool, ActionError>;
}
