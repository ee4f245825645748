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

//! Input validation for triggers and actions
//!
//! Everything the editor accepts from the user (or reads from a library file)
//! passes through here before it is registered or persisted:
//! - Plugin identifiers must be reverse-DNS names
//! - Menu titles and names must be non-empty, bounded and free of control
//!   characters
//! - Trigger combos must name a real key

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

use crate::core::action::{Action, ActionKind, SystemAction};
use crate::core::trigger::Trigger;

/// Longest accepted name or title
pub const MAX_TEXT_LEN: usize = 256;

/// Validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Plugin identifier is not a reverse-DNS name
    #[error("Invalid plugin identifier '{0}'")]
    InvalidPluginId(String),

    /// Required text field is empty
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// Text contains control characters
    #[error("{0} contains control characters")]
    ControlCharacters(&'static str),

    /// Text exceeds `MAX_TEXT_LEN`
    #[error("{field} too long: {len} characters (max 256)")]
    TooLong { field: &'static str, len: usize },

    /// Trigger uses the sentinel key code
    #[error("Invalid key code {0}")]
    InvalidKeyCode(u16),
}

const PLUGIN_ID_PATTERN: &str = r"^[A-Za-z][A-Za-z0-9-]*(\.[A-Za-z0-9][A-Za-z0-9-]*)+$";

fn plugin_id_regex() -> Option<&'static Regex> {
    static PLUGIN_ID: OnceLock<Option<Regex>> = OnceLock::new();
    PLUGIN_ID
        .get_or_init(|| Regex::new(PLUGIN_ID_PATTERN).ok())
        .as_ref()
}

/// Validates a plugin identifier (e.g. `org.example.volume`)
pub fn validate_plugin_id(id: &str) -> Result<(), ValidationError> {
    match plugin_id_regex() {
        Some(re) if re.is_match(id) => Ok(()),
        _ => Err(ValidationError::InvalidPluginId(id.to_string())),
    }
}

/// Validates a free-text field
///
/// Empty text is rejected only when `required` is set.
pub fn validate_text(field: &'static str, text: &str, required: bool) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return if required {
            Err(ValidationError::EmptyField(field))
        } else {
            Ok(())
        };
    }

    let len = text.chars().count();
    if len > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong { field, len });
    }

    if text.chars().any(char::is_control) {
        return Err(ValidationError::ControlCharacters(field));
    }

    Ok(())
}

/// Validates an action before it is bound
pub fn validate_action(action: &Action) -> Result<(), ValidationError> {
    validate_text("Action name", &action.name, false)?;

    match &action.kind {
        ActionKind::Accessibility(menu) => {
            validate_text("Menu title", &menu.menu_title, true)?;
            validate_text("Menu item title", &menu.menu_item_title, true)?;
        }
        ActionKind::Plugin(plugin) => validate_plugin_id(&plugin.plugin_id)?,
        ActionKind::System(SystemAction::SwitchSession {
            user_name: Some(name),
            ..
        }) => validate_text("User name", name, true)?,
        ActionKind::System(_) | ActionKind::BuiltIn(_) => {}
    }

    Ok(())
}

/// Validates a trigger before it is registered
pub fn validate_trigger(trigger: &Trigger) -> Result<(), ValidationError> {
    if !trigger.combo.is_valid() {
        return Err(ValidationError::InvalidKeyCode(trigger.combo.key_code));
    }
    Ok(())
}
