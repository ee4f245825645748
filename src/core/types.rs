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

//! src/core/types.rs
//!
//! Core type definitions for hotkey management
//!
//! This module defines the fundamental types used throughout the engine:
//! - `Modifier` / `ModifierMask`: Keyboard modifier keys and their bitset
//! - `KeyCombo`: A virtual key code plus modifier mask
//! - `KeyEvent`: A raw event delivered by the platform key-event source
//! - `KeyCaught`: The payload published when a shortcut is recorded
//! - Identifier newtypes for triggers, lists and applications
//!
//! Modifier masks serialise as their raw `u32` so the persisted library and
//! the IPC wire format carry the same integer the platform reports.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Platform virtual key code
pub type KeyCode = u16;

/// Key code that never identifies a real key
pub const INVALID_KEY_CODE: KeyCode = 0xFFFF;

bitflags! {
    /// Bitset of modifier keys held during a key event
    ///
    /// Bit positions follow the platform device-independent modifier flags,
    /// so a mask read from an event can be stored without translation.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct ModifierMask: u32 {
        const SHIFT = 1 << 17;
        const CONTROL = 1 << 18;
        const OPTION = 1 << 19;
        const COMMAND = 1 << 20;
        const FUNCTION = 1 << 23;
    }
}

impl Serialize for ModifierMask {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for ModifierMask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        Ok(ModifierMask::from_bits_truncate(bits))
    }
}

impl ModifierMask {
    /// Builds a mask from individual modifiers (duplicates collapse)
    pub fn from_modifiers<I: IntoIterator<Item = Modifier>>(modifiers: I) -> Self {
        modifiers
            .into_iter()
            .fold(ModifierMask::empty(), |mask, m| mask | m.mask())
    }

    /// Returns the modifiers in display order (CMD, OPT, CTRL, SHIFT, FN)
    pub fn modifiers(&self) -> Vec<Modifier> {
        Modifier::ALL
            .iter()
            .copied()
            .filter(|m| self.contains(m.mask()))
            .collect()
    }
}

/// Keyboard modifier keys
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Modifier {
    /// Command key
    Command,
    /// Option/Alt key
    Option,
    /// Control key
    Control,
    /// Shift key
    Shift,
    /// Function (fn) key
    Function,
}

impl Modifier {
    /// Display order used by `KeyCombo`'s `Display` impl
    pub const ALL: [Modifier; 5] = [
        Modifier::Command,
        Modifier::Option,
        Modifier::Control,
        Modifier::Shift,
        Modifier::Function,
    ];

    /// The mask bit for this modifier
    pub fn mask(self) -> ModifierMask {
        match self {
            Modifier::Command => ModifierMask::COMMAND,
            Modifier::Option => ModifierMask::OPTION,
            Modifier::Control => ModifierMask::CONTROL,
            Modifier::Shift => ModifierMask::SHIFT,
            Modifier::Function => ModifierMask::FUNCTION,
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::Command => write!(f, "CMD"),
            Modifier::Option => write!(f, "OPT"),
            Modifier::Control => write!(f, "CTRL"),
            Modifier::Shift => write!(f, "SHIFT"),
            Modifier::Function => write!(f, "FN"),
        }
    }
}

/// A key code plus modifier mask
///
/// This is the identity the registry indexes on. Two combos are equal when
/// both the key code and the full modifier mask match.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct KeyCombo {
    /// Virtual key code
    pub key_code: KeyCode,
    /// Held modifiers
    pub modifiers: ModifierMask,
}

impl KeyCombo {
    pub fn new(key_code: KeyCode, modifiers: ModifierMask) -> Self {
        Self { key_code, modifiers }
    }

    /// False for the sentinel key code
    pub fn is_valid(&self) -> bool {
        self.key_code != INVALID_KEY_CODE
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in self.modifiers.modifiers() {
            write!(f, "{}+", modifier)?;
        }
        match crate::core::parser::key_name(self.key_code) {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "#{}", self.key_code),
        }
    }
}

/// Kind of raw key event
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum KeyEventKind {
    KeyDown,
    KeyUp,
    FlagsChanged,
}

/// A raw event produced by the platform key-event source
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyEvent {
    pub key_code: KeyCode,
    pub modifiers: ModifierMask,
    /// Unicode character produced by the key, if any
    pub character: Option<u16>,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Key-down event without a character
    pub fn key_down(key_code: KeyCode, modifiers: ModifierMask) -> Self {
        Self {
            key_code,
            modifiers,
            character: None,
            kind: KeyEventKind::KeyDown,
        }
    }

    pub fn with_character(mut self, character: u16) -> Self {
        self.character = Some(character);
        self
    }

    pub fn combo(&self) -> KeyCombo {
        KeyCombo::new(self.key_code, self.modifiers)
    }

    /// Command-modified events are key equivalents (menu shortcuts)
    pub fn is_key_equivalent(&self) -> bool {
        self.modifiers.contains(ModifierMask::COMMAND)
    }
}

/// Payload published when a shortcut is caught
///
/// Exactly the triple (key code, modifier mask, character code). A character
/// code of 0 means the key produced no character.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct KeyCaught {
    pub key_code: KeyCode,
    pub modifier_mask: u32,
    pub character_code: u16,
}

impl KeyCaught {
    pub fn combo(&self) -> KeyCombo {
        KeyCombo::new(self.key_code, ModifierMask::from_bits_truncate(self.modifier_mask))
    }

    pub fn character(&self) -> Option<u16> {
        (self.character_code != 0).then_some(self.character_code)
    }
}

impl From<&KeyEvent> for KeyCaught {
    fn from(event: &KeyEvent) -> Self {
        Self {
            key_code: event.key_code,
            modifier_mask: event.modifiers.bits(),
            character_code: event.character.unwrap_or(0),
        }
    }
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identity of a trigger within a library
    TriggerId
);
id_type!(
    /// Identity of a hotkey list within a library
    ListId
);
id_type!(
    /// Identity of an application within a library
    AppId
);

/// Where a trigger is effective
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Scope {
    /// Effective in every application without its own override
    Global,
    /// Effective only while this application is front-most
    Application(AppId),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => write!(f, "global"),
            Scope::Application(id) => write!(f, "application #{}", id),
        }
    }
}
