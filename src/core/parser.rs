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

//! src/core/parser.rs
//!
//! Shortcut text parser
//!
//! Parses human-readable shortcuts such as `CMD+SHIFT+K`, `ctrl + F1` or
//! `OPT+#49` into a `KeyCombo`. The last `+`-separated token is the key; every
//! token before it must be a modifier name.
//!
//! # Architecture
//! The parser uses nom combinators. Key names map to platform virtual key
//! codes through a static table; `#<n>` spells a raw key code for keys the
//! table does not name.

use nom::{
    bytes::complete::take_while1,
    character::complete::{char, digit1, space0},
    combinator::{all_consuming, map_res},
    multi::separated_list1,
    sequence::{delimited, preceded},
    IResult, Parser,
};
use thiserror::Error;

use crate::core::types::{KeyCode, KeyCombo, Modifier, ModifierMask};

/// Shortcut parse errors
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Invalid shortcut syntax: '{0}'")]
    InvalidSyntax(String),

    #[error("Unknown modifier '{0}'")]
    UnknownModifier(String),

    #[error("Unknown key '{0}'")]
    UnknownKey(String),
}

/// Virtual key codes by name
const KEY_NAMES: &[(&str, KeyCode)] = &[
    ("A", 0),
    ("S", 1),
    ("D", 2),
    ("F", 3),
    ("H", 4),
    ("G", 5),
    ("Z", 6),
    ("X", 7),
    ("C", 8),
    ("V", 9),
    ("B", 11),
    ("Q", 12),
    ("W", 13),
    ("E", 14),
    ("R", 15),
    ("Y", 16),
    ("T", 17),
    ("1", 18),
    ("2", 19),
    ("3", 20),
    ("4", 21),
    ("6", 22),
    ("5", 23),
    ("=", 24),
    ("9", 25),
    ("7", 26),
    ("-", 27),
    ("8", 28),
    ("0", 29),
    ("]", 30),
    ("O", 31),
    ("U", 32),
    ("[", 33),
    ("I", 34),
    ("P", 35),
    ("RETURN", 36),
    ("L", 37),
    ("J", 38),
    ("'", 39),
    ("K", 40),
    (";", 41),
    ("\\", 42),
    (",", 43),
    ("/", 44),
    ("N", 45),
    ("M", 46),
    (".", 47),
    ("TAB", 48),
    ("SPACE", 49),
    ("`", 50),
    ("DELETE", 51),
    ("ESCAPE", 53),
    ("F17", 64),
    ("F18", 79),
    ("F19", 80),
    ("F20", 90),
    ("F5", 96),
    ("F6", 97),
    ("F7", 98),
    ("F3", 99),
    ("F8", 100),
    ("F9", 101),
    ("F11", 103),
    ("F13", 105),
    ("F16", 106),
    ("F14", 107),
    ("F10", 109),
    ("F12", 111),
    ("F15", 113),
    ("HELP", 114),
    ("HOME", 115),
    ("PAGEUP", 116),
    ("FORWARDDELETE", 117),
    ("F4", 118),
    ("END", 119),
    ("F2", 120),
    ("PAGEDOWN", 121),
    ("F1", 122),
    ("LEFT", 123),
    ("RIGHT", 124),
    ("DOWN", 125),
    ("UP", 126),
];

/// Alternative spellings accepted on input only
const KEY_ALIASES: &[(&str, &str)] = &[
    ("ENTER", "RETURN"),
    ("ESC", "ESCAPE"),
    ("BACKSPACE", "DELETE"),
    ("DEL", "FORWARDDELETE"),
];

/// Returns the display name of a key code, if the table knows it
pub fn key_name(key_code: KeyCode) -> Option<&'static str> {
    KEY_NAMES
        .iter()
        .find(|(_, code)| *code == key_code)
        .map(|(name, _)| *name)
}

/// Looks up a key code by (case-insensitive) name
pub fn key_code(name: &str) -> Option<KeyCode> {
    let upper = name.to_uppercase();
    let canonical = KEY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == upper)
        .map(|(_, target)| *target)
        .unwrap_or(upper.as_str());

    KEY_NAMES
        .iter()
        .find(|(key, _)| *key == canonical)
        .map(|(_, code)| *code)
}

/// Maps a modifier token to a `Modifier`
fn modifier_from_name(name: &str) -> Option<Modifier> {
    match name.to_uppercase().as_str() {
        "CMD" | "COMMAND" | "SUPER" => Some(Modifier::Command),
        "OPT" | "OPTION" | "ALT" => Some(Modifier::Option),
        "CTRL" | "CONTROL" => Some(Modifier::Control),
        "SHIFT" => Some(Modifier::Shift),
        "FN" | "FUNCTION" => Some(Modifier::Function),
        _ => None,
    }
}

/// One `+`-separated token, surrounding whitespace stripped
fn token(input: &str) -> IResult<&str, &str> {
    delimited(
        space0,
        take_while1(|c: char| c != '+' && !c.is_whitespace()),
        space0,
    )
    .parse(input)
}

/// `#<decimal>` raw key code
fn raw_key_code(input: &str) -> IResult<&str, KeyCode> {
    all_consuming(preceded(char('#'), map_res(digit1, str::parse::<KeyCode>))).parse(input)
}

/// Parse a shortcut string into a `KeyCombo`
///
/// # Example
/// ```
/// use keytrap::core::parser::parse_shortcut;
/// use keytrap::core::ModifierMask;
///
/// let combo = parse_shortcut("CMD+SHIFT+K").unwrap();
/// assert_eq!(combo.key_code, 40);
/// assert_eq!(combo.modifiers, ModifierMask::COMMAND | ModifierMask::SHIFT);
/// ```
pub fn parse_shortcut(input: &str) -> Result<KeyCombo, ParseError> {
    let (_, tokens) = all_consuming(separated_list1(char('+'), token))
        .parse(input)
        .map_err(|_| ParseError::InvalidSyntax(input.to_string()))?;

    let (key, modifiers) = tokens
        .split_last()
        .ok_or_else(|| ParseError::InvalidSyntax(input.to_string()))?;

    let mut mask = ModifierMask::empty();
    for name in modifiers {
        let modifier =
            modifier_from_name(name).ok_or_else(|| ParseError::UnknownModifier(name.to_string()))?;
        mask |= modifier.mask();
    }

    let code = match raw_key_code(key) {
        Ok((_, code)) => code,
        Err(_) => key_code(key).ok_or_else(|| ParseError::UnknownKey(key.to_string()))?,
    };

    Ok(KeyCombo::new(code, mask))
}
