//! Trigger conflict detection
//!
//! Two kinds of conflict exist:
//! - `Conflict`: returned synchronously by the registry when a trigger is
//!   registered over an identical one without `overwrite`
//! - `ConflictGroup`: reported by `ConflictDetector` when a whole library is
//!   checked offline (the `check` command and the library validator)
//!
//! # Performance
//! - Add trigger: O(1) average case
//! - Check conflict: O(1) average case
//! - List all conflicts: O(n) where n = number of unique (scope, combo) keys

use std::collections::HashMap;
use thiserror::Error;

use crate::core::types::{KeyCombo, Scope, TriggerId};

/// Registration refused: the combo is already registered in this scope
///
/// Carries the conflicting trigger's identity so the caller can offer a
/// replacement (re-register with `overwrite`).
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{combo} is already bound to trigger #{existing} in {scope} scope")]
pub struct Conflict {
    /// Trigger currently holding the combo
    pub existing: TriggerId,
    /// Trigger that was being registered (`None` for a recorded candidate)
    pub candidate: Option<TriggerId>,
    pub combo: KeyCombo,
    pub scope: Scope,
}

/// Detects duplicate triggers using HashMap-based indexing.
///
/// Keys are (scope, combo) pairs; a conflict exists when more than one
/// non-overwriting trigger shares a key.
pub struct ConflictDetector {
    triggers: HashMap<(Scope, KeyCombo), Vec<TriggerId>>,
}

/// All triggers sharing one (scope, combo) key.
#[derive(Clone, Debug, PartialEq)]
pub struct ConflictGroup {
    pub scope: Scope,
    pub combo: KeyCombo,

    /// Always 2 or more, in insertion order
    pub triggers: Vec<TriggerId>,
}

impl ConflictDetector {
    /// Creates a new empty conflict detector.
    pub fn new() -> Self {
        Self {
            triggers: HashMap::new(),
        }
    }

    /// Adds a trigger to the detector.
    ///
    /// An overwriting trigger replaces everything recorded for its key, the
    /// same way the registry would.
    pub fn add_trigger(&mut self, scope: Scope, combo: KeyCombo, id: TriggerId, overwrite: bool) {
        let entry = self.triggers.entry((scope, combo)).or_default();
        if overwrite {
            entry.clear();
        }
        entry.push(id);
    }

    /// Finds all conflicts, sorted by first trigger id for stable output.
    pub fn find_conflicts(&self) -> Vec<ConflictGroup> {
        let mut groups: Vec<ConflictGroup> = self
            .triggers
            .iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|((scope, combo), ids)| ConflictGroup {
                scope: *scope,
                combo: *combo,
                triggers: ids.clone(),
            })
            .collect();
        groups.sort_by_key(|g| g.triggers[0]);
        groups
    }

    /// Checks if a specific key has conflicts.
    pub fn has_conflict(&self, scope: Scope, combo: &KeyCombo) -> bool {
        self.triggers
            .get(&(scope, *combo))
            .map(|ids| ids.len() > 1)
            .unwrap_or(false)
    }

    /// Returns the total number of triggers tracked.
    pub fn total_triggers(&self) -> usize {
        self.triggers.values().map(|v| v.len()).sum()
    }
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::new()
    }
}
