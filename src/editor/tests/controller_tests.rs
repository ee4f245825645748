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

//! Controller tests
//!
//! Tests for the editor controller logic

use std::{fs, path::PathBuf, sync::Arc};
use tempfile::TempDir;

use crate::config::LibraryStore;
use crate::core::{
    Action, KeyCaught, KeyCombo, KeyEvent, Library, ListId, ModifierMask, RegistryError,
    SystemAction, TriggerId,
};
use crate::editor::{EditorController, EditorError};
use crate::trap::{TrapOutcome, TrapSettings, TrappingState};

const SPACE: u16 = 49;
const KEY_A: u16 = 0;

/// Helper: Creates a library with known content
///
/// Global list "Global" (#1): CMD+SPACE → Sleep, OPT+SPACE → Screen saver,
/// plus a duplicate CMD+SPACE → Log out.
fn create_test_library() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("library.json");

    let mut library = Library::new();
    let list = library.add_list("Global", None).unwrap();
    let cmd_space = library
        .add_trigger(list, KeyCombo::new(SPACE, ModifierMask::COMMAND), None, false)
        .unwrap();
    library
        .bind(cmd_space, Action::system(SystemAction::Sleep))
        .unwrap();
    let opt_space = library
        .add_trigger(list, KeyCombo::new(SPACE, ModifierMask::OPTION), None, false)
        .unwrap();
    library
        .bind(opt_space, Action::system(SystemAction::ScreenSaver))
        .unwrap();

    // Conflict: duplicate CMD+SPACE
    let duplicate = library
        .add_trigger(list, KeyCombo::new(SPACE, ModifierMask::COMMAND), None, false)
        .unwrap();
    library
        .bind(duplicate, Action::system(SystemAction::LogOut))
        .unwrap();

    fs::write(&path, serde_json::to_string_pretty(&library).unwrap()).unwrap();
    (temp_dir, path)
}

fn create_controller(path: PathBuf) -> EditorController {
    let store = LibraryStore::open(path).unwrap();
    let controller = EditorController::new(
        store,
        Arc::new(TrappingState::new()),
        1,
        TrapSettings::default(),
    );
    controller.load().unwrap();
    controller
}

#[test]
fn test_load_triggers() {
    let (_temp_dir, path) = create_test_library();
    let controller = create_controller(path);

    assert_eq!(controller.trigger_count(), 3, "Should load 3 triggers");
    assert_eq!(controller.triggers()[0].list_name, "Global");
}

#[test]
fn test_filter_by_action() {
    let (_temp_dir, path) = create_test_library();
    let controller = create_controller(path);

    let filtered = controller.filter_triggers("screen saver");
    assert_eq!(filtered.len(), 1, "Should find 1 trigger running the screen saver");
    assert_eq!(filtered[0].trigger.combo.modifiers, ModifierMask::OPTION);
}

#[test]
fn test_filter_by_shortcut_text() {
    let (_temp_dir, path) = create_test_library();
    let controller = create_controller(path);

    let combo = KeyCombo::new(SPACE, ModifierMask::COMMAND).to_string();
    let filtered = controller.filter_triggers(&combo);
    assert_eq!(filtered.len(), 2, "Should find both CMD+SPACE triggers");
}

#[test]
fn test_filter_empty_query() {
    let (_temp_dir, path) = create_test_library();
    let controller = create_controller(path);

    assert_eq!(controller.filter_triggers("  ").len(), 3);
}

#[test]
fn test_detect_conflicts() {
    let (_temp_dir, path) = create_test_library();
    let controller = create_controller(path);

    let conflicts = controller.conflicts();
    assert_eq!(conflicts.len(), 1, "Should detect 1 conflict (CMD+SPACE used twice)");
    assert_eq!(conflicts[0].triggers, vec![TriggerId(1), TriggerId(3)]);
    assert_eq!(controller.conflict_count(), 1);
}

#[test]
fn test_add_trigger_refuses_taken_shortcut() {
    let (_temp_dir, path) = create_test_library();
    let controller = create_controller(path);

    let err = controller
        .add_trigger(ListId(1), KeyCombo::new(SPACE, ModifierMask::OPTION), None)
        .unwrap_err();
    match err {
        EditorError::Registry(RegistryError::Conflict(conflict)) => {
            assert_eq!(conflict.existing, TriggerId(2));
        }
        other => panic!("Expected Conflict, got {:?}", other),
    }

    // Same shortcut in an application list is fine
    let app = controller.add_application("com.example.browser", "Browser").unwrap();
    let list = controller.add_list("Browser", Some(app)).unwrap();
    assert!(controller
        .add_trigger(list, KeyCombo::new(SPACE, ModifierMask::OPTION), None)
        .is_ok());
}

#[test]
fn test_invalid_edits_are_rejected() {
    let (_temp_dir, path) = create_test_library();
    let controller = create_controller(path);

    assert!(matches!(
        controller.add_list("", None),
        Err(EditorError::Invalid(_))
    ));
    assert!(matches!(
        controller.bind(TriggerId(1), Action::menu("", "Close")),
        Err(EditorError::Invalid(_))
    ));
    assert!(matches!(
        controller.bind(TriggerId(42), Action::system(SystemAction::Sleep)),
        Err(EditorError::Library(_))
    ));
    assert!(matches!(
        controller.start_recording(ListId(42)),
        Err(EditorError::Library(_))
    ));
}

#[test]
fn test_recording_adds_trigger() {
    let (_temp_dir, path) = create_test_library();
    let controller = create_controller(path);
    let caught = controller.subscribe();

    controller.start_recording(ListId(1)).unwrap();
    assert!(controller.is_recording());
    assert!(controller.trapping_state().is_trapping());

    let event = KeyEvent::key_down(KEY_A, ModifierMask::empty()).with_character(b'a' as u16);
    let recorded = controller.handle_key_event(&event).unwrap();

    let expected = KeyCaught {
        key_code: KEY_A,
        modifier_mask: 0,
        character_code: b'a' as u16,
    };
    assert_eq!(recorded.outcome, TrapOutcome::Caught(expected));
    assert_eq!(recorded.trigger, Some(TriggerId(4)));
    assert_eq!(caught.try_recv().unwrap(), expected);

    assert!(!controller.is_recording());
    assert!(!controller.trapping_state().is_trapping());
    assert_eq!(controller.trigger_count(), 4);
}

#[test]
fn test_recording_taken_shortcut_is_a_conflict() {
    let (_temp_dir, path) = create_test_library();
    let controller = create_controller(path);

    controller.start_recording(ListId(1)).unwrap();
    let recorded = controller
        .handle_key_event(&KeyEvent::key_down(SPACE, ModifierMask::OPTION))
        .unwrap();

    assert!(matches!(recorded.outcome, TrapOutcome::Conflict(_)));
    assert_eq!(recorded.trigger, None);
    assert_eq!(controller.trigger_count(), 3);
}

#[test]
fn test_forwarded_hotkey_is_recorded() {
    let (_temp_dir, path) = create_test_library();
    let controller = create_controller(path);

    controller.start_recording(ListId(1)).unwrap();
    let recorded = controller
        .handle_caught(KeyCaught {
            key_code: SPACE,
            modifier_mask: ModifierMask::OPTION.bits(),
            character_code: 0,
        })
        .unwrap();

    assert!(matches!(recorded.outcome, TrapOutcome::Caught(_)));
    assert!(recorded.trigger.is_some());
}

#[test]
fn test_cancel_recording() {
    let (_temp_dir, path) = create_test_library();
    let controller = create_controller(path);

    controller.start_recording(ListId(1)).unwrap();
    controller.cancel_recording();

    assert!(!controller.is_recording());
    let recorded = controller
        .handle_key_event(&KeyEvent::key_down(KEY_A, ModifierMask::empty()))
        .unwrap();
    assert_eq!(recorded.outcome, TrapOutcome::NotTrapping);
}

#[test]
fn test_save_round_trip() {
    let (_temp_dir, path) = create_test_library();
    let controller = create_controller(path.clone());

    controller.set_list_enabled(ListId(1), false).unwrap();
    controller.remove_trigger(TriggerId(3)).unwrap();
    let backup = controller.save().unwrap();
    assert!(backup.exists(), "Save should leave a backup");

    let reloaded = create_controller(path);
    assert_eq!(reloaded.trigger_count(), 2);
    assert!(!reloaded.library().lists[0].enabled);
}
