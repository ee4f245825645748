use std::sync::Arc;
use std::thread;

use crate::core::types::AppId;
use crate::core::{
    Action, DaemonAction, KeyCombo, Library, ListId, ModifierMask, Registry, RegistryError, Scope,
    Trigger, TriggerId,
};

const SPACE: u16 = 49;

fn cmd(key_code: u16) -> KeyCombo {
    KeyCombo::new(key_code, ModifierMask::COMMAND)
}

/// Registry with one enabled global list (#1)
fn global_registry() -> Registry {
    let registry = Registry::new();
    registry.add_list(ListId(1), None, true);
    registry
}

#[test]
fn test_register_and_lookup() {
    let registry = global_registry();
    registry
        .register(Trigger::new(TriggerId(1), ListId(1), cmd(SPACE)), false)
        .unwrap();

    assert!(registry.is_registered(TriggerId(1)));
    assert_eq!(registry.len(), 1);

    let hit = registry.lookup(Scope::Global, cmd(SPACE)).unwrap();
    assert_eq!(hit.trigger.id, TriggerId(1));
    assert!(registry.lookup(Scope::Global, cmd(0)).is_none());
}

#[test]
fn test_duplicate_combo_is_a_conflict() {
    let registry = global_registry();
    registry
        .register(Trigger::new(TriggerId(1), ListId(1), cmd(SPACE)), false)
        .unwrap();

    let err = registry
        .register(Trigger::new(TriggerId(2), ListId(1), cmd(SPACE)), false)
        .unwrap_err();

    match err {
        RegistryError::Conflict(conflict) => {
            assert_eq!(conflict.existing, TriggerId(1));
            assert_eq!(conflict.candidate, Some(TriggerId(2)));
            assert_eq!(conflict.scope, Scope::Global);
        }
        other => panic!("Expected Conflict, got {:?}", other),
    }

    // The original holder is untouched
    assert_eq!(
        registry.lookup(Scope::Global, cmd(SPACE)).unwrap().trigger.id,
        TriggerId(1)
    );
    assert!(!registry.is_registered(TriggerId(2)));
}

#[test]
fn test_overwrite_replaces_holder() {
    let registry = global_registry();
    registry
        .register(Trigger::new(TriggerId(1), ListId(1), cmd(SPACE)), false)
        .unwrap();
    registry
        .register(Trigger::new(TriggerId(2), ListId(1), cmd(SPACE)), true)
        .unwrap();

    assert!(!registry.is_registered(TriggerId(1)));
    assert_eq!(
        registry.lookup(Scope::Global, cmd(SPACE)).unwrap().trigger.id,
        TriggerId(2)
    );
}

#[test]
fn test_trigger_overwrite_flag_counts_as_overwrite() {
    let registry = global_registry();
    registry
        .register(Trigger::new(TriggerId(1), ListId(1), cmd(SPACE)), false)
        .unwrap();

    let replacement = Trigger::new(TriggerId(2), ListId(1), cmd(SPACE)).with_overwrite(true);
    assert!(registry.register(replacement, false).is_ok());
}

#[test]
fn test_unknown_list_is_rejected() {
    let registry = Registry::new();
    let err = registry
        .register(Trigger::new(TriggerId(1), ListId(9), cmd(SPACE)), false)
        .unwrap_err();

    assert_eq!(err, RegistryError::UnknownList(ListId(9)));
}

#[test]
fn test_reregistering_keeps_actions() {
    let registry = global_registry();
    registry
        .register(Trigger::new(TriggerId(1), ListId(1), cmd(SPACE)), false)
        .unwrap();
    registry
        .bind(TriggerId(1), Action::daemon(DaemonAction::LaunchEditor))
        .unwrap();

    // Same id, new combo
    registry
        .register(Trigger::new(TriggerId(1), ListId(1), cmd(40)), false)
        .unwrap();

    assert!(registry.lookup(Scope::Global, cmd(SPACE)).is_none());
    let moved = registry.lookup(Scope::Global, cmd(40)).unwrap();
    assert_eq!(moved.actions.len(), 1);
}

#[test]
fn test_unregister() {
    let registry = global_registry();
    registry
        .register(Trigger::new(TriggerId(1), ListId(1), cmd(SPACE)), false)
        .unwrap();

    assert!(registry.unregister(TriggerId(1)));
    assert!(!registry.unregister(TriggerId(1)));
    assert!(registry.find(SPACE, ModifierMask::COMMAND, None).is_none());
}

#[test]
fn test_application_override_wins() {
    let registry = Registry::new();
    registry.add_application(AppId(1), "com.example.mail", true);
    registry.add_list(ListId(1), None, true);
    registry.add_list(ListId(2), Some(AppId(1)), true);

    registry
        .register(Trigger::new(TriggerId(1), ListId(1), cmd(SPACE)), false)
        .unwrap();
    // Same combo in another scope is not a conflict
    registry
        .register(Trigger::new(TriggerId(2), ListId(2), cmd(SPACE)), false)
        .unwrap();

    let in_mail = registry
        .find(SPACE, ModifierMask::COMMAND, Some("com.example.mail"))
        .unwrap();
    assert_eq!(in_mail.trigger.trigger.id, TriggerId(2));

    let elsewhere = registry
        .find(SPACE, ModifierMask::COMMAND, Some("com.example.other"))
        .unwrap();
    assert_eq!(elsewhere.trigger.trigger.id, TriggerId(1));

    // Disabling the application falls back to the global trigger
    assert!(registry.set_application_enabled("com.example.mail", false));
    let disabled = registry
        .find(SPACE, ModifierMask::COMMAND, Some("com.example.mail"))
        .unwrap();
    assert_eq!(disabled.trigger.trigger.id, TriggerId(1));
}

#[test]
fn test_disabled_list_resolves_but_is_marked() {
    let registry = global_registry();
    registry
        .register(Trigger::new(TriggerId(1), ListId(1), cmd(SPACE)), false)
        .unwrap();
    registry.set_list_enabled(ListId(1), false).unwrap();

    let hit = registry.find(SPACE, ModifierMask::COMMAND, None).unwrap();
    assert!(!hit.list_enabled);

    assert_eq!(registry.toggle_list(ListId(1)), Ok(true));
    assert!(registry.find(SPACE, ModifierMask::COMMAND, None).unwrap().list_enabled);
}

#[test]
fn test_disabled_app_list_falls_back_to_enabled_global() {
    let registry = Registry::new();
    registry.add_application(AppId(1), "com.example.mail", true);
    registry.add_list(ListId(1), None, true);
    registry.add_list(ListId(2), Some(AppId(1)), false);
    registry
        .register(Trigger::new(TriggerId(1), ListId(1), cmd(SPACE)), false)
        .unwrap();
    registry
        .register(Trigger::new(TriggerId(2), ListId(2), cmd(SPACE)), false)
        .unwrap();

    let hit = registry
        .find(SPACE, ModifierMask::COMMAND, Some("com.example.mail"))
        .unwrap();
    assert_eq!(hit.trigger.trigger.id, TriggerId(1));
    assert!(hit.list_enabled);
}

#[test]
fn test_actions_to_run_respects_has_many_action() {
    let registry = global_registry();
    registry
        .register(Trigger::new(TriggerId(1), ListId(1), cmd(SPACE)), false)
        .unwrap();
    registry
        .bind(TriggerId(1), Action::daemon(DaemonAction::LaunchEditor))
        .unwrap();

    let single = registry.lookup(Scope::Global, cmd(SPACE)).unwrap();
    assert!(!single.trigger.has_many_action);
    assert_eq!(single.actions_to_run().len(), 1);

    // A second binding turns on has_many_action by itself
    registry
        .bind(TriggerId(1), Action::daemon(DaemonAction::SwitchStatus))
        .unwrap();
    let many = registry.lookup(Scope::Global, cmd(SPACE)).unwrap();
    assert!(many.trigger.has_many_action);
    assert_eq!(many.actions_to_run().len(), 2);

    registry.set_has_many_action(TriggerId(1), false).unwrap();
    let first_only = registry.lookup(Scope::Global, cmd(SPACE)).unwrap();
    assert_eq!(first_only.actions_to_run().len(), 1);

    // Snapshots already handed out are not affected
    assert_eq!(single.actions_to_run().len(), 1);
    assert_eq!(many.actions_to_run().len(), 2);
}

#[test]
fn test_switches_status_only_for_actions_that_run() {
    let registry = global_registry();
    registry
        .register(Trigger::new(TriggerId(1), ListId(1), cmd(SPACE)), false)
        .unwrap();
    registry
        .bind(TriggerId(1), Action::daemon(DaemonAction::LaunchEditor))
        .unwrap();
    assert!(!registry.lookup(Scope::Global, cmd(SPACE)).unwrap().switches_status());

    registry
        .bind(TriggerId(1), Action::daemon(DaemonAction::SwitchStatus))
        .unwrap();
    assert!(registry.lookup(Scope::Global, cmd(SPACE)).unwrap().switches_status());

    registry.set_has_many_action(TriggerId(1), false).unwrap();
    assert!(!registry.lookup(Scope::Global, cmd(SPACE)).unwrap().switches_status());
}

#[test]
fn test_bind_unknown_trigger() {
    let registry = global_registry();
    assert_eq!(
        registry.bind(TriggerId(7), Action::daemon(DaemonAction::LaunchEditor)),
        Err(RegistryError::NotRegistered(TriggerId(7)))
    );
}

#[test]
fn test_remove_list_unregisters_its_triggers() {
    let registry = global_registry();
    registry.add_list(ListId(2), None, true);
    registry
        .register(Trigger::new(TriggerId(1), ListId(1), cmd(SPACE)), false)
        .unwrap();
    registry
        .register(Trigger::new(TriggerId(2), ListId(2), cmd(40)), false)
        .unwrap();

    registry.remove_list(ListId(1)).unwrap();

    assert!(!registry.is_registered(TriggerId(1)));
    assert!(registry.is_registered(TriggerId(2)));
    assert!(registry.remove_list(ListId(1)).is_err());
}

#[test]
fn test_from_library_reports_conflicts() {
    let mut library = Library::new();
    let list = library.add_list("Global", None).unwrap();
    let first = library.add_trigger(list, cmd(SPACE), None, false).unwrap();
    library.add_trigger(list, cmd(SPACE), None, false).unwrap();
    library
        .bind(first, Action::daemon(DaemonAction::LaunchEditor))
        .unwrap();

    let (registry, conflicts) = Registry::from_library(&library);

    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].existing, first);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.triggers()[0].actions.len(), 1);
}

#[test]
fn test_enabled_list_wins_over_earlier_disabled_duplicate() {
    let mut library = Library::new();
    let dormant = library.add_list("Old", None).unwrap();
    let live = library.add_list("Current", None).unwrap();
    library.set_list_enabled(dormant, false).unwrap();
    let shadowed = library.add_trigger(dormant, cmd(SPACE), None, false).unwrap();
    let wanted = library.add_trigger(live, cmd(SPACE), None, false).unwrap();

    let (registry, conflicts) = Registry::from_library(&library);

    let hit = registry.find(SPACE, ModifierMask::COMMAND, None).unwrap();
    assert_eq!(hit.trigger.trigger.id, wanted);
    assert!(hit.list_enabled);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].existing, wanted);
    assert_eq!(conflicts[0].candidate, Some(shadowed));
}

#[test]
fn test_concurrent_readers_see_whole_snapshots() {
    let registry = Arc::new(global_registry());
    registry
        .register(Trigger::new(TriggerId(1), ListId(1), cmd(SPACE)), false)
        .unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..1000 {
                    // Either trigger may hold the combo, but never none
                    let hit = registry.find(SPACE, ModifierMask::COMMAND, None);
                    assert!(hit.is_some());
                }
            })
        })
        .collect();

    for id in 2..50 {
        registry
            .register(Trigger::new(TriggerId(id), ListId(1), cmd(SPACE)), true)
            .unwrap();
    }

    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(registry.len(), 1);
}
