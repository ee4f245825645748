use crate::config::{LibraryValidator, ValidationLevel};
use crate::core::{
    Action, DaemonAction, Entry, KeyCombo, Library, ListId, ModifierMask, TriggerId,
    INVALID_KEY_CODE,
};
use crate::core::types::AppId;

fn cmd(key_code: u16) -> KeyCombo {
    KeyCombo::new(key_code, ModifierMask::COMMAND)
}

/// Helper: library with one list, one trigger, one action
fn valid_library() -> Library {
    let mut library = Library::new();
    let list = library.add_list("Global", None).unwrap();
    let trigger = library.add_trigger(list, cmd(0), None, false).unwrap();
    library
        .bind(trigger, Action::daemon(DaemonAction::LaunchEditor))
        .unwrap();
    library
}

#[test]
fn test_empty_library_is_valid() {
    let report = LibraryValidator::new().validate(&Library::new());
    assert!(report.issues.is_empty());
}

#[test]
fn test_valid_library_has_no_issues() {
    let report = LibraryValidator::new().validate(&valid_library());
    assert!(!report.has_errors());
    assert_eq!(report.warnings().count(), 0);
}

#[test]
fn test_invalid_key_code_is_error() {
    let mut library = valid_library();
    library.triggers[0].combo = KeyCombo::new(INVALID_KEY_CODE, ModifierMask::empty());

    let report = LibraryValidator::new().validate(&library);
    assert!(report.has_errors());
    assert_eq!(report.errors().next().unwrap().subject, "trigger #1");
}

#[test]
fn test_unknown_application_is_error() {
    let mut library = valid_library();
    library.lists[0].application = Some(AppId(9));

    let report = LibraryValidator::new().validate(&library);
    assert!(report
        .errors()
        .any(|issue| issue.message.contains("unknown application #9")));
}

#[test]
fn test_foreign_entry_is_error() {
    let mut library = valid_library();
    let other = library.add_list("Other", None).unwrap();
    library.list_mut(other).unwrap().entries.push(Entry {
        trigger: TriggerId(1),
        action: Action::menu("File", "Save"),
    });

    let report = LibraryValidator::new().validate(&library);
    assert!(report
        .errors()
        .any(|issue| issue.message.contains("belongs to list #1")));
}

#[test]
fn test_bad_action_is_error() {
    let mut library = valid_library();
    library.lists[0].entries[0].action = Action::plugin("no dots", serde_json::Value::Null);

    let report = LibraryValidator::new().validate(&library);
    assert!(report.has_errors());
}

#[test]
fn test_duplicate_list_ids_are_errors() {
    let mut library = valid_library();
    let mut copy = library.lists[0].clone();
    copy.entries.clear();
    library.lists.push(copy);

    let report = LibraryValidator::new().validate(&library);
    assert!(report
        .errors()
        .any(|issue| issue.message.contains("duplicate list id")));
}

#[test]
fn test_conflicts_are_warnings() {
    let mut library = valid_library();
    let second = library.add_trigger(ListId(1), cmd(0), None, false).unwrap();
    library
        .bind(second, Action::daemon(DaemonAction::SwitchStatus))
        .unwrap();

    let report = LibraryValidator::new().validate(&library);
    assert!(!report.has_errors());

    let warnings: Vec<_> = report.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].level, ValidationLevel::Warning);
    assert!(warnings[0].message.contains("#1, #2"));
}

#[test]
fn test_toggle_of_unknown_list_is_warning() {
    let mut library = valid_library();
    library
        .bind(
            TriggerId(1),
            Action::daemon(DaemonAction::SwitchListStatus { list: ListId(5) }),
        )
        .unwrap();

    let report = LibraryValidator::new().validate(&library);
    assert!(!report.has_errors());
    assert!(report
        .warnings()
        .any(|issue| issue.message.contains("unknown list #5")));
}

#[test]
fn test_unbound_trigger_is_warning() {
    let mut library = valid_library();
    library.add_trigger(ListId(1), cmd(1), None, false).unwrap();

    let report = LibraryValidator::new().validate(&library);
    assert!(!report.has_errors());
    assert!(report
        .warnings()
        .any(|issue| issue.subject == "trigger #2" && issue.message == "no actions bound"));
}
