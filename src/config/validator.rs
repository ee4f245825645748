//! Library-level validation.
//!
//! Runs before every save and on `keytrap check`. Item checks come from
//! `core::validator`; this module adds the cross-references a single item
//! can't see (owning lists, applications, duplicate ids, conflicts) and
//! collects everything into one report.
//!
//! # Example
//! ```
//! use keytrap::config::LibraryValidator;
//! use keytrap::core::Library;
//!
//! let report = LibraryValidator::new().validate(&Library::new());
//! assert!(!report.has_errors());
//! ```

use std::collections::HashSet;

use crate::core::{
    validate_action, validate_trigger, validator::validate_text, ActionKind, DaemonAction,
    Library,
};

/// Validation severity level
///
/// - **Error**: Blocks the save (the library would not load consistently)
/// - **Warning**: Allows the save (e.g. a conflict the registry will skip)
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationLevel {
    Error,
    Warning,
}

/// A single issue found in a library
#[derive(Clone, Debug)]
pub struct ValidationIssue {
    /// What the issue is about, e.g. `trigger #3` or `list 'Mail'`
    pub subject: String,
    pub level: ValidationLevel,
    pub message: String,
}

/// All issues found in one library
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the report contains any Error-level issues
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.level == ValidationLevel::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.level == ValidationLevel::Warning)
    }

    pub fn add_error(&mut self, subject: String, message: String) {
        self.issues.push(ValidationIssue {
            subject,
            level: ValidationLevel::Error,
            message,
        });
    }

    pub fn add_warning(&mut self, subject: String, message: String) {
        self.issues.push(ValidationIssue {
            subject,
            level: ValidationLevel::Warning,
            message,
        });
    }
}

#[derive(Debug, Default)]
pub struct LibraryValidator;

impl LibraryValidator {
    pub fn new() -> Self {
        Self
    }

    /// Checks a whole library
    pub fn validate(&self, library: &Library) -> ValidationReport {
        let mut report = ValidationReport::new();

        self.check_applications(library, &mut report);
        self.check_lists(library, &mut report);
        self.check_triggers(library, &mut report);

        for group in library.find_conflicts() {
            let ids = group
                .triggers
                .iter()
                .map(|id| format!("#{}", id))
                .collect::<Vec<_>>()
                .join(", ");
            report.add_warning(
                format!("{} in {} scope", group.combo, group.scope),
                format!("bound by triggers {}; only the first will be registered", ids),
            );
        }

        report
    }

    fn check_applications(&self, library: &Library, report: &mut ValidationReport) {
        let mut ids = HashSet::new();
        let mut bundles = HashSet::new();

        for app in &library.applications {
            let subject = format!("application #{}", app.id);
            if !ids.insert(app.id) {
                report.add_error(subject.clone(), "duplicate application id".to_string());
            }
            if let Err(e) = validate_text("Bundle identifier", &app.bundle_id, true) {
                report.add_error(subject.clone(), e.to_string());
            }
            if !bundles.insert(app.bundle_id.as_str()) {
                report.add_error(subject, format!("bundle id '{}' is used twice", app.bundle_id));
            }
        }
    }

    fn check_lists(&self, library: &Library, report: &mut ValidationReport) {
        let mut ids = HashSet::new();

        for list in &library.lists {
            let subject = format!("list '{}'", list.name);
            if !ids.insert(list.id) {
                report.add_error(subject.clone(), format!("duplicate list id #{}", list.id));
            }
            if let Err(e) = validate_text("List name", &list.name, true) {
                report.add_error(subject.clone(), e.to_string());
            }
            if let Some(app) = list.application {
                if library.application(app).is_none() {
                    report.add_error(subject.clone(), format!("unknown application #{}", app));
                }
            }

            for entry in &list.entries {
                match library.trigger(entry.trigger) {
                    None => report.add_error(
                        subject.clone(),
                        format!("entry refers to unknown trigger #{}", entry.trigger),
                    ),
                    Some(trigger) if trigger.list != list.id => report.add_error(
                        subject.clone(),
                        format!("trigger #{} belongs to list #{}", trigger.id, trigger.list),
                    ),
                    Some(_) => {}
                }

                if let Err(e) = validate_action(&entry.action) {
                    report.add_error(subject.clone(), e.to_string());
                }
                if let ActionKind::BuiltIn(DaemonAction::SwitchListStatus { list: target }) =
                    &entry.action.kind
                {
                    if library.list(*target).is_none() {
                        report.add_warning(
                            subject.clone(),
                            format!("action toggles unknown list #{}", target),
                        );
                    }
                }
            }
        }
    }

    fn check_triggers(&self, library: &Library, report: &mut ValidationReport) {
        let mut ids = HashSet::new();

        for trigger in &library.triggers {
            let subject = format!("trigger #{}", trigger.id);
            if !ids.insert(trigger.id) {
                report.add_error(subject.clone(), "duplicate trigger id".to_string());
            }
            if let Err(e) = validate_trigger(trigger) {
                report.add_error(subject.clone(), e.to_string());
            }
            if library.list(trigger.list).is_none() {
                report.add_error(subject.clone(), format!("unknown list #{}", trigger.list));
            }
            if library.actions_for(trigger).is_empty() {
                report.add_warning(subject, "no actions bound".to_string());
            }
        }
    }
}
