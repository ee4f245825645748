//! Editor controller - mediates between the persisted library and the view
//!
//! # Responsibilities
//!
//! - Load and save the library through `LibraryStore`
//! - Filter/search triggers for display
//! - Report conflicts before they reach the daemon
//! - Validate edits (actions, triggers) before applying them
//! - Drive shortcut recording through a `TrapRecorder`
//!
//! # Architecture
//!
//! The controller owns a preview `Registry` mirrored from the library after
//! every edit. Recording verifies captured shortcuts against it, so the
//! editor rejects a shortcut the daemon would refuse.
//!
//! The view is single-threaded, so state sits in `RefCell`s and every method
//! takes `&self`.

use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ConfigError, LibraryStore};
use crate::core::{
    validate_action, validate_trigger, Action, AppId, Conflict, ConflictGroup, KeyCaught, KeyCombo,
    KeyEvent, Library, LibraryError, ListId, Registry, RegistryError, Scope, Trigger, TriggerId,
    ValidationError,
};
use crate::core::validator::validate_text;
use crate::trap::{TrapOutcome, TrapRecorder, TrapSettings, TrappingState};

/// Edits the controller refused
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Invalid input: {0}")]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What recording produced
#[derive(Clone, Debug, PartialEq)]
pub struct Recorded {
    pub outcome: TrapOutcome,
    /// Trigger created from a caught shortcut
    pub trigger: Option<TriggerId>,
}

/// A trigger with the data the view shows next to it
#[derive(Clone, Debug)]
pub struct TriggerRow {
    pub trigger: Trigger,
    pub list_name: String,
    pub list_enabled: bool,
    pub actions: Vec<Action>,
}

pub struct EditorController {
    store: LibraryStore,
    library: RefCell<Library>,
    /// Mirror of `library` used to verify recorded shortcuts
    preview: Registry,
    trapping: Arc<TrappingState>,
    recorder: RefCell<TrapRecorder>,
    /// List a recorded shortcut is added to
    target: RefCell<Option<ListId>>,
}

impl EditorController {
    /// Creates a controller for `store`; call `load` before use
    ///
    /// `window` identifies this editor window in `TrappingState`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use keytrap::config::LibraryStore;
    /// use keytrap::editor::EditorController;
    /// use keytrap::trap::{TrapSettings, TrappingState};
    /// use std::path::PathBuf;
    /// use std::sync::Arc;
    ///
    /// let store = LibraryStore::open(PathBuf::from("library.json"))?;
    /// let controller = EditorController::new(store, Arc::new(TrappingState::new()), 1, TrapSettings::default());
    /// let count = controller.load()?;
    /// println!("Loaded {} triggers", count);
    /// # Ok::<(), keytrap::editor::EditorError>(())
    /// ```
    pub fn new(
        store: LibraryStore,
        trapping: Arc<TrappingState>,
        window: u64,
        settings: TrapSettings,
    ) -> Self {
        let recorder = TrapRecorder::new(Arc::clone(&trapping), window, settings);
        Self {
            store,
            library: RefCell::new(Library::new()),
            preview: Registry::new(),
            trapping,
            recorder: RefCell::new(recorder),
            target: RefCell::new(None),
        }
    }

    /// Reads the library from disk and rebuilds the preview registry
    ///
    /// Returns the number of triggers loaded.
    pub fn load(&self) -> Result<usize, ConfigError> {
        let library = self.store.read_library()?;
        let count = library.triggers.len();
        *self.library.borrow_mut() = library;
        self.refresh_preview();
        info!(count, "library loaded into editor");
        Ok(count)
    }

    /// Validates and writes the library; returns the backup path
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let backup = self.store.save(&self.library.borrow())?;
        info!(backup = %backup.display(), "library saved");
        Ok(backup)
    }

    /// Copy of the current library
    pub fn library(&self) -> Library {
        self.library.borrow().clone()
    }

    /// Shared flag for this editor's `IpcServer`
    pub fn trapping_state(&self) -> Arc<TrappingState> {
        Arc::clone(&self.trapping)
    }

    fn refresh_preview(&self) {
        let conflicts = self.preview.replace_from(&self.library.borrow());
        if !conflicts.is_empty() {
            debug!(count = conflicts.len(), "library has conflicting triggers");
        }
    }

    /// Every trigger, in library order
    pub fn triggers(&self) -> Vec<TriggerRow> {
        let library = self.library.borrow();
        library
            .triggers
            .iter()
            .map(|trigger| {
                let list = library.list(trigger.list);
                TriggerRow {
                    trigger: trigger.clone(),
                    list_name: list.map(|l| l.name.clone()).unwrap_or_default(),
                    list_enabled: list.is_some_and(|l| l.enabled),
                    actions: library.actions_for(trigger),
                }
            })
            .collect()
    }

    /// Filters triggers by search query
    ///
    /// Searches the shortcut text (e.g. "CMD+SPACE"), the list name and the
    /// action descriptions, case-insensitively. An empty query returns all.
    pub fn filter_triggers(&self, query: &str) -> Vec<TriggerRow> {
        if query.trim().is_empty() {
            return self.triggers();
        }

        let query = query.to_lowercase();
        self.triggers()
            .into_iter()
            .filter(|row| {
                row.trigger.combo.to_string().to_lowercase().contains(&query)
                    || row.list_name.to_lowercase().contains(&query)
                    || row
                        .actions
                        .iter()
                        .any(|a| a.description().to_lowercase().contains(&query))
            })
            .collect()
    }

    pub fn conflicts(&self) -> Vec<ConflictGroup> {
        self.library.borrow().find_conflicts()
    }

    pub fn trigger_count(&self) -> usize {
        self.library.borrow().triggers.len()
    }

    pub fn conflict_count(&self) -> usize {
        self.conflicts().len()
    }

    pub fn add_application(&self, bundle_id: &str, name: &str) -> Result<AppId, EditorError> {
        validate_text("bundle identifier", bundle_id, true)?;
        let id = self.library.borrow_mut().add_application(bundle_id, name);
        self.refresh_preview();
        Ok(id)
    }

    pub fn add_list(&self, name: &str, application: Option<AppId>) -> Result<ListId, EditorError> {
        validate_text("list name", name, true)?;
        let id = self.library.borrow_mut().add_list(name, application)?;
        self.refresh_preview();
        Ok(id)
    }

    pub fn set_list_enabled(&self, list: ListId, enabled: bool) -> Result<(), EditorError> {
        self.library.borrow_mut().set_list_enabled(list, enabled)?;
        self.refresh_preview();
        Ok(())
    }

    /// Adds a shortcut to `list`, refusing one already taken in its scope
    pub fn add_trigger(
        &self,
        list: ListId,
        combo: KeyCombo,
        character: Option<u16>,
    ) -> Result<TriggerId, EditorError> {
        let scope = self.scope_of(list)?;
        if let Some(existing) = self.preview.lookup(scope, combo) {
            return Err(RegistryError::Conflict(Conflict {
                existing: existing.trigger.id,
                candidate: None,
                combo,
                scope,
            })
            .into());
        }

        let mut candidate = Trigger::new(TriggerId(0), list, combo);
        candidate.character = character;
        validate_trigger(&candidate)?;

        let id = self
            .library
            .borrow_mut()
            .add_trigger(list, combo, character, false)?;
        self.refresh_preview();
        Ok(id)
    }

    /// Validates and binds `action` to `trigger`
    pub fn bind(&self, trigger: TriggerId, action: Action) -> Result<(), EditorError> {
        validate_action(&action)?;
        self.library.borrow_mut().bind(trigger, action)?;
        self.refresh_preview();
        Ok(())
    }

    pub fn remove_trigger(&self, trigger: TriggerId) -> Result<(), EditorError> {
        self.library.borrow_mut().remove_trigger(trigger)?;
        self.refresh_preview();
        Ok(())
    }

    fn scope_of(&self, list: ListId) -> Result<Scope, EditorError> {
        self.library
            .borrow()
            .scope_of(list)
            .ok_or(EditorError::Library(LibraryError::UnknownList(list)))
    }

    /// Starts recording a shortcut for `list`
    pub fn start_recording(&self, list: ListId) -> Result<(), EditorError> {
        self.scope_of(list)?;
        *self.target.borrow_mut() = Some(list);
        self.recorder.borrow_mut().set_trapping(true);
        Ok(())
    }

    pub fn cancel_recording(&self) {
        self.recorder.borrow_mut().set_trapping(false);
        *self.target.borrow_mut() = None;
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.borrow().is_trapping()
    }

    /// Notified once per captured shortcut
    pub fn subscribe(&self) -> Receiver<KeyCaught> {
        self.recorder.borrow_mut().subscribe()
    }

    /// Offers a key event from the editor window to the recorder
    ///
    /// A caught shortcut becomes a new trigger in the recording list.
    pub fn handle_key_event(&self, event: &KeyEvent) -> Result<Recorded, EditorError> {
        let scope = match *self.target.borrow() {
            Some(list) => self.scope_of(list)?,
            None => Scope::Global,
        };
        let outcome = self
            .recorder
            .borrow_mut()
            .handle_key_event(event, &self.preview, scope);
        self.finish_recording(outcome)
    }

    /// Records a hotkey the daemon swallowed and forwarded over IPC
    pub fn handle_caught(&self, caught: KeyCaught) -> Result<Recorded, EditorError> {
        let outcome = self.recorder.borrow_mut().handle_caught(caught);
        self.finish_recording(outcome)
    }

    fn finish_recording(&self, outcome: TrapOutcome) -> Result<Recorded, EditorError> {
        let trigger = match &outcome {
            TrapOutcome::Caught(caught) => match self.target.borrow_mut().take() {
                Some(list) => Some(self.add_recorded(list, caught)?),
                None => None,
            },
            TrapOutcome::Conflict(_) | TrapOutcome::Rejected(_) => {
                *self.target.borrow_mut() = None;
                None
            }
            _ => None,
        };
        Ok(Recorded { outcome, trigger })
    }

    /// Adds a recorded shortcut without the scope check
    ///
    /// Forwarded hotkeys are registered by definition, so they may collide
    /// with an existing trigger; the library validator reports that on save.
    fn add_recorded(&self, list: ListId, caught: &KeyCaught) -> Result<TriggerId, EditorError> {
        let id = self
            .library
            .borrow_mut()
            .add_trigger(list, caught.combo(), caught.character(), false)?;
        self.refresh_preview();
        info!(trigger = %id, combo = %caught.combo(), "shortcut recorded");
        Ok(id)
    }
}
