use parking_lot::Mutex;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::time::Duration;

use crate::core::{
    Action, ActionError, AppId, DaemonAction, DaemonControl, KeyEvent, KeyEventKind, ListId, ModifierMask,
    Platform, Registry, SystemAction, Trigger, TriggerId,
};
use crate::engine::{
    ActionReport, ActionWorker, DaemonState, DispatchOutcome, Dispatcher, Executor,
    StaticFrontApplication,
};

const SPACE: u16 = 49;
const EDITOR: &str = "org.keytrap.editor";

#[derive(Default)]
struct SleepPlatform {
    calls: Mutex<u32>,
}

impl Platform for SleepPlatform {
    fn sleep(&self) -> Result<(), ActionError> {
        *self.calls.lock() += 1;
        Ok(())
    }
}

struct Harness {
    dispatcher: Dispatcher,
    state: Arc<DaemonState>,
    front: Arc<StaticFrontApplication>,
    reports: Receiver<ActionReport>,
    _worker: ActionWorker,
}

impl Harness {
    fn new(registry: Registry) -> Self {
        let state = Arc::new(DaemonState::new(Arc::new(registry), Duration::from_secs(1)));
        let (tx, reports) = channel();
        let executor = Executor::new(Arc::clone(&state), Arc::new(SleepPlatform::default()))
            .with_reports(Box::new(tx));
        let worker = ActionWorker::spawn(executor).unwrap();
        let front = Arc::new(StaticFrontApplication::new(None));
        let dispatcher = Dispatcher::new(Arc::clone(&state), front.clone(), worker.queue(), 8);

        Self {
            dispatcher,
            state,
            front,
            reports,
            _worker: worker,
        }
    }

    fn next_report(&self) -> ActionReport {
        self.reports.recv_timeout(Duration::from_secs(5)).unwrap()
    }
}

fn cmd_space() -> KeyEvent {
    KeyEvent::key_down(SPACE, ModifierMask::COMMAND)
}

/// Cmd+Space → Sleep in global list #1
fn registry(list_enabled: bool) -> Registry {
    let registry = Registry::new();
    registry.add_list(ListId(1), None, list_enabled);
    registry
        .register(
            Trigger::new(TriggerId(1), ListId(1), cmd_space().combo()),
            false,
        )
        .unwrap();
    registry
        .bind(TriggerId(1), Action::system(SystemAction::Sleep))
        .unwrap();
    registry
}

#[test]
fn test_disabled_then_enabled_list() {
    let harness = Harness::new(registry(false));

    // Bound but disabled: consumed, nothing runs
    let outcome = harness.dispatcher.on_key_event(&cmd_space());
    assert_eq!(outcome, DispatchOutcome::Suppressed);
    assert!(outcome.consumes());
    assert!(harness
        .reports
        .recv_timeout(Duration::from_millis(100))
        .is_err());

    harness
        .state
        .registry()
        .set_list_enabled(ListId(1), true)
        .unwrap();

    let outcome = harness.dispatcher.on_key_event(&cmd_space());
    assert_eq!(outcome, DispatchOutcome::Dispatched);

    let report = harness.next_report();
    assert_eq!(report.trigger, TriggerId(1));
    assert_eq!(report.result, Ok(()));
}

#[test]
fn test_unbound_key_is_unhandled() {
    let harness = Harness::new(registry(true));

    let outcome = harness
        .dispatcher
        .on_key_event(&KeyEvent::key_down(SPACE, ModifierMask::OPTION));

    assert_eq!(outcome, DispatchOutcome::Unhandled);
    assert!(!outcome.consumes());
}

#[test]
fn test_only_key_down_dispatches() {
    let harness = Harness::new(registry(true));

    let mut event = cmd_space();
    event.kind = KeyEventKind::KeyUp;
    assert_eq!(harness.dispatcher.on_key_event(&event), DispatchOutcome::Unhandled);

    event.kind = KeyEventKind::FlagsChanged;
    assert_eq!(harness.dispatcher.on_key_event(&event), DispatchOutcome::Unhandled);
}

#[test]
fn test_paused_daemon_passes_keys_through() {
    let harness = Harness::new(registry(true));

    harness.state.set_paused(true);
    assert_eq!(
        harness.dispatcher.on_key_event(&cmd_space()),
        DispatchOutcome::Unhandled
    );

    harness.state.set_paused(false);
    assert_eq!(
        harness.dispatcher.on_key_event(&cmd_space()),
        DispatchOutcome::Dispatched
    );
}

#[test]
fn test_pause_hotkey_resumes_paused_daemon() {
    let registry = registry(true);
    let pause = KeyEvent::key_down(35, ModifierMask::COMMAND | ModifierMask::OPTION);
    registry
        .register(Trigger::new(TriggerId(2), ListId(1), pause.combo()), false)
        .unwrap();
    registry
        .bind(TriggerId(2), Action::daemon(DaemonAction::SwitchStatus))
        .unwrap();
    let harness = Harness::new(registry);

    assert_eq!(harness.dispatcher.on_key_event(&pause), DispatchOutcome::Dispatched);
    assert_eq!(harness.next_report().trigger, TriggerId(2));
    assert!(harness.state.is_paused());

    // Other hotkeys are ignored while paused
    assert_eq!(
        harness.dispatcher.on_key_event(&cmd_space()),
        DispatchOutcome::Unhandled
    );

    assert_eq!(harness.dispatcher.on_key_event(&pause), DispatchOutcome::Dispatched);
    assert_eq!(harness.next_report().trigger, TriggerId(2));
    assert!(!harness.state.is_paused());
    assert_eq!(
        harness.dispatcher.on_key_event(&cmd_space()),
        DispatchOutcome::Dispatched
    );
}

#[test]
fn test_cached_trapping_passes_keys_through() {
    let harness = Harness::new(registry(true));

    harness.state.record_trapping(true);
    assert_eq!(
        harness.dispatcher.on_key_event(&cmd_space()),
        DispatchOutcome::Unhandled
    );

    harness.state.record_trapping(false);
    assert_eq!(
        harness.dispatcher.on_key_event(&cmd_space()),
        DispatchOutcome::Dispatched
    );
}

#[test]
fn test_front_application_override() {
    let registry = registry(true);
    registry.add_application(AppId(1), EDITOR, true);
    registry.add_list(ListId(2), Some(AppId(1)), true);
    registry
        .register(
            Trigger::new(TriggerId(2), ListId(2), cmd_space().combo()),
            false,
        )
        .unwrap();
    registry
        .bind(TriggerId(2), Action::system(SystemAction::Sleep))
        .unwrap();
    let harness = Harness::new(registry);

    harness.front.set(Some(EDITOR));
    harness.dispatcher.on_key_event(&cmd_space());
    assert_eq!(harness.next_report().trigger, TriggerId(2));

    harness.front.set(Some("com.example.other"));
    harness.dispatcher.on_key_event(&cmd_space());
    assert_eq!(harness.next_report().trigger, TriggerId(1));
}

#[test]
fn test_stopped_worker_is_diagnosed() {
    let state = Arc::new(DaemonState::new(Arc::new(registry(true)), Duration::from_secs(1)));
    let worker = ActionWorker::spawn(Executor::new(
        Arc::clone(&state),
        Arc::new(SleepPlatform::default()),
    ))
    .unwrap();
    let queue = worker.queue();
    worker.shutdown();

    let dispatcher = Dispatcher::new(
        state,
        Arc::new(StaticFrontApplication::new(None)),
        queue,
        1,
    );

    // Still consumed: the key is bound
    assert_eq!(dispatcher.on_key_event(&cmd_space()), DispatchOutcome::Dispatched);
    assert_eq!(dispatcher.on_key_event(&cmd_space()), DispatchOutcome::Dispatched);

    // Capacity 1: the second diagnostic was dropped
    let diagnostics = dispatcher.drain_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].trigger, TriggerId(1));
    assert_eq!(diagnostics[0].combo, cmd_space().combo());

    assert!(dispatcher.drain_diagnostics().is_empty());
}
