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

//! Action worker
//!
//! Runs matched triggers off the event path. One dedicated thread receives
//! `DispatchJob`s over an mpsc channel and, for each job:
//! 1. Asks the `TrappingProbe` whether the editor is recording (fails open);
//!    if it is, the swallowed key is forwarded to the editor instead
//! 2. Runs the trigger's actions in list order, or its callback if it has none
//! 3. Reports every action's result to the `ReportSink`
//!
//! A failing or panicking action never stops its siblings or the thread.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

use crate::core::{
    Action, ActionContext, ActionError, KeyCaught, KeyEvent, NoPlugins, Platform, PluginHost,
    RegisteredTrigger, Trigger, TriggerId,
};
use crate::engine::state::DaemonState;
use crate::ipc::IpcError;

/// Matched work handed from the dispatcher to the worker
#[derive(Clone, Debug)]
pub struct DispatchJob {
    pub trigger: Arc<RegisteredTrigger>,
    pub event: KeyEvent,
}

/// Outcome of one action (or callback) run
#[derive(Clone, Debug, PartialEq)]
pub struct ActionReport {
    pub trigger: TriggerId,
    /// Action description, or `"callback"`
    pub action: String,
    pub result: Result<(), ActionError>,
}

/// Observes each action run
pub trait TriggerHooks: Send {
    fn will_trigger(&self, _trigger: &Trigger, _action: &Action) {}

    fn did_trigger(&self, _trigger: &Trigger, _action: &Action, _result: &Result<(), ActionError>) {}
}

/// Asks the user before a confirm-required action runs
pub trait Confirmer: Send {
    fn confirm(&self, trigger: &Trigger, action: &Action) -> bool;
}

/// Receives action results
pub trait ReportSink: Send {
    fn report(&self, report: ActionReport);
}

/// Logs failures with `warn!` and successes with `debug!`
pub struct LogReportSink;

impl ReportSink for LogReportSink {
    fn report(&self, report: ActionReport) {
        match &report.result {
            Ok(()) => debug!(trigger = %report.trigger, action = %report.action, "action completed"),
            Err(e) => warn!(trigger = %report.trigger, action = %report.action, error = %e, "action failed"),
        }
    }
}

impl ReportSink for Sender<ActionReport> {
    fn report(&self, report: ActionReport) {
        // Receiver gone means nobody is listening
        let _ = self.send(report);
    }
}

/// Asks whether the editor is currently recording a shortcut
pub trait TrappingProbe: Send {
    fn is_trapping(&mut self) -> Result<bool, IpcError>;

    /// Hands a hotkey the daemon swallowed to the recording editor
    fn forward(&mut self, caught: KeyCaught) -> Result<(), IpcError>;
}

enum WorkerCommand {
    Run(DispatchJob),
    Stop,
}

/// Sending half of the worker's queue
#[derive(Clone)]
pub struct JobQueue {
    tx: Sender<WorkerCommand>,
}

impl JobQueue {
    /// Enqueues a job; false if the worker is gone
    pub fn submit(&self, job: DispatchJob) -> bool {
        self.tx.send(WorkerCommand::Run(job)).is_ok()
    }
}

/// Everything the worker needs to run actions
pub struct Executor {
    state: Arc<DaemonState>,
    platform: Arc<dyn Platform>,
    plugins: Arc<dyn PluginHost>,
    reports: Box<dyn ReportSink>,
    hooks: Option<Box<dyn TriggerHooks>>,
    confirmer: Option<Box<dyn Confirmer>>,
    probe: Option<Box<dyn TrappingProbe>>,
}

impl Executor {
    pub fn new(state: Arc<DaemonState>, platform: Arc<dyn Platform>) -> Self {
        Self {
            state,
            platform,
            plugins: Arc::new(NoPlugins),
            reports: Box::new(LogReportSink),
            hooks: None,
            confirmer: None,
            probe: None,
        }
    }

    pub fn with_plugins(mut self, plugins: Arc<dyn PluginHost>) -> Self {
        self.plugins = plugins;
        self
    }

    pub fn with_reports(mut self, reports: Box<dyn ReportSink>) -> Self {
        self.reports = reports;
        self
    }

    pub fn with_hooks(mut self, hooks: Box<dyn TriggerHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn with_confirmer(mut self, confirmer: Box<dyn Confirmer>) -> Self {
        self.confirmer = Some(confirmer);
        self
    }

    pub fn with_probe(mut self, probe: Box<dyn TrappingProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Probes the editor; any error means "not trapping"
    fn editor_is_trapping(&mut self) -> bool {
        let Some(probe) = self.probe.as_mut() else {
            return false;
        };

        match probe.is_trapping() {
            Ok(trapping) => {
                self.state.record_trapping(trapping);
                trapping
            }
            Err(e) => {
                debug!(error = %e, "trapping probe failed, dispatching anyway");
                self.state.clear_trapping();
                false
            }
        }
    }

    /// Sends the job's key to the editor; false if it could not be delivered
    fn forward_to_editor(&mut self, job: &DispatchJob) -> bool {
        let Some(probe) = self.probe.as_mut() else {
            return false;
        };

        let caught = KeyCaught::from(&job.event);
        match probe.forward(caught) {
            Ok(()) => {
                debug!(trigger = %job.trigger.trigger.id, "editor is recording, key forwarded");
                true
            }
            Err(e) => {
                warn!(error = %e, "could not forward key to editor, dispatching anyway");
                self.state.clear_trapping();
                false
            }
        }
    }

    /// Runs one job to completion
    pub fn run_job(&mut self, job: DispatchJob) {
        if self.editor_is_trapping() && self.forward_to_editor(&job) {
            return;
        }

        let registered = &job.trigger;
        let trigger = &registered.trigger;

        let actions = registered.actions_to_run();
        if actions.is_empty() {
            if trigger.fire() {
                self.reports.report(ActionReport {
                    trigger: trigger.id,
                    action: "callback".to_string(),
                    result: Ok(()),
                });
            } else {
                debug!(trigger = %trigger.id, "trigger has nothing to run");
            }
            return;
        }

        for action in actions {
            let result = self.run_action(trigger, action);
            self.reports.report(ActionReport {
                trigger: trigger.id,
                action: action.description(),
                result,
            });
        }
    }

    fn run_action(&self, trigger: &Trigger, action: &Action) -> Result<(), ActionError> {
        if action.should_confirm() {
            let confirmed = self
                .confirmer
                .as_ref()
                .is_some_and(|confirmer| confirmer.confirm(trigger, action));
            if !confirmed {
                return Err(ActionError::NotConfirmed(action.description()));
            }
        }

        if let Some(hooks) = &self.hooks {
            hooks.will_trigger(trigger, action);
        }

        let context = ActionContext {
            trigger,
            platform: self.platform.as_ref(),
            plugins: self.plugins.as_ref(),
            control: self.state.as_ref(),
        };
        let result = catch_unwind(AssertUnwindSafe(|| action.execute(&context)))
            .unwrap_or_else(|payload| Err(ActionError::Panicked(panic_message(payload.as_ref()))));

        if let Some(hooks) = &self.hooks {
            hooks.did_trigger(trigger, action, &result);
        }
        result
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Handle to the worker thread
pub struct ActionWorker {
    queue: JobQueue,
    handle: Option<JoinHandle<()>>,
}

impl ActionWorker {
    /// Starts the worker thread
    pub fn spawn(executor: Executor) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("keytrap-actions".to_string())
            .spawn(move || Self::run(executor, rx))?;

        Ok(Self {
            queue: JobQueue { tx },
            handle: Some(handle),
        })
    }

    fn run(mut executor: Executor, rx: Receiver<WorkerCommand>) {
        while let Ok(command) = rx.recv() {
            match command {
                WorkerCommand::Run(job) => executor.run_job(job),
                WorkerCommand::Stop => break,
            }
        }
        debug!("action worker stopped");
    }

    /// A sender for the dispatcher
    pub fn queue(&self) -> JobQueue {
        self.queue.clone()
    }

    /// Stops after the jobs already queued and waits for the thread
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.queue.tx.send(WorkerCommand::Stop);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("action worker thread panicked");
            }
        }
    }
}

impl Drop for ActionWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
