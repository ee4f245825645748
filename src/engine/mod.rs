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

//! Daemon runtime
//!
//! - `Dispatcher`: resolves key events on the capture thread
//! - `ActionWorker`: runs matched actions on its own thread
//! - `DaemonState`: pause flag, cached trapping answer, shared registry
//! - `Daemon`: loads the library and ties the above together

use std::io;
use thiserror::Error;

use crate::config::ConfigError;

pub mod daemon;
pub mod dispatcher;
pub mod front;
pub mod state;
pub mod worker;

pub use daemon::{editor_probe, Daemon};
pub use dispatcher::{Diagnostic, DispatchOutcome, Dispatcher};
pub use front::{FrontApplication, StaticFrontApplication};
pub use state::DaemonState;
pub use worker::{
    ActionReport, ActionWorker, Confirmer, DispatchJob, Executor, JobQueue, LogReportSink,
    ReportSink, TrappingProbe, TriggerHooks,
};

/// Daemon start-up failures
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to start action worker: {0}")]
    Worker(#[source] io::Error),
}

#[cfg(test)]
mod tests;
