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

//! Shortcut recording in the editor
//!
//! - `TrapRecorder`: the Idle → Trapping → Verifying → Idle state machine
//! - `TrappingState`: the flag the IPC server reports to the daemon

pub mod recorder;
pub mod state;

pub use recorder::{TrapDelegate, TrapOutcome, TrapRecorder, TrapSettings, TrapState};
pub use state::TrappingState;

#[cfg(test)]
mod tests;
