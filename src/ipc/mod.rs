// Copyright 2025 bakri (tidynest@proton.me)
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

//! Daemon ↔ editor IPC over a Unix domain socket
//!
//! # Roles
//!
//! - **Editor** runs an `IpcServer`. It answers "are you recording a
//!   shortcut?" from its `TrappingState` and receives `KeyCaught`
//!   notifications for hotkeys the daemon swallowed.
//! - **Daemon** holds an `IpcClient`. The action worker asks before running
//!   a trigger; an editor that is absent, slow or not frontmost counts as
//!   "not recording".
//!
//! Every request has an explicit deadline (500 ms by default). A request that
//! times out is abandoned, never retried.
//!
//! # Example
//! ```no_run
//! use keytrap::ipc::IpcClient;
//! use std::time::Duration;
//!
//! # async fn demo() -> Result<(), keytrap::ipc::IpcError> {
//! let mut client = IpcClient::new("/tmp/keytrap-editor.sock", "org.keytrap.daemon");
//! let trapping = client.query_trapping_state_with(Duration::from_millis(500)).await?;
//! println!("editor recording: {}", trapping);
//! # Ok(())
//! # }
//! ```

use std::io;
use std::time::Duration;
use thiserror::Error;

pub mod client;
pub mod protocol;
pub mod server;

pub use client::{BlockingTrappingProbe, IpcClient};
pub use protocol::{Message, Opcode};
pub use server::IpcServer;

/// Deadline used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// IPC failures
///
/// All of them mean "not trapping" to the dispatcher.
#[derive(Debug, Error)]
pub enum IpcError {
    /// Editor not running, not frontmost, or refused the request
    #[error("IPC target unavailable: {0}")]
    TargetUnavailable(String),

    #[error("No reply within {0:?}")]
    Timeout(Duration),

    #[error("IPC transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("Malformed IPC message: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests;
