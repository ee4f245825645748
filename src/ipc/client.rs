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

//! Daemon-side IPC client
//!
//! Keeps one connection to the editor's socket and reuses it across
//! requests. Each request carries a fresh id; replies to earlier ids (from
//! requests that already timed out) are read and dropped.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::runtime::{Builder, Runtime};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use crate::core::KeyCaught;
use crate::engine::front::FrontApplication;
use crate::engine::worker::TrappingProbe;
use crate::ipc::protocol::{Message, Opcode, MAX_LINE_LEN};
use crate::ipc::{IpcError, DEFAULT_TIMEOUT};

struct Connection {
    stream: UnixStream,
    /// Bytes read but not yet consumed as a full line
    pending: Vec<u8>,
}

impl Connection {
    /// Reads the next full line; `None` on EOF
    ///
    /// Cancel-safe: a partial line stays in `pending`. A line longer than
    /// `MAX_LINE_LEN` is a decode error.
    async fn next_message(&mut self) -> Result<Option<Message>, IpcError> {
        loop {
            let newline = self.pending.iter().position(|&b| b == b'\n');
            let line_len = newline.map_or(self.pending.len(), |end| end + 1);
            if line_len > MAX_LINE_LEN {
                return Err(IpcError::Decode(format!(
                    "line longer than {} bytes",
                    MAX_LINE_LEN
                )));
            }
            if let Some(end) = newline {
                let line: Vec<u8> = self.pending.drain(..=end).collect();
                return Message::decode(&line).map(Some);
            }
            if self.stream.read_buf(&mut self.pending).await? == 0 {
                return Ok(None);
            }
        }
    }
}

/// Talks to the editor's `IpcServer`
pub struct IpcClient {
    socket_path: PathBuf,
    identity: String,
    timeout: Duration,
    /// Front application source and the identity that must be frontmost
    front_check: Option<(Arc<dyn FrontApplication>, String)>,
    next_id: u64,
    connection: Option<Connection>,
}

impl IpcClient {
    /// `identity` is sent as the request sender
    pub fn new(socket_path: impl Into<PathBuf>, identity: &str) -> Self {
        Self {
            socket_path: socket_path.into(),
            identity: identity.to_string(),
            timeout: DEFAULT_TIMEOUT,
            front_check: None,
            next_id: 1,
            connection: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Only query while `companion` is the front application
    pub fn with_front_check(mut self, front: Arc<dyn FrontApplication>, companion: &str) -> Self {
        self.front_check = Some((front, companion.to_string()));
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    fn check_front(&self) -> Result<(), IpcError> {
        if let Some((front, companion)) = &self.front_check {
            let current = front.bundle_id();
            if current.as_deref().map(String::as_str) != Some(companion.as_str()) {
                return Err(IpcError::TargetUnavailable(format!(
                    "{} is not the front application",
                    companion
                )));
            }
        }
        Ok(())
    }

    async fn connect(&mut self, deadline: Instant) -> Result<&mut Connection, IpcError> {
        if self.connection.is_none() {
            let stream = match timeout_at(deadline, UnixStream::connect(&self.socket_path)).await {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => {
                    return Err(IpcError::TargetUnavailable(format!(
                        "{}: {}",
                        self.socket_path.display(),
                        e
                    )))
                }
                Err(_) => return Err(IpcError::Timeout(self.timeout)),
            };
            debug!(path = %self.socket_path.display(), "connected to editor");
            self.connection = Some(Connection {
                stream,
                pending: Vec::new(),
            });
        }

        self.connection
            .as_mut()
            .ok_or_else(|| IpcError::TargetUnavailable("no connection".to_string()))
    }

    async fn send(&mut self, message: &Message, deadline: Instant) -> Result<(), IpcError> {
        let line = message.encode()?;
        let timeout = self.timeout;
        let connection = self.connect(deadline).await?;

        match timeout_at(deadline, connection.stream.write_all(&line)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                self.connection = None;
                Err(IpcError::Transport(e))
            }
            Err(_) => {
                // A half-written line would corrupt the stream
                self.connection = None;
                Err(IpcError::Timeout(timeout))
            }
        }
    }

    /// Asks whether the editor is recording, with the configured deadline
    pub async fn query_trapping_state(&mut self) -> Result<bool, IpcError> {
        self.query_trapping_state_with(self.timeout).await
    }

    /// Asks whether the editor is recording, giving up after `timeout`
    pub async fn query_trapping_state_with(&mut self, timeout: Duration) -> Result<bool, IpcError> {
        self.check_front()?;

        let deadline = Instant::now() + timeout;
        let id = self.next_id;
        self.next_id += 1;

        let request = Message::Request {
            id,
            opcode: Opcode::GetTrappingState,
            sender: self.identity.clone(),
        };
        self.send(&request, deadline).await?;

        let result = match self.connection.as_mut() {
            Some(connection) => timeout_at(deadline, read_reply(connection, id)).await,
            None => return Err(IpcError::TargetUnavailable("no connection".to_string())),
        };

        match result {
            Ok(Ok(trapping)) => Ok(trapping),
            Ok(Err(e)) => {
                self.connection = None;
                Err(e)
            }
            // Connection stays; the late reply is discarded by id
            Err(_) => Err(IpcError::Timeout(timeout)),
        }
    }

    /// Forwards a caught key to the editor
    pub async fn notify_key_caught(&mut self, caught: KeyCaught) -> Result<(), IpcError> {
        let deadline = Instant::now() + self.timeout;
        self.send(&Message::KeyCaught(caught), deadline).await
    }
}

async fn read_reply(connection: &mut Connection, id: u64) -> Result<bool, IpcError> {
    loop {
        match connection.next_message().await? {
            Some(Message::Reply { id: reply_id, trapping }) if reply_id == id => return Ok(trapping),
            Some(Message::Refused { id: reply_id, reason }) if reply_id == id => {
                return Err(IpcError::TargetUnavailable(reason))
            }
            Some(Message::Reply { id: stale, .. } | Message::Refused { id: stale, .. }) => {
                debug!(stale, expected = id, "discarding stale reply");
            }
            Some(other) => debug!(?other, "ignoring unexpected message"),
            None => {
                return Err(IpcError::TargetUnavailable("editor closed the connection".to_string()))
            }
        }
    }
}

/// Synchronous trapping probe for the action worker thread
///
/// Owns a current-thread runtime so the worker can block on the async
/// client without a runtime of its own.
pub struct BlockingTrappingProbe {
    runtime: Runtime,
    client: IpcClient,
}

impl BlockingTrappingProbe {
    pub fn new(client: IpcClient) -> std::io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self { runtime, client })
    }
}

impl TrappingProbe for BlockingTrappingProbe {
    fn is_trapping(&mut self) -> Result<bool, IpcError> {
        let result = self.runtime.block_on(self.client.query_trapping_state());
        if let Err(IpcError::Timeout(after)) = &result {
            warn!(?after, "editor did not answer trapping query");
        }
        result
    }

    fn forward(&mut self, caught: KeyCaught) -> Result<(), IpcError> {
        self.runtime.block_on(self.client.notify_key_caught(caught))
    }
}
