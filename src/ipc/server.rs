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

//! Editor-side IPC server
//!
//! Answers trapping queries from the daemon straight from `TrappingState`
//! and forwards `KeyCaught` notifications to the editor over a channel.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::core::KeyCaught;
use crate::ipc::protocol::{Message, Opcode, MAX_LINE_LEN};
use crate::trap::TrappingState;

pub struct IpcServer {
    listener: UnixListener,
    path: PathBuf,
    state: Arc<TrappingState>,
    peer_identity: Arc<str>,
    caught: UnboundedSender<KeyCaught>,
}

impl IpcServer {
    /// Binds the socket, replacing a stale one
    ///
    /// Must be called inside a tokio runtime. Only requests whose sender is
    /// `peer_identity` are answered. Caught keys arrive on the returned
    /// receiver.
    pub fn bind(
        path: &Path,
        state: Arc<TrappingState>,
        peer_identity: &str,
    ) -> io::Result<(Self, UnboundedReceiver<KeyCaught>)> {
        if path.exists() {
            fs::remove_file(path)?;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(path)?;
        info!(path = %path.display(), "editor IPC server listening");

        let (caught, rx) = unbounded_channel();
        Ok((
            Self {
                listener,
                path: path.to_path_buf(),
                state,
                peer_identity: Arc::from(peer_identity),
                caught,
            },
            rx,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accepts connections until the task is dropped
    pub async fn serve(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    tokio::spawn(handle_connection(
                        stream,
                        Arc::clone(&self.state),
                        Arc::clone(&self.peer_identity),
                        self.caught.clone(),
                    ));
                }
                Err(e) => {
                    error!(error = %e, "failed to accept IPC connection");
                }
            }
        }
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

async fn handle_connection(
    stream: UnixStream,
    state: Arc<TrappingState>,
    peer_identity: Arc<str>,
    caught: UnboundedSender<KeyCaught>,
) {
    debug!("IPC connection opened");
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        line.clear();
        let limit = MAX_LINE_LEN as u64 + 1;
        match (&mut reader).take(limit).read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "IPC read failed");
                break;
            }
        }
        if line.len() > MAX_LINE_LEN {
            warn!(limit = MAX_LINE_LEN, "IPC line too long, closing connection");
            break;
        }

        let reply = match Message::decode(&line) {
            Ok(Message::Request {
                id,
                opcode: Opcode::GetTrappingState,
                sender,
            }) => {
                if sender.as_str() == &*peer_identity {
                    Message::Reply {
                        id,
                        trapping: state.is_trapping(),
                    }
                } else {
                    warn!(%sender, "refusing request from unknown sender");
                    Message::Refused {
                        id,
                        reason: format!("unknown sender '{}'", sender),
                    }
                }
            }
            Ok(Message::KeyCaught(key)) => {
                debug!(key_code = key.key_code, "key caught by daemon");
                let _ = caught.send(key);
                continue;
            }
            Ok(other) => {
                debug!(?other, "ignoring unexpected message");
                continue;
            }
            Err(e) => {
                warn!(error = %e, "malformed IPC message");
                continue;
            }
        };

        let bytes = match reply.encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(error = %e, "failed to encode reply");
                continue;
            }
        };
        if let Err(e) = writer.write_all(&bytes).await {
            warn!(error = %e, "IPC write failed");
            break;
        }
    }
    debug!("IPC connection closed");
}
