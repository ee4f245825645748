//! Wire format
//!
//! One JSON object per line:
//!
//! ```text
//! {"type":"request","id":7,"opcode":"get_trapping_state","sender":"org.keytrap.daemon"}
//! {"type":"reply","id":7,"trapping":true}
//! {"type":"refused","id":7,"reason":"unknown sender"}
//! {"type":"key_caught","key_code":49,"modifier_mask":1048576,"character_code":32}
//! ```

use serde::{Deserialize, Serialize};

use crate::core::KeyCaught;
use crate::ipc::IpcError;

/// Longest line either side accepts, newline included
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Request operations
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Opcode {
    GetTrappingState,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Request {
        id: u64,
        opcode: Opcode,
        sender: String,
    },
    Reply {
        id: u64,
        trapping: bool,
    },
    Refused {
        id: u64,
        reason: String,
    },
    KeyCaught(KeyCaught),
}

impl Message {
    /// Serialises to one newline-terminated line
    pub fn encode(&self) -> Result<Vec<u8>, IpcError> {
        let mut line = serde_json::to_vec(self).map_err(|e| IpcError::Decode(e.to_string()))?;
        line.push(b'\n');
        Ok(line)
    }

    /// Parses one line (with or without its newline)
    pub fn decode(line: &[u8]) -> Result<Self, IpcError> {
        serde_json::from_slice(line.trim_ascii()).map_err(|e| IpcError::Decode(e.to_string()))
    }
}
