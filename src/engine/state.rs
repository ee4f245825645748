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

//! Process-wide daemon switches
//!
//! `DaemonState` is created once at daemon start and shared by the
//! dispatcher (reads only) and the action worker (built-in actions and the
//! trapping probe write here). Every field is an atomic so the event path
//! never locks.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::core::{ActionError, DaemonControl, ListId, Registry};

/// Marker for "no probe result recorded"
const NEVER: u64 = 0;

pub struct DaemonState {
    registry: Arc<Registry>,
    paused: AtomicBool,

    /// Last trapping probe answer
    trapping: AtomicBool,
    /// Milliseconds since `epoch` (+1) when `trapping` was recorded
    trapping_at: AtomicU64,
    trapping_ttl: Duration,
    epoch: Instant,
}

impl DaemonState {
    pub fn new(registry: Arc<Registry>, trapping_ttl: Duration) -> Self {
        Self {
            registry,
            paused: AtomicBool::new(false),
            trapping: AtomicBool::new(false),
            trapping_at: AtomicU64::new(NEVER),
            trapping_ttl,
            epoch: Instant::now(),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    fn now_stamp(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis())
            .unwrap_or(u64::MAX - 1)
            .saturating_add(1)
    }

    /// Stores a trapping probe answer for the dispatcher's fast path
    pub fn record_trapping(&self, trapping: bool) {
        self.trapping.store(trapping, Ordering::Release);
        self.trapping_at.store(self.now_stamp(), Ordering::Release);
    }

    /// Forgets the cached answer
    pub fn clear_trapping(&self) {
        self.trapping_at.store(NEVER, Ordering::Release);
    }

    /// Cached trapping flag; false once the answer is older than the TTL
    pub fn cached_trapping(&self) -> bool {
        let at = self.trapping_at.load(Ordering::Acquire);
        if at == NEVER {
            return false;
        }

        let age = Duration::from_millis(self.now_stamp().saturating_sub(at));
        age < self.trapping_ttl && self.trapping.load(Ordering::Acquire)
    }
}

impl DaemonControl for DaemonState {
    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    fn set_paused(&self, paused: bool) {
        let was = self.paused.swap(paused, Ordering::AcqRel);
        if was != paused {
            info!(paused, "hotkey dispatch {}", if paused { "paused" } else { "resumed" });
        }
    }

    fn toggle_list(&self, list: ListId) -> Result<bool, ActionError> {
        let enabled = self
            .registry
            .toggle_list(list)
            .map_err(|_| ActionError::UnknownList(list))?;
        info!(%list, enabled, "list toggled");
        Ok(enabled)
    }
}
