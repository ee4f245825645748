use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// No window owns the trap
const NO_WINDOW: u64 = 0;

/// Editor-wide "recording a shortcut" flag
///
/// Written by the `TrapRecorder`, read by the `IpcServer` on every daemon
/// query. Window ids are non-zero.
#[derive(Debug, Default)]
pub struct TrappingState {
    trapping: AtomicBool,
    window: AtomicU64,
}

impl TrappingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_trapping(&self) -> bool {
        self.trapping.load(Ordering::Acquire)
    }

    /// Window currently recording, if any
    pub fn window(&self) -> Option<u64> {
        match self.window.load(Ordering::Acquire) {
            NO_WINDOW => None,
            id => Some(id),
        }
    }

    pub(crate) fn begin(&self, window: u64) {
        self.window.store(window, Ordering::Release);
        self.trapping.store(true, Ordering::Release);
    }

    /// Clears the flag if `window` owns it
    pub(crate) fn end(&self, window: u64) {
        if self
            .window
            .compare_exchange(window, NO_WINDOW, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.trapping.store(false, Ordering::Release);
        }
    }
}
