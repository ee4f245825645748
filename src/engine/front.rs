//! Front application lookup
//!
//! The dispatcher asks which application is frontmost on every key event, so
//! implementations must answer without blocking.

use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// Reports the bundle identifier of the frontmost application
pub trait FrontApplication: Send + Sync {
    fn bundle_id(&self) -> Option<Arc<String>>;
}

/// Front application set explicitly by the host
///
/// The capture layer calls `set` on activation changes; readers never lock.
#[derive(Default)]
pub struct StaticFrontApplication {
    current: ArcSwapOption<String>,
}

impl StaticFrontApplication {
    pub fn new(bundle_id: Option<&str>) -> Self {
        let front = Self::default();
        front.set(bundle_id);
        front
    }

    pub fn set(&self, bundle_id: Option<&str>) {
        self.current
            .store(bundle_id.map(|id| Arc::new(id.to_string())));
    }
}

impl FrontApplication for StaticFrontApplication {
    fn bundle_id(&self) -> Option<Arc<String>> {
        self.current.load_full()
    }
}
