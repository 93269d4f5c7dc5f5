// Cooperative shutdown signal for consumer poll loops
use std::sync::Arc;

use parking_lot::Mutex;

/// Lock-protected stop flag shared between a consumer loop and whoever stops it.
///
/// Clones observe the same flag. The bus has no cancellation of its own: a
/// consumer checks the flag between `process_events` calls and leaves its
/// loop once it is set.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    stop: Arc<Mutex<bool>>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        *self.stop.lock() = true;
    }

    pub fn reset(&self) {
        *self.stop.lock() = false;
    }

    pub fn is_triggered(&self) -> bool {
        *self.stop.lock()
    }
}
