// Per-queue counters
use serde::{Deserialize, Serialize};

/// Event bus statistics for one queue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub total_enqueued: u64,
    /// Events handed to a registered handler
    pub total_dispatched: u64,
    /// Events popped with no handler bound to their type
    pub total_discarded: u64,
    pub pending: usize,
}
