// Bus configuration
use serde::{Deserialize, Serialize};

/// Default number of queues a bus can hold at once.
pub const MAX_EVENT_QUEUES: usize = 5;

/// Event bus configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Maximum number of live queues
    pub capacity: usize,
    /// Maximum events handled per `process_events` call; `None` drains until empty
    pub dispatch_budget: Option<usize>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: MAX_EVENT_QUEUES,
            dispatch_budget: None,
        }
    }
}

impl BusConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Caps events handled per `process_events` call. A budget of 0 is raised to 1.
    pub fn with_dispatch_budget(mut self, budget: usize) -> Self {
        self.dispatch_budget = Some(budget.max(1));
        self
    }
}
