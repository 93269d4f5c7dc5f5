// Queuebus Core Library
// In-process event bus with independently owned, independently drained queues

pub mod bus;
pub mod config;
pub mod event;
mod queue;
pub mod registry;
pub mod shutdown;
pub mod stats;

// Export core types
pub use bus::EventBus;
pub use config::{BusConfig, MAX_EVENT_QUEUES};
pub use event::{Event, Payload, PayloadKind};
pub use registry::{CallbackRegistry, EventHandler, Handler};
pub use shutdown::ShutdownFlag;
pub use stats::QueueStats;

// Error types
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("Queue id must be >= 0, got {0}")]
    InvalidId(i32),

    #[error("Queue {0} already exists")]
    AlreadyExists(i32),

    #[error("No free queue slot (capacity {capacity})")]
    TableFull { capacity: usize },

    #[error("Queue {0} not found")]
    NotFound(i32),

    #[error("Unable to allocate {size} bytes for event payload")]
    PayloadCopyFailure { size: usize },
}
pub type Result<T> = std::result::Result<T, BusError>;
