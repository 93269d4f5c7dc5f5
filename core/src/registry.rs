// Per-queue callback registry
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::event::Event;

/// Event handler trait
///
/// Handlers run synchronously on the thread that calls
/// [`EventBus::process_events`](crate::EventBus::process_events), with no
/// bus lock held, so they may call back into the bus.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &Event);
}

impl<F> EventHandler for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn handle(&self, event: &Event) {
        self(event)
    }
}

/// Shared handle to a registered handler.
pub type Handler = Arc<dyn EventHandler>;

/// Maps event types to the single handler bound to each.
#[derive(Default)]
pub struct CallbackRegistry {
    bindings: HashMap<u32, Handler>,
}

impl CallbackRegistry {
    /// Binds `handler` to `event_type`, replacing any previous binding.
    ///
    /// Returns the handler that was replaced, if any.
    pub fn register(&mut self, event_type: u32, handler: Handler) -> Option<Handler> {
        self.bindings.insert(event_type, handler)
    }

    /// Removes the binding for `event_type`. Absent bindings are ignored.
    pub fn unregister(&mut self, event_type: u32) -> Option<Handler> {
        self.bindings.remove(&event_type)
    }

    pub fn lookup(&self, event_type: u32) -> Option<Handler> {
        self.bindings.get(&event_type).cloned()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.bindings.keys().copied().collect();
        types.sort_unstable();
        f.debug_struct("CallbackRegistry")
            .field("event_types", &types)
            .finish()
    }
}
