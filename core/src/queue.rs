// A single named queue: event FIFO plus callback registry under one lock
use std::collections::VecDeque;

use parking_lot::{Mutex, MutexGuard};

use crate::event::Event;
use crate::registry::{CallbackRegistry, Handler};

/// State guarded by the queue lock.
#[derive(Debug, Default)]
pub(crate) struct QueueState {
    pub(crate) events: VecDeque<Event>,
    pub(crate) registry: CallbackRegistry,
    /// Set once the queue has been removed from the table.
    pub(crate) closed: bool,
}

impl QueueState {
    /// Pops the head event together with the handler currently bound to its type.
    pub(crate) fn pop_front(&mut self) -> Option<(Event, Option<Handler>)> {
        let event = self.events.pop_front()?;
        let handler = self.registry.lookup(event.event_type);
        Some((event, handler))
    }

    /// Drops every pending event and binding and marks the queue closed.
    ///
    /// Returns the number of events discarded.
    pub(crate) fn close(&mut self) -> usize {
        let discarded = self.events.len();
        self.events.clear();
        self.registry.clear();
        self.closed = true;
        discarded
    }
}

/// A live queue. Shared between the table and in-flight operations.
#[derive(Debug)]
pub(crate) struct Queue {
    id: i32,
    // Unique per create, so a recreated id is a different queue
    serial: u64,
    state: Mutex<QueueState>,
}

impl Queue {
    pub(crate) fn new(id: i32, serial: u64) -> Self {
        Self {
            id,
            serial,
            state: Mutex::new(QueueState::default()),
        }
    }

    pub(crate) fn id(&self) -> i32 {
        self.id
    }

    pub(crate) fn serial(&self) -> u64 {
        self.serial
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock()
    }
}
