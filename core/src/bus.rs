// Event bus implementation
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam::utils::CachePadded;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::config::BusConfig;
use crate::event::{Event, Payload, PayloadKind};
use crate::queue::Queue;
use crate::registry::{EventHandler, Handler};
use crate::stats::QueueStats;
use crate::{BusError, Result};

/// In-process event bus with a fixed number of independently locked queues.
///
/// Lock order is always table then queue, and no lock is held while a
/// handler runs.
pub struct EventBus {
    // Queue table; `None` marks a free slot
    slots: Mutex<Vec<Option<Arc<Queue>>>>,

    // Queue serial -> counters
    stats: DashMap<u64, QueueStats>,

    next_uuid: CachePadded<AtomicU64>,
    next_serial: AtomicU64,

    config: BusConfig,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    /// Builds a bus from `config`. A dispatch budget of 0 is raised to 1.
    pub fn with_config(mut config: BusConfig) -> Self {
        if config.dispatch_budget == Some(0) {
            warn!("Dispatch budget of 0 would never drain, using 1");
            config.dispatch_budget = Some(1);
        }
        info!(
            capacity = config.capacity,
            dispatch_budget = ?config.dispatch_budget,
            "Event Bus initialized"
        );
        Self {
            slots: Mutex::new((0..config.capacity).map(|_| None).collect()),
            stats: DashMap::new(),
            next_uuid: CachePadded::new(AtomicU64::new(1)),
            next_serial: AtomicU64::new(1),
            config,
        }
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Frees every queue, discarding pending events and bindings.
    ///
    /// Consumers must have stopped calling the bus. Calling it twice is harmless.
    pub fn deinit(&self) {
        let mut slots = self.slots.lock();
        let mut discarded = 0;
        for slot in slots.iter_mut() {
            if let Some(queue) = slot.take() {
                discarded += queue.lock().close();
            }
        }
        self.stats.clear();
        info!(discarded, "Event Bus deinitialized");
    }

    /// Claims a free slot for a new, empty queue with the given id.
    pub fn create_queue(&self, queue_id: i32) -> Result<()> {
        if queue_id < 0 {
            warn!(queue_id, "Queue id must be >= 0");
            return Err(BusError::InvalidId(queue_id));
        }

        let mut slots = self.slots.lock();
        if slots.iter().flatten().any(|q| q.id() == queue_id) {
            warn!(queue_id, "Queue already exists");
            return Err(BusError::AlreadyExists(queue_id));
        }
        let Some(slot) = slots.iter_mut().find(|s| s.is_none()) else {
            warn!(queue_id, capacity = self.config.capacity, "No free queue slot");
            return Err(BusError::TableFull {
                capacity: self.config.capacity,
            });
        };
        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
        *slot = Some(Arc::new(Queue::new(queue_id, serial)));
        self.stats.insert(serial, QueueStats::default());

        info!(queue_id, "Created queue");
        Ok(())
    }

    /// Removes a queue, dropping its pending events and bindings undelivered.
    pub fn delete_queue(&self, queue_id: i32) -> Result<()> {
        let mut slots = self.slots.lock();
        let queue = slots
            .iter_mut()
            .find(|s| matches!(s, Some(q) if q.id() == queue_id))
            .and_then(Option::take)
            .ok_or_else(|| {
                warn!(queue_id, "Queue not found");
                BusError::NotFound(queue_id)
            })?;

        let discarded = queue.lock().close();
        self.stats.remove(&queue.serial());
        drop(slots);

        info!(queue_id, discarded, "Deleted queue");
        Ok(())
    }

    pub fn contains_queue(&self, queue_id: i32) -> bool {
        self.lookup(queue_id).is_some()
    }

    /// Ids of the live queues, in slot order.
    pub fn queue_ids(&self) -> Vec<i32> {
        self.slots.lock().iter().flatten().map(|q| q.id()).collect()
    }

    /// Binds `handler` to `event_type` on a queue, replacing any previous binding.
    pub fn register_handler<H>(&self, queue_id: i32, event_type: u32, handler: H) -> Result<()>
    where
        H: EventHandler + 'static,
    {
        self.register_shared(queue_id, event_type, Arc::new(handler))
    }

    /// Like [`register_handler`](Self::register_handler) for an already shared handler.
    pub fn register_shared(&self, queue_id: i32, event_type: u32, handler: Handler) -> Result<()> {
        let queue = self.live_queue(queue_id)?;
        let mut state = queue.lock();
        if state.closed {
            return Err(BusError::NotFound(queue_id));
        }
        let replaced = state.registry.register(event_type, handler).is_some();
        drop(state);

        debug!(queue_id, event_type, replaced, "Registered handler");
        Ok(())
    }

    /// Removes the handler bound to `event_type`, if any.
    pub fn unregister_handler(&self, queue_id: i32, event_type: u32) -> Result<()> {
        let queue = self.live_queue(queue_id)?;
        let mut state = queue.lock();
        if state.closed {
            return Err(BusError::NotFound(queue_id));
        }
        let removed = state.registry.unregister(event_type).is_some();
        drop(state);

        debug!(queue_id, event_type, removed, "Unregistered handler");
        Ok(())
    }

    /// Copies `data` into a new event and appends it to a queue.
    ///
    /// The caller keeps its buffer. `data.len()` is taken as the payload size
    /// as-is; it is not checked against `kind`. Returns the event uuid.
    pub fn enqueue(
        &self,
        queue_id: i32,
        event_type: u32,
        kind: PayloadKind,
        data: &[u8],
    ) -> Result<u64> {
        let payload = Payload::copy_from(kind, data)?;
        self.enqueue_payload(queue_id, event_type, payload)
    }

    /// Appends an event carrying an already owned payload. Returns the event uuid.
    pub fn enqueue_payload(&self, queue_id: i32, event_type: u32, payload: Payload) -> Result<u64> {
        let queue = self.live_queue(queue_id)?;

        let mut state = queue.lock();
        if state.closed {
            warn!(queue_id, "Queue deleted before enqueue");
            return Err(BusError::NotFound(queue_id));
        }
        let uuid = self.next_uuid.fetch_add(1, Ordering::Relaxed);
        state.events.push_back(Event {
            uuid,
            event_type,
            payload,
        });
        let pending = state.events.len();
        self.update_stats(&queue, |stats| {
            stats.total_enqueued += 1;
            stats.pending = pending;
        });
        drop(state);

        debug!(
            queue_id,
            event_type,
            uuid,
            thread = ?thread::current().id(),
            "Enqueued event"
        );
        Ok(uuid)
    }

    /// Drains a queue, running each event's handler on the calling thread.
    ///
    /// Events enqueued while draining, including by the handlers themselves,
    /// are processed by the same call. With no dispatch budget configured a
    /// handler that always re-enqueues into its own queue keeps this call from
    /// returning. An unknown queue yields `Ok(0)`.
    pub fn process_events(&self, queue_id: i32) -> Result<usize> {
        self.dispatch(queue_id, self.config.dispatch_budget)
    }

    /// Like [`process_events`](Self::process_events) but handles at most `max_events`.
    ///
    /// Events beyond the limit stay queued in order for the next call.
    pub fn process_events_bounded(&self, queue_id: i32, max_events: usize) -> Result<usize> {
        self.dispatch(queue_id, Some(max_events))
    }

    /// Number of events waiting in a queue.
    pub fn pending_events(&self, queue_id: i32) -> Result<usize> {
        let queue = self.live_queue(queue_id)?;
        let len = queue.lock().events.len();
        Ok(len)
    }

    /// Counters of the live queue with this id, reset whenever the id is recreated.
    pub fn stats(&self, queue_id: i32) -> Option<QueueStats> {
        let queue = self.lookup(queue_id)?;
        self.stats.get(&queue.serial()).map(|s| s.clone())
    }

    fn dispatch(&self, queue_id: i32, budget: Option<usize>) -> Result<usize> {
        let Some(queue) = self.lookup(queue_id) else {
            trace!(queue_id, "Nothing to process, queue not found");
            return Ok(0);
        };

        let mut processed = 0;
        while budget.map_or(true, |max| processed < max) {
            let next = {
                let mut state = queue.lock();
                let popped = state.pop_front();
                if popped.is_some() {
                    let pending = state.events.len();
                    self.update_stats(&queue, |stats| stats.pending = pending);
                }
                popped
            };
            let Some((event, handler)) = next else {
                break;
            };

            match handler {
                Some(handler) => {
                    handler.handle(&event);
                    self.update_stats(&queue, |stats| stats.total_dispatched += 1);
                }
                None => {
                    trace!(
                        queue_id,
                        event_type = event.event_type,
                        uuid = event.uuid,
                        "No handler, event discarded"
                    );
                    self.update_stats(&queue, |stats| stats.total_discarded += 1);
                }
            }
            drop(event);
            processed += 1;
        }

        if processed > 0 {
            debug!(
                queue_id,
                processed,
                thread = ?thread::current().id(),
                "Processed events"
            );
        }
        Ok(processed)
    }

    fn lookup(&self, queue_id: i32) -> Option<Arc<Queue>> {
        self.slots.lock()
            .iter()
            .flatten()
            .find(|q| q.id() == queue_id)
            .cloned()
    }

    fn live_queue(&self, queue_id: i32) -> Result<Arc<Queue>> {
        self.lookup(queue_id).ok_or_else(|| {
            warn!(queue_id, "Queue not found");
            BusError::NotFound(queue_id)
        })
    }

    // Counters of a deleted queue are gone and stay gone
    fn update_stats<F>(&self, queue: &Queue, f: F)
    where
        F: FnOnce(&mut QueueStats),
    {
        if let Some(mut stats) = self.stats.get_mut(&queue.serial()) {
            f(stats.value_mut());
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("queues", &self.queue_ids())
            .field("config", &self.config)
            .finish()
    }
}
