use std::sync::{Arc, Mutex};

use queuebus_core::{BusConfig, BusError, Event, EventBus, Payload, PayloadKind, Result};

// Handler that records every signed payload it sees
fn collector(bus: &EventBus, queue_id: i32, event_type: u32) -> Result<Arc<Mutex<Vec<i64>>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    bus.register_handler(queue_id, event_type, move |ev: &Event| {
        sink.lock().unwrap().push(ev.payload.as_signed().unwrap());
    })?;
    Ok(seen)
}

#[test]
fn dispatches_in_enqueue_order() -> Result<()> {
    let bus = EventBus::new();
    bus.create_queue(1)?;
    let seen = collector(&bus, 1, 10)?;

    for n in [1i32, 2, 3] {
        bus.enqueue(1, 10, PayloadKind::SignedInt, &n.to_ne_bytes())?;
    }

    assert_eq!(bus.process_events(1)?, 3);
    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    assert_eq!(bus.pending_events(1)?, 0);
    Ok(())
}

#[test]
fn unhandled_event_is_silently_discarded() -> Result<()> {
    let bus = EventBus::new();
    bus.create_queue(2)?;
    let seen = collector(&bus, 2, 10)?;

    bus.enqueue(2, 99, PayloadKind::Undefined, &[])?;

    assert_eq!(bus.process_events(2)?, 1);
    assert!(seen.lock().unwrap().is_empty());
    let stats = bus.stats(2).expect("stats exist");
    assert_eq!(stats.total_discarded, 1);
    assert_eq!(stats.total_dispatched, 0);
    Ok(())
}

#[test]
fn second_registration_replaces_first() -> Result<()> {
    let bus = EventBus::new();
    bus.create_queue(3)?;
    let calls = Arc::new(Mutex::new(Vec::new()));

    let a = calls.clone();
    bus.register_handler(3, 5, move |_: &Event| a.lock().unwrap().push("A"))?;
    let b = calls.clone();
    bus.register_handler(3, 5, move |_: &Event| b.lock().unwrap().push("B"))?;

    bus.enqueue_payload(3, 5, Payload::empty())?;
    assert_eq!(bus.process_events(3)?, 1);
    assert_eq!(*calls.lock().unwrap(), vec!["B"]);
    Ok(())
}

#[test]
fn unregister_turns_dispatch_into_discard() -> Result<()> {
    let bus = EventBus::new();
    bus.create_queue(4)?;
    let seen = collector(&bus, 4, 1)?;

    bus.unregister_handler(4, 1)?;
    // Unregistering twice is not an error
    bus.unregister_handler(4, 1)?;

    bus.enqueue_payload(4, 1, Payload::signed(7))?;
    assert_eq!(bus.process_events(4)?, 1);
    assert!(seen.lock().unwrap().is_empty());
    Ok(())
}

#[test]
fn duplicate_create_leaves_queue_untouched() -> Result<()> {
    let bus = EventBus::new();
    bus.create_queue(1)?;
    let seen = collector(&bus, 1, 10)?;
    bus.enqueue_payload(1, 10, Payload::signed(42))?;

    assert_eq!(bus.create_queue(1), Err(BusError::AlreadyExists(1)));

    assert_eq!(bus.queue_ids(), vec![1]);
    assert_eq!(bus.pending_events(1)?, 1);
    assert_eq!(bus.process_events(1)?, 1);
    assert_eq!(*seen.lock().unwrap(), vec![42]);
    Ok(())
}

#[test]
fn negative_id_is_rejected() {
    let bus = EventBus::new();
    assert_eq!(bus.create_queue(-1), Err(BusError::InvalidId(-1)));
    assert!(bus.queue_ids().is_empty());
}

#[test]
fn table_full_has_no_side_effects() -> Result<()> {
    let bus = EventBus::new();
    for id in 0..bus.capacity() as i32 {
        bus.create_queue(id)?;
    }
    let before = bus.queue_ids();

    assert_eq!(
        bus.create_queue(100),
        Err(BusError::TableFull { capacity: 5 })
    );
    assert_eq!(bus.queue_ids(), before);
    assert!(!bus.contains_queue(100));
    Ok(())
}

#[test]
fn recreated_queue_starts_empty() -> Result<()> {
    let bus = EventBus::new();
    bus.create_queue(7)?;
    let seen = collector(&bus, 7, 1)?;
    bus.enqueue_payload(7, 1, Payload::signed(1))?;
    bus.enqueue_payload(7, 1, Payload::signed(2))?;

    bus.delete_queue(7)?;
    bus.create_queue(7)?;

    assert_eq!(bus.pending_events(7)?, 0);
    bus.enqueue_payload(7, 1, Payload::signed(3))?;
    // The old binding did not survive the delete
    assert_eq!(bus.process_events(7)?, 1);
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(bus.stats(7).expect("stats").total_discarded, 1);
    Ok(())
}

#[test]
fn fifo_length_is_not_bounded_by_capacity() -> Result<()> {
    let bus = EventBus::with_config(BusConfig::default().with_capacity(1));
    bus.create_queue(0)?;
    for i in 0..1_000 {
        bus.enqueue_payload(0, 1, Payload::unsigned(i))?;
    }
    assert_eq!(bus.pending_events(0)?, 1_000);
    assert_eq!(bus.process_events(0)?, 1_000);
    Ok(())
}

#[test]
fn operations_on_unknown_queue() {
    let bus = EventBus::new();
    assert_eq!(bus.delete_queue(9), Err(BusError::NotFound(9)));
    assert_eq!(
        bus.enqueue(9, 1, PayloadKind::Undefined, &[]),
        Err(BusError::NotFound(9))
    );
    assert_eq!(
        bus.register_handler(9, 1, |_: &Event| {}),
        Err(BusError::NotFound(9))
    );
    assert_eq!(bus.unregister_handler(9, 1), Err(BusError::NotFound(9)));
    assert_eq!(bus.pending_events(9), Err(BusError::NotFound(9)));
    assert_eq!(bus.process_events(9), Ok(0));
}

#[test]
fn delete_discards_pending_events() -> Result<()> {
    let bus = EventBus::new();
    bus.create_queue(1)?;
    let seen = collector(&bus, 1, 1)?;
    bus.enqueue_payload(1, 1, Payload::signed(1))?;

    bus.delete_queue(1)?;

    assert_eq!(bus.process_events(1)?, 0);
    assert!(seen.lock().unwrap().is_empty());
    assert!(bus.stats(1).is_none());
    Ok(())
}

#[test]
fn enqueue_copies_caller_buffer() -> Result<()> {
    let bus = EventBus::new();
    bus.create_queue(1)?;
    let seen = Arc::new(Mutex::new(String::new()));
    let sink = seen.clone();
    bus.register_handler(1, 1, move |ev: &Event| {
        sink.lock().unwrap().push_str(ev.payload.as_str().unwrap());
    })?;

    let mut msg = b"Hello from mainapp\0".to_vec();
    bus.enqueue(1, 1, PayloadKind::String, &msg)?;
    msg.fill(b'x');
    drop(msg);

    bus.process_events(1)?;
    assert_eq!(*seen.lock().unwrap(), "Hello from mainapp");
    Ok(())
}

#[test]
fn payload_size_is_not_validated_against_kind() -> Result<()> {
    let bus = EventBus::new();
    bus.create_queue(1)?;
    let sizes = Arc::new(Mutex::new(Vec::new()));
    let sink = sizes.clone();
    bus.register_handler(1, 1, move |ev: &Event| {
        sink.lock()
            .unwrap()
            .push((ev.payload_kind(), ev.payload_size(), ev.payload.as_signed()));
    })?;

    bus.enqueue(1, 1, PayloadKind::SignedInt, &[1, 2, 3])?;
    bus.process_events(1)?;

    assert_eq!(
        *sizes.lock().unwrap(),
        vec![(PayloadKind::SignedInt, 3, None)]
    );
    Ok(())
}

#[test]
fn stats_track_enqueued_and_dispatched() -> Result<()> {
    let bus = EventBus::new();
    bus.create_queue(1)?;
    let _seen = collector(&bus, 1, 1)?;

    for i in 0..10 {
        bus.enqueue_payload(1, if i % 2 == 0 { 1 } else { 2 }, Payload::signed(i))?;
    }
    assert_eq!(bus.stats(1).expect("stats").pending, 10);

    bus.process_events(1)?;
    let stats = bus.stats(1).expect("stats");
    assert_eq!(stats.total_enqueued, 10);
    assert_eq!(stats.total_dispatched, 5);
    assert_eq!(stats.total_discarded, 5);
    assert_eq!(stats.pending, 0);
    Ok(())
}

#[test]
fn deinit_frees_every_queue() -> Result<()> {
    let bus = EventBus::new();
    bus.create_queue(1)?;
    bus.create_queue(2)?;
    bus.enqueue_payload(1, 1, Payload::empty())?;

    bus.deinit();

    assert!(bus.queue_ids().is_empty());
    assert_eq!(bus.process_events(1)?, 0);
    // Slots are free again
    for id in 0..bus.capacity() as i32 {
        bus.create_queue(id)?;
    }
    Ok(())
}

#[test]
fn independent_buses_do_not_share_state() -> Result<()> {
    let a = EventBus::new();
    let b = EventBus::new();
    a.create_queue(1)?;
    b.create_queue(1)?;
    a.enqueue_payload(1, 1, Payload::empty())?;

    assert_eq!(a.pending_events(1)?, 1);
    assert_eq!(b.pending_events(1)?, 0);
    Ok(())
}
