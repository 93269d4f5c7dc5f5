// Mainapp: squares numbers for the gui and greets it periodically
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Instant;

use queuebus_core::{Event, EventBus, Payload, PayloadKind, Result, ShutdownFlag};
use tracing::{error, info, warn};

use crate::config::RelayConfig;
use crate::events::{gui, mainapp, GUI_QUEUE, MAINAPP_QUEUE};

pub struct MainApp {
    bus: Arc<EventBus>,
    cfg: RelayConfig,
    stop: ShutdownFlag,
}

impl MainApp {
    /// Creates the mainapp queue and binds its handlers.
    pub fn init(bus: Arc<EventBus>, cfg: RelayConfig) -> Result<Self> {
        bus.create_queue(MAINAPP_QUEUE)?;

        let stop = ShutdownFlag::new();
        let quit = stop.clone();
        bus.register_handler(MAINAPP_QUEUE, mainapp::QUIT_APP, move |_: &Event| {
            info!(target = "square_relay", "Quit requested");
            quit.trigger();
        })?;

        let weak = Arc::downgrade(&bus);
        bus.register_handler(MAINAPP_QUEUE, mainapp::GET_SQUARE, move |ev: &Event| {
            get_square(&weak, ev)
        })?;

        Ok(Self { bus, cfg, stop })
    }

    /// Handle that stops [`run`](Self::run) without going through the queue.
    pub fn shutdown_flag(&self) -> ShutdownFlag {
        self.stop.clone()
    }

    /// Runs until the quit event arrives or the shutdown flag is triggered.
    pub fn run(&self) {
        let mut last_greeting = Instant::now();

        while !self.stop.is_triggered() {
            if let Err(e) = self.bus.process_events(MAINAPP_QUEUE) {
                warn!(target = "square_relay", error = %e, "Mainapp dispatch failed");
            }

            if last_greeting.elapsed() > self.cfg.greeting_interval() {
                // Sent NUL terminated, the way C consumers expect strings
                let mut msg = self.cfg.greeting.clone().into_bytes();
                msg.push(0);
                if let Err(e) = self
                    .bus
                    .enqueue(GUI_QUEUE, gui::PRINT_TEXT, PayloadKind::String, &msg)
                {
                    error!(target = "square_relay", error = %e, "Mainapp fail!");
                    break;
                }
                last_greeting = Instant::now();
            }

            thread::sleep(self.cfg.poll_interval());
        }
    }

    pub fn deinit(self) -> Result<()> {
        self.bus.delete_queue(MAINAPP_QUEUE)
    }
}

fn get_square(bus: &Weak<EventBus>, ev: &Event) {
    let Some(n) = ev.payload.as_signed() else {
        warn!(
            target = "square_relay",
            kind = ?ev.payload_kind(),
            size = ev.payload_size(),
            "GET_SQUARE without a signed int payload"
        );
        return;
    };
    let Some(bus) = bus.upgrade() else {
        return;
    };

    let square = n.saturating_mul(n);
    if let Err(e) = bus.enqueue_payload(GUI_QUEUE, gui::SQUARE_READY, Payload::signed(square)) {
        error!(target = "square_relay", error = %e, "Unable to create square ready event");
    }
}
