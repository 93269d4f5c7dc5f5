// Gui: prints what it receives and keeps asking the mainapp for squares
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use queuebus_core::{Event, EventBus, Payload, PayloadKind, Result, ShutdownFlag};
use tracing::{error, warn};

use crate::config::RelayConfig;
use crate::events::{gui, mainapp, GUI_QUEUE, MAINAPP_QUEUE};

pub struct Gui {
    bus: Arc<EventBus>,
    cfg: RelayConfig,
    stop: ShutdownFlag,
    next_number: u32,
}

impl Gui {
    /// Creates the gui queue and binds its handlers.
    pub fn init(bus: Arc<EventBus>, cfg: RelayConfig) -> Result<Self> {
        bus.create_queue(GUI_QUEUE)?;
        bus.register_handler(GUI_QUEUE, gui::PRINT_TEXT, print_text)?;
        bus.register_handler(GUI_QUEUE, gui::SQUARE_READY, square_ready)?;

        Ok(Self {
            bus,
            cfg,
            stop: ShutdownFlag::new(),
            next_number: 0,
        })
    }

    /// Handle other threads use to stop [`run`](Self::run).
    pub fn shutdown_flag(&self) -> ShutdownFlag {
        self.stop.clone()
    }

    pub fn run(&mut self) {
        let mut last_request = Instant::now();

        while !self.stop.is_triggered() {
            if let Err(e) = self.bus.process_events(GUI_QUEUE) {
                warn!(target = "square_relay", error = %e, "Gui dispatch failed");
            }

            if last_request.elapsed() >= self.cfg.square_interval() {
                self.request_squares();
                last_request = Instant::now();
            }

            thread::sleep(self.cfg.poll_interval());
        }
    }

    /// Sends one batch of `GET_SQUARE` requests to the mainapp.
    fn request_squares(&mut self) {
        let batch = self.cfg.square_batch.max(1);
        for _ in 0..batch {
            let n = self.next_number as i32;
            if let Err(e) = self.bus.enqueue(
                MAINAPP_QUEUE,
                mainapp::GET_SQUARE,
                PayloadKind::SignedInt,
                &n.to_ne_bytes(),
            ) {
                error!(target = "square_relay", error = %e, "Unable to create get square event");
            }
            self.next_number = (self.next_number + 1) % batch;
        }
    }

    pub fn deinit(self) -> Result<()> {
        self.bus.delete_queue(GUI_QUEUE)
    }
}

fn print_text(ev: &Event) {
    match ev.payload.as_str() {
        Some(text) => println!("Text received: [{}]", text),
        None => warn!(
            target = "square_relay",
            kind = ?ev.payload_kind(),
            "Wrong data type for this event"
        ),
    }
}

fn square_ready(ev: &Event) {
    if let Some(square) = ev.payload.as_signed() {
        println!("Square: {}", square);
    }
}
