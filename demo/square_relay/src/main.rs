mod config;
mod events;
mod gui;
mod mainapp;

use std::sync::Arc;
use std::thread;

use config::RelayConfig;
use events::{mainapp as mainapp_events, MAINAPP_QUEUE};
use gui::Gui;
use mainapp::MainApp;
use queuebus_core::{EventBus, Payload, ShutdownFlag};
use tokio::signal;
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging / tracing
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,queuebus_core=info,square_relay=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        target = "square_relay",
        "Starting square relay demo: gui → GET_SQUARE → mainapp → SQUARE_READY → gui"
    );

    // Load configuration (defaults + env + optional TOML overlay)
    let cfg = RelayConfig::load();
    let bus = Arc::new(EventBus::with_config(cfg.bus.clone()));

    // Both apps create their queues and bind their handlers up front
    let mainapp = MainApp::init(Arc::clone(&bus), cfg.clone())?;
    let mut gui = Gui::init(Arc::clone(&bus), cfg)?;

    watch_ctrl_c(Arc::clone(&bus), mainapp.shutdown_flag())?;

    // The gui drains its queue on its own thread, the mainapp on this one
    let gui_stop = gui.shutdown_flag();
    let gui_thread = thread::Builder::new()
        .name("gui".into())
        .spawn(move || {
            gui.run();
            gui
        })?;

    mainapp.run();

    info!(target = "square_relay", "Shutting down...");
    gui_stop.trigger();
    let gui = gui_thread.join().map_err(|_| "gui thread panicked")?;

    mainapp.deinit()?;
    gui.deinit()?;
    bus.deinit();

    Ok(())
}

/// Turns Ctrl+C into a `QUIT_APP` event on the mainapp queue.
///
/// Falls back to tripping the mainapp flag directly if the event cannot be queued.
fn watch_ctrl_c(bus: Arc<EventBus>, fallback: ShutdownFlag) -> std::io::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    thread::Builder::new()
        .name("ctrl-c".into())
        .spawn(move || {
            rt.block_on(async {
                if let Err(e) = signal::ctrl_c().await {
                    error!(target = "square_relay", error = %e, "Failed to listen for Ctrl+C");
                    return;
                }
                info!(target = "square_relay", "Ctrl+C caught. Requesting to quit.");
                if let Err(e) =
                    bus.enqueue_payload(MAINAPP_QUEUE, mainapp_events::QUIT_APP, Payload::empty())
                {
                    error!(target = "square_relay", error = %e, "Unable to queue quit event");
                    fallback.trigger();
                }
            });
        })?;
    Ok(())
}
