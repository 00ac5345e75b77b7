//! Application entry point — voice-server admin dashboard.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the shared [`ApiClient`] from config + stored token.
//! 5. Create sync channels (`command`, `event`).
//! 6. Spawn the [`SyncRunner`] on the tokio runtime.
//! 7. Run [`eframe::run_native`] — blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use tokio::sync::mpsc;
use voice_admin::{
    api::ApiClient,
    app::AdminApp,
    config::AppConfig,
    sync::{SyncCommand, SyncEvent, SyncRunner},
};

use eframe::egui;

// ---------------------------------------------------------------------------
// Window options
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let mut vp = egui::ViewportBuilder::default()
        .with_inner_size([900.0, 640.0])
        .with_min_inner_size([600.0, 400.0]);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("voice-admin dashboard starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime for the sync runner
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 4. Shared API client (token may still be None on first run)
    let client = Arc::new(ApiClient::from_config(
        &config.server,
        config.auth.token.clone(),
    ));

    // 5. Channel setup
    let (command_tx, command_rx) = mpsc::channel::<SyncCommand>(16);
    let (event_tx, event_rx) = mpsc::unbounded_channel::<SyncEvent>();

    // 6. Sync runner task
    let runner = SyncRunner::new(Arc::clone(&client), event_tx);
    rt.spawn(runner.run(command_rx));

    // 7. Build the egui app and run it (blocks until the window is closed)
    let app = AdminApp::new(client, command_tx, event_rx, config.clone());
    let options = native_options(&config);

    eframe::run_native(
        "Voice Admin",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}
