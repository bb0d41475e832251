//! Main entry point for the TUI dashboard.
//!
//! This module ties together all the TUI components and provides the main
//! event loop for the terminal user interface. It handles:
//!
//! - Terminal setup and restoration
//! - Channel creation for worker communication
//! - The main event loop with input handling and rendering
//! - Graceful shutdown coordination

pub mod app;
pub mod input;
pub mod messages;
pub mod ui;
pub mod worker;

pub use app::App;
pub use messages::{Command, TelemetryEvent};
pub use worker::TelemetryWorker;

use std::fs::{self, OpenOptions};
use std::io::{self, stdout};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use solarflow_core::{DashboardSession, StreamOptions};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::util::{build_connector, source_label};

/// Frame period of the event loop; also the particle animation step.
const FRAME_INTERVAL: Duration = Duration::from_millis(50);

/// How the dashboard should start.
#[derive(Debug, Clone, Default)]
pub struct TuiOptions {
    /// Effective configuration (file, environment and flags merged).
    pub config: Config,
    /// Use the built-in demo household instead of Home Assistant.
    pub demo: bool,
}

/// Set up the terminal for TUI rendering.
///
/// Enables raw mode and switches to the alternate screen buffer.
pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state.
pub fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Send tracing output to the dashboard log file.
///
/// The terminal belongs to the dashboard, so nothing is logged to stderr.
/// Without a log path no subscriber is installed at all.
fn init_file_logging(config: &Config) {
    let Some(path) = config.log_path() else {
        return;
    };

    if let Some(parent) = path.parent()
        && fs::create_dir_all(parent).is_err()
    {
        return;
    }

    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

/// Run the TUI application.
///
/// This is the main entry point for the TUI. It:
/// 1. Validates the configuration and builds the telemetry source
/// 2. Creates communication channels between UI and worker
/// 3. Spawns the background telemetry worker
/// 4. Runs the main event loop
/// 5. Ensures graceful shutdown
pub async fn run(options: TuiOptions) -> Result<()> {
    let TuiOptions { config, demo } = options;
    init_file_logging(&config);

    if !demo {
        config.validate()?;
    }
    let connector = build_connector(&config, demo)?;
    let label = source_label(&config, demo);
    info!("Starting dashboard for {}", label);

    // Create communication channels
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>(32);
    let (event_tx, event_rx) = mpsc::channel::<TelemetryEvent>(64);

    let stream_options = StreamOptions::builder()
        .reconnect(config.reconnect_options())
        .build();
    let worker = TelemetryWorker::new(cmd_rx, event_tx, connector, stream_options);
    let worker_handle = tokio::spawn(worker.run());

    let session = DashboardSession::with_history(config.session_config(), config.history());
    let mut app = App::new(session, label, event_rx);

    let mut terminal = setup_terminal()?;

    let result = run_event_loop(&mut terminal, &mut app, &cmd_tx).await;

    if cmd_tx.send(Command::Shutdown).await.is_err() {
        warn!("Telemetry worker already stopped");
    }

    restore_terminal()?;

    let _ = worker_handle.await;

    result
}

/// Main event loop for the TUI.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    command_tx: &mpsc::Sender<Command>,
) -> Result<()> {
    while !app.should_quit() {
        app.tick_spinner();
        app.clean_expired_messages();

        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(FRAME_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            let action = input::handle_key(key.code, app.show_help);
            if let Some(cmd) = input::apply_action(app, action) {
                let _ = command_tx.try_send(cmd);
            }
        }

        // Non-blocking receive of telemetry events
        while let Ok(event) = app.event_rx.try_recv() {
            app.handle_telemetry_event(event);
        }
    }

    Ok(())
}
