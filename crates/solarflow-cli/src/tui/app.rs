//! Application state for the TUI.
//!
//! The [`App`] owns the [`DashboardSession`] and folds every telemetry event
//! the worker forwards. Everything the UI draws is read from here.

use std::time::{Duration, Instant};

use time::OffsetDateTime;
use tokio::sync::mpsc;

use solarflow_core::{ConnectionState, DashboardSession, DashboardView, DisconnectReason};

use super::messages::TelemetryEvent;
use super::ui::theme::AppTheme;

/// Maximum number of queued status messages.
const MAX_STATUS_MESSAGES: usize = 5;

/// UI theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// Clock for the flow particles that can be frozen and resumed.
#[derive(Debug, Clone)]
pub struct AnimationClock {
    offset: f64,
    running_since: Option<Instant>,
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self {
            offset: 0.0,
            running_since: Some(Instant::now()),
        }
    }
}

impl AnimationClock {
    /// Seconds of animation time elapsed.
    pub fn elapsed_secs(&self) -> f64 {
        self.offset
            + self
                .running_since
                .map(|since| since.elapsed().as_secs_f64())
                .unwrap_or(0.0)
    }

    pub fn is_paused(&self) -> bool {
        self.running_since.is_none()
    }

    /// Freeze or resume. Particles continue from where they stopped.
    pub fn toggle(&mut self) {
        match self.running_since.take() {
            Some(since) => self.offset += since.elapsed().as_secs_f64(),
            None => self.running_since = Some(Instant::now()),
        }
    }
}

/// Main application state for the TUI.
pub struct App {
    /// Whether the application should exit.
    pub should_quit: bool,
    /// Receiver for events from the telemetry worker.
    pub event_rx: mpsc::Receiver<TelemetryEvent>,
    /// Folded dashboard state.
    pub session: DashboardSession,
    /// Where telemetry comes from, for the header.
    pub source_label: String,
    /// When the last snapshot arrived (local time for display).
    pub last_update: Option<chrono::DateTime<chrono::Local>>,
    /// Queue of status messages with their creation time.
    pub status_messages: Vec<(String, Instant)>,
    /// How long a status message stays visible.
    pub status_message_timeout: Duration,
    /// Whether the help overlay is shown.
    pub show_help: bool,
    /// Current color theme.
    pub theme: Theme,
    /// Particle animation clock.
    pub animation: AnimationClock,
    /// Frame counter for the connecting spinner.
    pub spinner_frame: usize,
}

impl App {
    /// Create a new App.
    pub fn new(
        session: DashboardSession,
        source_label: impl Into<String>,
        event_rx: mpsc::Receiver<TelemetryEvent>,
    ) -> Self {
        Self {
            should_quit: false,
            event_rx,
            session,
            source_label: source_label.into(),
            last_update: None,
            status_messages: Vec::new(),
            status_message_timeout: Duration::from_secs(5),
            show_help: false,
            theme: Theme::default(),
            animation: AnimationClock::default(),
            spinner_frame: 0,
        }
    }

    /// Returns whether the application should quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Latest derived view, if any snapshot arrived yet.
    pub fn view(&self) -> Option<&DashboardView> {
        self.session.latest()
    }

    /// Connection status of the telemetry source.
    pub fn connection_state(&self) -> ConnectionState {
        self.session.connection_state()
    }

    /// Fold a telemetry event into the session.
    pub fn handle_telemetry_event(&mut self, event: TelemetryEvent) {
        self.handle_telemetry_event_at(event, OffsetDateTime::now_utc());
    }

    /// Like [`App::handle_telemetry_event`], with an explicit timestamp.
    pub fn handle_telemetry_event_at(&mut self, event: TelemetryEvent, now: OffsetDateTime) {
        if self.session.handle_event(&event, now).is_some() {
            self.last_update = Some(chrono::Local::now());
            return;
        }

        let message = match &event {
            TelemetryEvent::Connected { source } => Some(format!("Connected to {}", source)),
            TelemetryEvent::Disconnected {
                reason: DisconnectReason::UserRequested,
            } => Some("Reconnecting...".to_string()),
            TelemetryEvent::Disconnected { reason } => Some(format!("Disconnected: {}", reason)),
            TelemetryEvent::ReconnectScheduled { attempt, delay } => Some(format!(
                "Retrying in {}s (attempt {})",
                delay.as_secs().max(1),
                attempt
            )),
            TelemetryEvent::GaveUp { .. } => {
                Some("Gave up reconnecting. Press r to try again".to_string())
            }
            _ => None,
        };
        if let Some(message) = message {
            self.push_status_message(message);
        }
    }

    /// Add a status message to the queue.
    pub fn push_status_message(&mut self, message: String) {
        self.status_messages.push((message, Instant::now()));
        while self.status_messages.len() > MAX_STATUS_MESSAGES {
            self.status_messages.remove(0);
        }
    }

    /// Remove expired status messages.
    pub fn clean_expired_messages(&mut self) {
        let timeout = self.status_message_timeout;
        self.status_messages
            .retain(|(_, created)| created.elapsed() < timeout);
    }

    /// Get the current status message to display.
    pub fn current_status_message(&self) -> Option<&str> {
        self.status_messages.last().map(|(msg, _)| msg.as_str())
    }

    /// Toggle between light and dark theme.
    pub fn toggle_theme(&mut self) {
        self.theme = match self.theme {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        };
    }

    /// Get the current AppTheme based on the theme setting.
    #[must_use]
    pub fn app_theme(&self) -> AppTheme {
        match self.theme {
            Theme::Dark => AppTheme::dark(),
            Theme::Light => AppTheme::light(),
        }
    }

    /// Freeze or resume the flow particles.
    pub fn toggle_animation(&mut self) {
        self.animation.toggle();
        let status = if self.animation.is_paused() {
            "paused"
        } else {
            "resumed"
        };
        self.push_status_message(format!("Animation {}", status));
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn tick_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % 10;
    }

    pub fn spinner_char(&self) -> &'static str {
        const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
        SPINNER[self.spinner_frame]
    }
}
