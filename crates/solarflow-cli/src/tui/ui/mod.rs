//! Main UI layout and rendering for the TUI dashboard.
//!
//! The screen is split into:
//!
//! - **Header**: title, telemetry source and connection status
//! - **Body**: flow diagram, stat cards and the consumption sparkline
//! - **Status bar**: key hints or the latest status message, plus the clock

pub mod theme;
pub mod widgets;

mod dashboard;
mod overlays;

use chrono::Local;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Paragraph};

use solarflow_core::ConnectionState;

use super::app::{App, Theme};

/// Draw the complete TUI interface.
pub fn draw(frame: &mut Frame, app: &App) {
    let theme = app.app_theme();

    if matches!(app.theme, Theme::Light) {
        frame.render_widget(
            Block::default().style(Style::default().bg(theme.bg)),
            frame.area(),
        );
    }

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header bar
            Constraint::Min(1),    // Dashboard
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_header(frame, main_layout[0], app);
    dashboard::draw_dashboard(frame, main_layout[1], app);
    draw_status_bar(frame, main_layout[2], app);

    if app.show_help {
        overlays::draw_help_overlay(frame, &theme);
    }
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let theme = app.app_theme();

    let mut spans = vec![
        Span::styled(
            " SolarFlow ",
            Style::default()
                .fg(theme.warning)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("v{} ", env!("CARGO_PKG_VERSION")),
            Style::default().fg(theme.text_muted),
        ),
        Span::styled(
            format!(" {} ", app.source_label),
            Style::default().fg(theme.text_secondary),
        ),
    ];

    let state = app.connection_state();
    let color = match state {
        ConnectionState::Connected => theme.success,
        ConnectionState::Reconnecting => theme.warning,
        ConnectionState::Disconnected | ConnectionState::Failed => theme.danger,
    };
    let marker = if state == ConnectionState::Connected {
        "●"
    } else {
        "○"
    };
    spans.push(Span::styled(
        format!(" {} {} ", marker, state),
        Style::default().fg(color),
    ));

    if let Some(updated) = app.last_update {
        spans.push(Span::styled(
            format!(" updated {} ", updated.format("%H:%M:%S")),
            Style::default().fg(theme.text_muted),
        ));
    }

    if app.animation.is_paused() {
        spans.push(Span::styled(" PAUSED ", Style::default().fg(theme.warning)));
    }

    let header = Paragraph::new(Line::from(spans)).style(theme.header_style());
    frame.render_widget(header, area);
}

/// Key hints for the status bar.
fn context_hints(app: &App) -> Vec<(&'static str, &'static str)> {
    let mut hints = vec![("?", "help"), ("r", "reconnect")];
    if app.animation.is_paused() {
        hints.push(("p", "resume"));
    } else {
        hints.push(("p", "pause"));
    }
    hints.push(("t", "theme"));
    hints.push(("q", "quit"));
    hints
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let theme = app.app_theme();
    let time_str = Local::now().format("%H:%M:%S").to_string();

    let left_spans = if let Some(msg) = app.current_status_message() {
        vec![Span::styled(
            format!(" {}", msg),
            Style::default().fg(theme.text_secondary),
        )]
    } else if app.connection_state() == ConnectionState::Reconnecting {
        vec![
            Span::styled(
                format!(" {} ", app.spinner_char()),
                Style::default().fg(theme.primary),
            ),
            Span::styled("Reconnecting...", Style::default().fg(theme.text_secondary)),
        ]
    } else {
        let mut spans = vec![Span::raw(" ")];
        for (i, (key, desc)) in context_hints(app).iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" | ", Style::default().fg(theme.text_muted)));
            }
            spans.push(Span::styled(
                *key,
                Style::default()
                    .fg(theme.primary)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                format!(" {}", desc),
                Style::default().fg(theme.text_muted),
            ));
        }
        spans
    };

    let status_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(10)])
        .split(area);

    frame.render_widget(Paragraph::new(Line::from(left_spans)), status_layout[0]);

    let right = Paragraph::new(time_str)
        .style(Style::default().fg(theme.text_muted))
        .alignment(Alignment::Right);
    frame.render_widget(right, status_layout[1]);
}
