//! Popups drawn on top of the dashboard.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use super::theme::{AppTheme, BORDER_TYPE};

/// Draw the keyboard shortcut overlay.
pub(super) fn draw_help_overlay(frame: &mut Frame, theme: &AppTheme) {
    let area = frame.area();
    let width = 44.min(area.width.saturating_sub(2));
    let height = 13.min(area.height.saturating_sub(2));
    let x = (area.width.saturating_sub(width)) / 2;
    let y = (area.height.saturating_sub(height)) / 2;

    let help_area = Rect::new(x, y, width, height);
    frame.render_widget(Clear, help_area);

    let lines = vec![
        Line::from(""),
        shortcut_line("r", "Reconnect now", theme),
        shortcut_line("p/Space", "Pause flow animation", theme),
        shortcut_line("t", "Light/dark theme", theme),
        shortcut_line("?", "Toggle help", theme),
        shortcut_line("q/Esc", "Quit", theme),
        Line::from(""),
        Line::from(Span::styled(
            "Flows: amber solar, green battery,",
            Style::default().fg(theme.text_muted),
        )),
        Line::from(Span::styled(
            "red grid import, blue export",
            Style::default().fg(theme.text_muted),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press ? or Esc to close",
            Style::default().fg(theme.text_muted),
        )),
    ];

    let help = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(theme.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BORDER_TYPE)
                .border_style(theme.border_active_style())
                .title(Span::styled(" Keyboard Shortcuts ", theme.title_style())),
        );
    frame.render_widget(help, help_area);
}

fn shortcut_line<'a>(key: &str, desc: &str, theme: &AppTheme) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{:>8} ", key), Style::default().fg(theme.warning)),
        Span::styled(format!("{:<22}", desc), Style::default().fg(theme.text_secondary)),
    ])
}
