//! Keyboard input handling for the TUI.
//!
//! Keys are first mapped to an [`Action`], which is then applied to the
//! [`App`]. Actions that need the worker yield a [`Command`].
//!
//! # Key Bindings
//!
//! | Key | Action |
//! |-----|--------|
//! | `q` / `Esc` | Quit (or close help) |
//! | `r` | Reconnect |
//! | `p` / `Space` | Pause/resume flow animation |
//! | `t` | Toggle light/dark theme |
//! | `?` | Toggle help |

use crossterm::event::KeyCode;

use super::app::{App, Theme};
use super::messages::Command;

/// User actions that can be triggered by keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Quit the application.
    Quit,
    /// Drop the connection and start over.
    Reconnect,
    /// Toggle the help overlay.
    ToggleHelp,
    /// Close the help overlay.
    CloseHelp,
    /// Switch between light and dark theme.
    ToggleTheme,
    /// Freeze or resume the flow particles.
    ToggleAnimation,
    /// No action.
    None,
}

/// Map a key press to an action.
///
/// While the help overlay is open `Esc` and `?` close it instead of quitting.
pub fn handle_key(key: KeyCode, help_open: bool) -> Action {
    if help_open {
        return match key {
            KeyCode::Esc | KeyCode::Char('?') => Action::CloseHelp,
            KeyCode::Char('q') => Action::Quit,
            _ => Action::None,
        };
    }

    match key {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('r') => Action::Reconnect,
        KeyCode::Char('?') => Action::ToggleHelp,
        KeyCode::Char('t') => Action::ToggleTheme,
        KeyCode::Char('p') | KeyCode::Char(' ') => Action::ToggleAnimation,
        _ => Action::None,
    }
}

/// Apply an action to the application state.
///
/// Returns the command to send to the worker, if any.
pub fn apply_action(app: &mut App, action: Action) -> Option<Command> {
    match action {
        Action::Quit => {
            app.should_quit = true;
            None
        }
        Action::Reconnect => {
            app.push_status_message("Reconnecting...".to_string());
            Some(Command::Reconnect)
        }
        Action::ToggleHelp => {
            app.toggle_help();
            None
        }
        Action::CloseHelp => {
            app.show_help = false;
            None
        }
        Action::ToggleTheme => {
            app.toggle_theme();
            let theme_name = match app.theme {
                Theme::Dark => "dark",
                Theme::Light => "light",
            };
            app.push_status_message(format!("Theme: {}", theme_name));
            None
        }
        Action::ToggleAnimation => {
            app.toggle_animation();
            None
        }
        Action::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solarflow_core::{DashboardSession, SessionConfig};
    use tokio::sync::mpsc;

    fn app() -> App {
        let (_tx, rx) = mpsc::channel(1);
        App::new(DashboardSession::new(SessionConfig::default()), "demo", rx)
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(handle_key(KeyCode::Char('q'), false), Action::Quit);
        assert_eq!(handle_key(KeyCode::Esc, false), Action::Quit);
        assert_eq!(handle_key(KeyCode::Char('r'), false), Action::Reconnect);
        assert_eq!(handle_key(KeyCode::Char(' '), false), Action::ToggleAnimation);
        assert_eq!(handle_key(KeyCode::Char('x'), false), Action::None);
    }

    #[test]
    fn test_help_captures_escape() {
        assert_eq!(handle_key(KeyCode::Esc, true), Action::CloseHelp);
        assert_eq!(handle_key(KeyCode::Char('?'), true), Action::CloseHelp);
        assert_eq!(handle_key(KeyCode::Char('r'), true), Action::None);
        assert_eq!(handle_key(KeyCode::Char('q'), true), Action::Quit);
    }

    #[test]
    fn test_reconnect_yields_command() {
        let mut app = app();
        assert_eq!(
            apply_action(&mut app, Action::Reconnect),
            Some(Command::Reconnect)
        );
        assert_eq!(app.current_status_message(), Some("Reconnecting..."));
    }

    #[test]
    fn test_help_toggle_and_close() {
        let mut app = app();
        apply_action(&mut app, Action::ToggleHelp);
        assert!(app.show_help);
        apply_action(&mut app, Action::CloseHelp);
        assert!(!app.show_help);
    }

    #[test]
    fn test_quit() {
        let mut app = app();
        assert!(apply_action(&mut app, Action::Quit).is_none());
        assert!(app.should_quit());
    }

    #[test]
    fn test_theme_status_message() {
        let mut app = app();
        apply_action(&mut app, Action::ToggleTheme);
        assert_eq!(app.current_status_message(), Some("Theme: light"));
    }
}
