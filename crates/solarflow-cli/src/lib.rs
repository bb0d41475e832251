//! Command-line interface and terminal dashboard for SolarFlow.
//!
//! This crate connects to Home Assistant (or the built-in demo household),
//! derives the home's energy state and shows where the power is going.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `read` | Print the current energy state and active flows once |
//! | `watch` | Stream one line per snapshot, reconnecting as needed |
//! | `dashboard` | Interactive energy-flow dashboard (requires the `tui` feature) |
//! | `config` | Show, locate or create the configuration file |
//! | `completions` | Generate shell completions |
//!
//! # Output Formats
//!
//! - **Text** (default): Human-readable colored output
//! - **JSON**: One object with the state and the active flows
//! - **CSV**: One row per snapshot, flows encoded as `id:watts;...`
//!
//! # Configuration
//!
//! Settings live in `~/.config/solarflow/config.toml` (or the platform
//! equivalent). See [`config`] for the sections and the environment
//! overrides.
//!
//! # Examples
//!
//! ```bash
//! export SOLARFLOW_HA_TOKEN=...
//! solarflow read --url http://homeassistant.local:8123
//! solarflow watch --demo -f csv -n 10 -o flows.csv
//! solarflow dashboard
//! ```

pub mod config;
pub mod format;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "cli")]
pub mod commands;
#[cfg(feature = "cli")]
pub mod style;

// TUI module - publicly exposed for the solarflow-tui crate to use
#[cfg(feature = "tui")]
pub mod tui;

// Re-export core dependencies for convenience
pub use solarflow_core;
pub use solarflow_types;
