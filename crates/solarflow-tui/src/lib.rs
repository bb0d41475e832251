//! Terminal energy-flow dashboard for SolarFlow.
//!
//! This crate provides a standalone binary wrapper around solarflow-cli's TUI functionality.
//! The actual TUI implementation lives in `solarflow-cli` with the `tui` feature enabled.
//!
//! For the TUI implementation, see [`solarflow_cli::tui`].

pub use solarflow_cli::tui;
