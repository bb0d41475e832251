//! Message types for TUI communication between UI and worker tasks.
//!
//! This module re-exports the shared message types from `solarflow-core`:
//!
//! - [`Command`]: Messages sent from the UI to the background worker
//! - [`TelemetryEvent`]: Events sent from the worker back to the UI

pub use solarflow_core::{Command, TelemetryEvent};
