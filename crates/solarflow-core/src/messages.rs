//! Message types for UI/worker communication.
//!
//! ```text
//! +------------------+     Command      +------------------+
//! |    UI Thread     | --------------> |  TelemetryWorker |
//! |    (ratatui)     |                 |  (tokio runtime) |
//! |                  | <-------------- |                  |
//! +------------------+  TelemetryEvent +------------------+
//! ```
//!
//! The worker owns the [`SnapshotStream`](crate::streaming::SnapshotStream);
//! the UI owns the [`DashboardSession`](crate::session::DashboardSession)
//! and folds every event it receives.

/// Commands sent from the UI thread to the background worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Drop the current connection and start over with a fresh backoff.
    Reconnect,
    /// Close the connection and stop the worker.
    Shutdown,
}
