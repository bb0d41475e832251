//! Error types for solarflow-core.
//!
//! Only the telemetry side of the crate can fail. Deriving an
//! [`EnergyState`](solarflow_types::EnergyState) from sensor text never
//! errors: malformed or missing values degrade to zero.
//!
//! # Error Recovery Strategies
//!
//! | Error Type | Strategy | Rationale |
//! |------------|----------|-----------|
//! | [`Error::WebSocket`] | Reconnect with backoff | Socket dropped or handshake failed |
//! | [`Error::ConnectionFailed`] | Reconnect with backoff | Host unreachable or closed early |
//! | [`Error::Timeout`] | Reconnect with backoff | Home Assistant busy or restarting |
//! | [`Error::Protocol`] | Reconnect with backoff | Unexpected message, likely a restart mid-stream |
//! | [`Error::Auth`] | Reconnect with backoff, report loudly | Token revoked or mistyped |
//! | [`Error::InvalidConfig`] | Do not retry | Fix configuration and restart |
//! | [`Error::Cancelled`] | Do not retry | Shutdown was requested |
//!
//! The reconnect loop in [`crate::reconnect`] uses [`Error::is_retryable`]
//! to make this decision.

use std::time::Duration;

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors that can occur while talking to the telemetry backend.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Websocket transport error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// A message could not be encoded or decoded as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Home Assistant rejected the access token.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Connection could not be established or was closed during setup.
    #[error("Connection to {url} failed: {reason}")]
    ConnectionFailed {
        /// The websocket URL.
        url: String,
        /// Human-readable reason.
        reason: String,
    },

    /// The server sent something that does not fit the protocol.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A command was answered with `success: false`.
    #[error("Command '{command}' failed: {message}")]
    CommandFailed {
        /// The command type.
        command: String,
        /// Error message from the server.
        message: String,
    },

    /// Operation attempted without an open connection.
    #[error("Not connected to Home Assistant")]
    NotConnected,

    /// Operation timed out.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// Operation was cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create a connection failure.
    pub fn connection_failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Whether a fresh connection attempt could succeed where this one failed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Error::InvalidConfig(_) | Error::Cancelled)
    }
}

/// Result type alias using solarflow-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
