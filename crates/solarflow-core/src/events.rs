//! Events produced by the telemetry stream.
//!
//! A [`SnapshotStream`](crate::streaming::SnapshotStream) reports both data
//! and connection changes through one channel, so a consumer can fold
//! everything into a single state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use solarflow_types::RawReading;

use crate::error::Error;

/// Something that happened on the telemetry stream.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new event types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum TelemetryEvent {
    /// A connection was established and the subscription is live.
    Connected {
        /// Where the data comes from.
        source: String,
    },
    /// A full snapshot of the subscribed sensors.
    Snapshot { reading: RawReading },
    /// The connection was lost or could not be established.
    Disconnected { reason: DisconnectReason },
    /// Another connection attempt will be made after `delay`.
    ReconnectScheduled { attempt: u32, delay: Duration },
    /// The reconnect budget is exhausted; the stream ends after this.
    GaveUp { attempts: u32 },
}

impl TelemetryEvent {
    /// The snapshot carried by this event, if any.
    pub fn reading(&self) -> Option<&RawReading> {
        match self {
            TelemetryEvent::Snapshot { reading } => Some(reading),
            _ => None,
        }
    }
}

/// Reason for a disconnection.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new reasons
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
#[non_exhaustive]
pub enum DisconnectReason {
    /// The consumer asked to stop.
    UserRequested,
    /// The server closed the socket.
    ServerClosed,
    /// The access token was rejected.
    AuthFailed(String),
    /// A handshake or read timed out.
    Timeout,
    /// Any other failure.
    Error(String),
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisconnectReason::UserRequested => write!(f, "stopped by user"),
            DisconnectReason::ServerClosed => write!(f, "server closed the connection"),
            DisconnectReason::AuthFailed(msg) => write!(f, "authentication failed: {msg}"),
            DisconnectReason::Timeout => write!(f, "timed out"),
            DisconnectReason::Error(msg) => f.write_str(msg),
        }
    }
}

impl From<&Error> for DisconnectReason {
    fn from(err: &Error) -> Self {
        match err {
            Error::Auth(msg) => DisconnectReason::AuthFailed(msg.clone()),
            Error::Timeout { .. } => DisconnectReason::Timeout,
            Error::Cancelled => DisconnectReason::UserRequested,
            other => DisconnectReason::Error(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = TelemetryEvent::Disconnected {
            reason: DisconnectReason::Timeout,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"disconnected\""));
        assert!(json.contains("\"kind\":\"timeout\""));

        let event = TelemetryEvent::Snapshot {
            reading: RawReading::new().with("sensor.a", "1"),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: TelemetryEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.reading().and_then(|r| r.state("sensor.a")), Some("1"));
    }

    #[test]
    fn test_reason_from_error() {
        let reason = DisconnectReason::from(&Error::Auth("bad token".into()));
        assert_eq!(reason, DisconnectReason::AuthFailed("bad token".into()));

        let reason = DisconnectReason::from(&Error::timeout("auth", Duration::from_secs(10)));
        assert_eq!(reason, DisconnectReason::Timeout);

        let reason = DisconnectReason::from(&Error::NotConnected);
        assert_eq!(reason.to_string(), "Not connected to Home Assistant");
    }
}
