//! Home Assistant websocket message types.
//!
//! Only the subset needed for a read-only entity subscription is modelled:
//!
//! ```text
//! server: {"type":"auth_required"}
//! client: {"type":"auth","access_token":"..."}
//! server: {"type":"auth_ok"} | {"type":"auth_invalid","message":"..."}
//! client: {"id":1,"type":"subscribe_entities","entity_ids":[...]}
//! server: {"id":1,"type":"result","success":true}
//! server: {"id":1,"type":"event","event":{"a":{...},"c":{...},"r":[...]}}
//! ```
//!
//! Entity events use the compressed format: `a` adds full entity states,
//! `c` carries partial changes under a `+` key and `r` lists removed ids.
//! State keys are abbreviated (`s` state, `lu` last updated, `lc` last
//! changed, both as fractional unix seconds).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use solarflow_types::{RawReading, SensorValue};

/// Messages sent to Home Assistant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Authentication with a long-lived access token.
    Auth { access_token: String },
    /// Subscribe to compressed state updates of the listed entities.
    SubscribeEntities { id: u64, entity_ids: Vec<String> },
}

impl ClientMessage {
    /// Serialize to the JSON text sent over the socket.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Error payload of a failed command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Messages received from Home Assistant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    AuthRequired {
        #[serde(default)]
        ha_version: Option<String>,
    },
    AuthOk {
        #[serde(default)]
        ha_version: Option<String>,
    },
    AuthInvalid {
        #[serde(default)]
        message: Option<String>,
    },
    Result {
        id: u64,
        success: bool,
        #[serde(default)]
        error: Option<CommandError>,
    },
    Event {
        id: u64,
        event: EntityDiff,
    },
    Pong {
        id: u64,
    },
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    /// Parse a text frame.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// A compressed entity state.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompressedState {
    #[serde(rename = "s", default)]
    pub state: Option<String>,
    #[serde(rename = "lu", default)]
    pub last_updated: Option<f64>,
    #[serde(rename = "lc", default)]
    pub last_changed: Option<f64>,
}

impl CompressedState {
    fn timestamp(&self) -> Option<OffsetDateTime> {
        self.last_updated
            .or(self.last_changed)
            .and_then(unix_seconds_to_datetime)
    }
}

/// A partial change to an entity.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EntityChange {
    #[serde(rename = "+", default)]
    pub additions: Option<CompressedState>,
}

/// One `subscribe_entities` event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EntityDiff {
    #[serde(rename = "a", default)]
    pub added: HashMap<String, CompressedState>,
    #[serde(rename = "c", default)]
    pub changed: HashMap<String, EntityChange>,
    #[serde(rename = "r", default)]
    pub removed: Vec<String>,
}

impl EntityDiff {
    /// Whether the diff changes nothing.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }

    /// Apply the diff to the local entity map.
    ///
    /// A change for an entity that was never added is treated as an add.
    pub fn apply(&self, entities: &mut RawReading) {
        for (id, full) in &self.added {
            entities.insert(
                id.clone(),
                SensorValue {
                    state: full.state.clone().unwrap_or_default(),
                    last_updated: full.timestamp(),
                },
            );
        }

        for (id, change) in &self.changed {
            let Some(additions) = &change.additions else {
                continue;
            };
            match entities.get_mut(id) {
                Some(existing) => {
                    if let Some(state) = &additions.state {
                        existing.state.clone_from(state);
                    }
                    if let Some(ts) = additions.timestamp() {
                        existing.last_updated = Some(ts);
                    }
                }
                None => entities.insert(
                    id.clone(),
                    SensorValue {
                        state: additions.state.clone().unwrap_or_default(),
                        last_updated: additions.timestamp(),
                    },
                ),
            }
        }

        for id in &self.removed {
            entities.remove(id);
        }
    }
}

fn unix_seconds_to_datetime(secs: f64) -> Option<OffsetDateTime> {
    if !secs.is_finite() {
        return None;
    }
    OffsetDateTime::from_unix_timestamp_nanos((secs * 1e9) as i128).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_messages() {
        let auth = ClientMessage::Auth {
            access_token: "abc".into(),
        };
        assert_eq!(
            auth.to_json().unwrap(),
            r#"{"type":"auth","access_token":"abc"}"#
        );

        let sub = ClientMessage::SubscribeEntities {
            id: 1,
            entity_ids: vec!["sensor.a".into()],
        };
        assert_eq!(
            sub.to_json().unwrap(),
            r#"{"type":"subscribe_entities","id":1,"entity_ids":["sensor.a"]}"#
        );
    }

    #[test]
    fn test_server_handshake_messages() {
        let msg = ServerMessage::from_json(r#"{"type":"auth_required","ha_version":"2024.6.0"}"#)
            .unwrap();
        assert_eq!(
            msg,
            ServerMessage::AuthRequired {
                ha_version: Some("2024.6.0".into())
            }
        );

        let msg =
            ServerMessage::from_json(r#"{"type":"auth_invalid","message":"Invalid password"}"#)
                .unwrap();
        assert!(matches!(msg, ServerMessage::AuthInvalid { message: Some(m) } if m == "Invalid password"));
    }

    #[test]
    fn test_result_with_error() {
        let msg = ServerMessage::from_json(
            r#"{"id":1,"type":"result","success":false,"error":{"code":"unknown_command","message":"Unknown command."}}"#,
        )
        .unwrap();
        match msg {
            ServerMessage::Result { id, success, error } => {
                assert_eq!(id, 1);
                assert!(!success);
                assert_eq!(error.unwrap().code, "unknown_command");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unknown_message_type() {
        let msg = ServerMessage::from_json(r#"{"type":"something_new","x":1}"#).unwrap();
        assert_eq!(msg, ServerMessage::Unknown);
    }

    #[test]
    fn test_apply_add_change_remove() {
        let mut entities = RawReading::new();

        let initial = ServerMessage::from_json(
            r#"{"id":1,"type":"event","event":{"a":{
                "sensor.solar_power":{"s":"1200","a":{"unit_of_measurement":"W"},"c":"01H","lc":1700000000.5},
                "sensor.grid_power":{"s":"-300","lu":1700000001.0}
            }}}"#,
        )
        .unwrap();
        let ServerMessage::Event { event, .. } = initial else {
            panic!("expected event");
        };
        event.apply(&mut entities);
        assert_eq!(entities.len(), 2);
        assert_eq!(entities.state("sensor.solar_power"), Some("1200"));
        let ts = entities.get("sensor.solar_power").unwrap().last_updated.unwrap();
        assert_eq!(ts.unix_timestamp(), 1_700_000_000);

        let change: EntityDiff = serde_json::from_str(
            r#"{"c":{"sensor.solar_power":{"+":{"s":"1350","lu":1700000030.0}}},"r":["sensor.grid_power"]}"#,
        )
        .unwrap();
        change.apply(&mut entities);
        assert_eq!(entities.state("sensor.solar_power"), Some("1350"));
        assert_eq!(
            entities
                .get("sensor.solar_power")
                .unwrap()
                .last_updated
                .unwrap()
                .unix_timestamp(),
            1_700_000_030
        );
        assert!(entities.get("sensor.grid_power").is_none());
    }

    #[test]
    fn test_change_without_state_keeps_value() {
        let mut entities = RawReading::new().with("sensor.a", "5");
        let change: EntityDiff =
            serde_json::from_str(r#"{"c":{"sensor.a":{"+":{"lu":1700000000.0}}}}"#).unwrap();
        change.apply(&mut entities);
        assert_eq!(entities.state("sensor.a"), Some("5"));
        assert!(entities.get("sensor.a").unwrap().last_updated.is_some());
    }

    #[test]
    fn test_change_for_unknown_entity_inserts() {
        let mut entities = RawReading::new();
        let change: EntityDiff =
            serde_json::from_str(r#"{"c":{"sensor.b":{"+":{"s":"on"}}}}"#).unwrap();
        assert!(!change.is_empty());
        change.apply(&mut entities);
        assert_eq!(entities.state("sensor.b"), Some("on"));
    }

    #[test]
    fn test_empty_diff() {
        let diff: EntityDiff = serde_json::from_str("{}").unwrap();
        assert!(diff.is_empty());
    }
}
