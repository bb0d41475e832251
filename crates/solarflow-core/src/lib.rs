//! Energy-state derivation, flow routing and Home Assistant telemetry.
//!
//! This crate turns raw sensor snapshots into the normalized
//! [`EnergyState`] and the set of active [`FlowEdge`]s that the SolarFlow
//! front-ends render, and provides the reconnecting Home Assistant
//! websocket client that produces those snapshots.
//!
//! # Features
//!
//! - **Derivation**: lenient parsing of sensor text, battery unit handling,
//!   self-sufficiency ([`derive`])
//! - **Flow routing**: five fixed rules between solar, battery, grid and house ([`flow`])
//! - **History**: bounded, rate-limited consumption samples ([`history`])
//! - **Session fold**: previous price, history and connection status in one place ([`session`])
//! - **Home Assistant client**: token auth and `subscribe_entities` over websocket ([`client`])
//! - **Auto-reconnection**: exponential backoff in a background stream ([`streaming`])
//! - **Mock and demo sources** for tests and offline use ([`mock`], [`demo`])
//!
//! # Quick Start
//!
//! ```no_run
//! use solarflow_core::{
//!     ConnectionConfig, DashboardSession, HassConnector, SensorMap, SessionConfig,
//!     SnapshotStream, StreamOptions,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let sensors = SensorMap::default();
//!     let config = ConnectionConfig::new("http://homeassistant.local:8123", "TOKEN");
//!     let connector = HassConnector::new(config, sensors.entity_ids());
//!
//!     let mut stream = SnapshotStream::spawn(connector, StreamOptions::default());
//!     let mut session = DashboardSession::new(SessionConfig {
//!         sensors,
//!         ..Default::default()
//!     });
//!
//!     while let Some(event) = stream.recv().await {
//!         if let Some(view) = session.handle_event(&event, time::OffsetDateTime::now_utc()) {
//!             println!("{} W solar, {} flows", view.state.solar_power, view.flows.len());
//!         }
//!     }
//! }
//! ```

pub mod client;
pub mod demo;
pub mod derive;
pub mod error;
pub mod events;
pub mod flow;
pub mod history;
pub mod messages;
pub mod mock;
pub mod parse;
pub mod protocol;
pub mod reconnect;
pub mod sensors;
pub mod session;
pub mod streaming;
pub mod traits;

// Core exports
pub use client::{ConnectionConfig, HassConnection, HassConnector, websocket_url};
pub use demo::{DemoConnector, DemoModel, DemoSource};
pub use derive::{DeriveOptions, derive_state, self_sufficiency};
pub use error::{Error, Result};
pub use events::{DisconnectReason, TelemetryEvent};
pub use flow::{route_flows, route_flows_with_threshold};
pub use history::ConsumptionHistory;
pub use messages::Command;
pub use mock::{MockConnector, MockSession, MockSource, MockStep};
pub use parse::{BatteryUnit, normalize_battery_power, parse_numeric, parse_price_cents};
pub use reconnect::{ConnectionState, ReconnectOptions};
pub use sensors::{SensorKind, SensorMap};
pub use session::{DashboardSession, DashboardView, SessionConfig};
pub use streaming::{SnapshotStream, StreamOptions, StreamOptionsBuilder};
pub use traits::{SourceConnector, TelemetrySource};

// Re-export from solarflow-types
pub use solarflow_types::{
    BatteryStatus, EnergyNode, EnergyState, FlowAnimation, FlowEdge, FlowStyle, GridStatus,
    HistorySample, PriceTrend, RawReading, SensorValue,
};
