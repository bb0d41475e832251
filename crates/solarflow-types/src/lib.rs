//! Platform-agnostic types for the SolarFlow home-energy dashboard.
//!
//! This crate provides the shared data model used by the derivation logic
//! in `solarflow-core` and by every front-end that renders it.
//!
//! # Features
//!
//! - Raw telemetry snapshots ([`RawReading`], [`SensorValue`])
//! - The normalized [`EnergyState`] record
//! - Directed energy flows between the four fixed [`EnergyNode`]s
//! - Consumption history samples
//!
//! # Example
//!
//! ```
//! use solarflow_types::{EnergyNode, FlowEdge, FlowStyle};
//!
//! let edge = FlowEdge::new(EnergyNode::Solar, EnergyNode::House, 1200, FlowStyle::Solar);
//! assert_eq!(edge.id, "solar-house");
//! ```

pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{
    BatteryStatus, EnergyNode, EnergyState, FlowAnimation, FlowEdge, FlowStyle, GridStatus,
    HistorySample, PriceTrend, RawReading, SensorValue,
};
