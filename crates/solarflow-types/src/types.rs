//! Core types for home-energy telemetry and derived flows.

use core::fmt;
use std::collections::HashMap;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ParseError;

/// One of the four fixed nodes of the energy graph.
///
/// # Examples
///
/// ```
/// use solarflow_types::EnergyNode;
///
/// assert_eq!("battery".parse::<EnergyNode>(), Ok(EnergyNode::Battery));
/// assert_eq!(EnergyNode::Grid.to_string(), "grid");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EnergyNode {
    /// Solar array (producer only).
    Solar,
    /// Home battery (stores and releases energy).
    Battery,
    /// Utility grid (import and export).
    Grid,
    /// House consumption.
    House,
}

impl EnergyNode {
    /// All nodes, in display order.
    pub const ALL: [EnergyNode; 4] = [
        EnergyNode::Solar,
        EnergyNode::Battery,
        EnergyNode::Grid,
        EnergyNode::House,
    ];

    /// Lowercase identifier used in flow ids and serialized output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            EnergyNode::Solar => "solar",
            EnergyNode::Battery => "battery",
            EnergyNode::Grid => "grid",
            EnergyNode::House => "house",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            EnergyNode::Solar => "Solar",
            EnergyNode::Battery => "Battery",
            EnergyNode::Grid => "Grid",
            EnergyNode::House => "House",
        }
    }
}

impl fmt::Display for EnergyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnergyNode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solar" | "pv" => Ok(EnergyNode::Solar),
            "battery" => Ok(EnergyNode::Battery),
            "grid" => Ok(EnergyNode::Grid),
            "house" | "home" => Ok(EnergyNode::House),
            _ => Err(ParseError::UnknownNode(s.to_string())),
        }
    }
}

/// The latest value of a single sensor as pushed by the telemetry source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorValue {
    /// Raw textual state, e.g. `"523.4"` or `"0,347 EUR/kWh"`.
    pub state: String,
    /// When the source last updated this sensor, if known.
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            with = "time::serde::rfc3339::option",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub last_updated: Option<OffsetDateTime>,
}

impl SensorValue {
    /// Create a value without an update timestamp.
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            last_updated: None,
        }
    }

    /// Create a value with an update timestamp.
    pub fn with_timestamp(state: impl Into<String>, last_updated: OffsetDateTime) -> Self {
        Self {
            state: state.into(),
            last_updated: Some(last_updated),
        }
    }
}

/// A snapshot of named sensor values.
///
/// Snapshots are ephemeral: the telemetry source produces a fresh one on
/// every push and nothing in this workspace keeps them around.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RawReading {
    values: HashMap<String, SensorValue>,
}

impl RawReading {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a sensor value.
    pub fn insert(&mut self, sensor_id: impl Into<String>, value: SensorValue) {
        self.values.insert(sensor_id.into(), value);
    }

    /// Builder-style insert of a bare state string.
    #[must_use]
    pub fn with(mut self, sensor_id: impl Into<String>, state: impl Into<String>) -> Self {
        self.insert(sensor_id, SensorValue::new(state));
        self
    }

    /// Remove a sensor value.
    pub fn remove(&mut self, sensor_id: &str) -> Option<SensorValue> {
        self.values.remove(sensor_id)
    }

    /// Get the full value of a sensor.
    pub fn get(&self, sensor_id: &str) -> Option<&SensorValue> {
        self.values.get(sensor_id)
    }

    /// Get the textual state of a sensor.
    pub fn state(&self, sensor_id: &str) -> Option<&str> {
        self.values.get(sensor_id).map(|v| v.state.as_str())
    }

    /// Get a mutable reference to a sensor value.
    pub fn get_mut(&mut self, sensor_id: &str) -> Option<&mut SensorValue> {
        self.values.get_mut(sensor_id)
    }

    /// Number of sensors in the snapshot.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the snapshot holds no sensors.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(sensor_id, value)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SensorValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Most recent update timestamp across all sensors.
    pub fn latest_update(&self) -> Option<OffsetDateTime> {
        self.values.values().filter_map(|v| v.last_updated).max()
    }
}

impl FromIterator<(String, SensorValue)> for RawReading {
    fn from_iter<I: IntoIterator<Item = (String, SensorValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Direction of the electricity price relative to the previous reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PriceTrend {
    /// Price went up.
    Rising,
    /// Price went down.
    Falling,
    /// Price unchanged.
    Stable,
}

impl PriceTrend {
    /// Compare two prices in cents.
    ///
    /// Returns `None` when there is no usable prior observation
    /// (`previous <= 0`).
    ///
    /// ```
    /// use solarflow_types::PriceTrend;
    ///
    /// assert_eq!(PriceTrend::from_prices(30, 35), Some(PriceTrend::Rising));
    /// assert_eq!(PriceTrend::from_prices(0, 35), None);
    /// ```
    #[must_use]
    pub fn from_prices(previous: i64, current: i64) -> Option<Self> {
        if previous <= 0 {
            return None;
        }
        Some(match current.cmp(&previous) {
            std::cmp::Ordering::Greater => PriceTrend::Rising,
            std::cmp::Ordering::Less => PriceTrend::Falling,
            std::cmp::Ordering::Equal => PriceTrend::Stable,
        })
    }

    /// Arrow glyph for display.
    #[must_use]
    pub const fn arrow(&self) -> &'static str {
        match self {
            PriceTrend::Rising => "↑",
            PriceTrend::Falling => "↓",
            PriceTrend::Stable => "→",
        }
    }
}

/// What the battery is doing, derived from the sign of its power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BatteryStatus {
    Charging,
    Discharging,
    Idle,
}

impl fmt::Display for BatteryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatteryStatus::Charging => write!(f, "Charging"),
            BatteryStatus::Discharging => write!(f, "Discharging"),
            BatteryStatus::Idle => write!(f, "Idle"),
        }
    }
}

/// Net exchange with the utility grid, derived from the sign of grid flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum GridStatus {
    Importing,
    Exporting,
    Balanced,
}

impl fmt::Display for GridStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridStatus::Importing => write!(f, "Importing"),
            GridStatus::Exporting => write!(f, "Exporting"),
            GridStatus::Balanced => write!(f, "Balanced"),
        }
    }
}

/// Normalized energy state derived from one telemetry snapshot.
///
/// Recomputed wholesale on every push, never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EnergyState {
    /// Solar production in watts.
    pub solar_power: i64,
    /// Battery state of charge in percent (0-100).
    pub battery_level: u8,
    /// Battery power in watts (positive = charging, negative = discharging).
    pub battery_power: i64,
    /// House consumption in watts.
    pub house_consumption: i64,
    /// Grid flow in watts (positive = import, negative = export).
    pub grid_flow: i64,
    /// Solar yield for the current day in kWh (one decimal).
    pub daily_yield: f64,
    /// Share of consumption covered without grid import, in percent (0-100).
    pub self_sufficiency: u8,
    /// Current electricity price in cents.
    pub electricity_price: i64,
    /// Price from the previous snapshot in cents (0 = none yet).
    pub previous_price: i64,
    /// Outdoor temperature in °C (one decimal).
    pub temperature: f64,
    /// Forecast solar production for today in kWh (one decimal).
    pub energy_forecast: f64,
}

impl EnergyState {
    /// Price direction compared to the previous snapshot.
    #[must_use]
    pub fn price_trend(&self) -> Option<PriceTrend> {
        PriceTrend::from_prices(self.previous_price, self.electricity_price)
    }

    /// Battery activity.
    #[must_use]
    pub fn battery_status(&self) -> BatteryStatus {
        match self.battery_power {
            p if p > 0 => BatteryStatus::Charging,
            p if p < 0 => BatteryStatus::Discharging,
            _ => BatteryStatus::Idle,
        }
    }

    /// Grid activity.
    #[must_use]
    pub fn grid_status(&self) -> GridStatus {
        match self.grid_flow {
            g if g > 0 => GridStatus::Importing,
            g if g < 0 => GridStatus::Exporting,
            _ => GridStatus::Balanced,
        }
    }

    /// Power associated with a node, signed the way the node reports it.
    #[must_use]
    pub fn node_power(&self, node: EnergyNode) -> i64 {
        match node {
            EnergyNode::Solar => self.solar_power,
            EnergyNode::Battery => self.battery_power,
            EnergyNode::Grid => self.grid_flow,
            EnergyNode::House => self.house_consumption,
        }
    }
}

/// Visual category of a flow edge.
///
/// Colours follow the dashboard palette: amber for solar, green for the
/// battery, red for grid import and blue for grid export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FlowStyle {
    Solar,
    Battery,
    GridImport,
    GridExport,
}

impl FlowStyle {
    /// Main stroke colour as a hex string.
    #[must_use]
    pub const fn main_color(&self) -> &'static str {
        match self {
            FlowStyle::Solar => "#FBBF24",
            FlowStyle::Battery => "#22C55E",
            FlowStyle::GridImport => "#EF4444",
            FlowStyle::GridExport => "#3B82F6",
        }
    }

    /// Glow colour as a CSS `rgba()` string.
    #[must_use]
    pub const fn glow_color(&self) -> &'static str {
        match self {
            FlowStyle::Solar => "rgba(251, 191, 36, 0.6)",
            FlowStyle::Battery => "rgba(34, 197, 94, 0.6)",
            FlowStyle::GridImport => "rgba(239, 68, 68, 0.6)",
            FlowStyle::GridExport => "rgba(59, 130, 246, 0.6)",
        }
    }

    /// Main colour as an RGB triple.
    #[must_use]
    pub const fn rgb(&self) -> (u8, u8, u8) {
        match self {
            FlowStyle::Solar => (251, 191, 36),
            FlowStyle::Battery => (34, 197, 94),
            FlowStyle::GridImport => (239, 68, 68),
            FlowStyle::GridExport => (59, 130, 246),
        }
    }
}

impl FromStr for FlowStyle {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "solar" => Ok(FlowStyle::Solar),
            "battery" => Ok(FlowStyle::Battery),
            "grid_import" => Ok(FlowStyle::GridImport),
            "grid_export" => Ok(FlowStyle::GridExport),
            _ => Err(ParseError::UnknownFlowStyle(s.to_string())),
        }
    }
}

/// Lower bound of the particle travel time, in seconds.
pub const MIN_FLOW_DURATION_SECS: f64 = 1.5;
/// Upper bound of the particle travel time, in seconds.
pub const MAX_FLOW_DURATION_SECS: f64 = 4.0;
/// Magnitude at which a flow reaches its fastest animation.
pub const FLOW_SATURATION_WATTS: u64 = 5000;

/// Animation parameters derived from a flow's magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowAnimation {
    /// Seconds a particle needs to travel the full edge.
    pub duration_secs: f64,
    /// Number of particles on the edge (2-6).
    pub particle_count: u8,
}

impl FlowAnimation {
    /// Derive animation parameters from a magnitude in watts.
    ///
    /// Bigger flows move faster and carry more particles; both values are
    /// clamped so that tiny and huge flows stay readable.
    #[must_use]
    pub fn for_magnitude(watts: u64) -> Self {
        let normalized = watts.min(FLOW_SATURATION_WATTS) as f64 / FLOW_SATURATION_WATTS as f64;
        let duration_secs =
            MAX_FLOW_DURATION_SECS - normalized * (MAX_FLOW_DURATION_SECS - MIN_FLOW_DURATION_SECS);
        let particle_count = (watts / 500).clamp(2, 6) as u8;
        Self {
            duration_secs,
            particle_count,
        }
    }

    /// Position (0.0..1.0) along the edge of particle `index` at time `elapsed_secs`.
    ///
    /// Particles are spread evenly over one travel period.
    #[must_use]
    pub fn particle_offset(&self, index: u8, elapsed_secs: f64) -> f64 {
        let count = f64::from(self.particle_count.max(1));
        let delay = self.duration_secs / count * f64::from(index);
        ((elapsed_secs + delay) / self.duration_secs).fract()
    }
}

/// A directed, magnitude-weighted energy flow between two nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlowEdge {
    /// Stable identifier, `"<from>-<to>"`.
    pub id: String,
    /// Source node.
    pub from: EnergyNode,
    /// Destination node.
    pub to: EnergyNode,
    /// Power carried by the edge in watts.
    pub magnitude: u64,
    /// Visual category.
    pub style: FlowStyle,
}

impl FlowEdge {
    /// Create an edge; the id is derived from the endpoints.
    pub fn new(from: EnergyNode, to: EnergyNode, magnitude: u64, style: FlowStyle) -> Self {
        Self {
            id: format!("{}-{}", from, to),
            from,
            to,
            magnitude,
            style,
        }
    }

    /// Animation parameters for this edge.
    #[must_use]
    pub fn animation(&self) -> FlowAnimation {
        FlowAnimation::for_magnitude(self.magnitude)
    }

    /// Whether the edge touches the given node.
    #[must_use]
    pub fn involves(&self, node: EnergyNode) -> bool {
        self.from == node || self.to == node
    }
}

/// One point of the consumption history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HistorySample {
    /// When the sample was taken.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub timestamp: OffsetDateTime,
    /// House consumption in watts.
    pub watts: i64,
}
