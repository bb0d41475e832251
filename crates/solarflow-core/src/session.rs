//! The dashboard fold: telemetry events in, renderable views out.
//!
//! [`DashboardSession`] carries the only state that survives between
//! snapshots: the previous electricity price (for the trend arrow), the
//! consumption history and the connection status. Everything else is
//! recomputed from each snapshot.

use time::OffsetDateTime;
use tracing::{debug, info};

use solarflow_types::{EnergyState, FlowEdge, RawReading};

use crate::derive::{DeriveOptions, derive_state};
use crate::events::{DisconnectReason, TelemetryEvent};
use crate::flow::route_flows_with_threshold;
use crate::history::ConsumptionHistory;
use crate::reconnect::ConnectionState;
use crate::sensors::SensorMap;

/// Everything a front-end needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    /// Derived state of the latest snapshot.
    pub state: EnergyState,
    /// Active flows, in rule order.
    pub flows: Vec<FlowEdge>,
    /// Whether this snapshot added a history sample.
    pub sample_recorded: bool,
}

/// Settings for a [`DashboardSession`].
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Entity ids per quantity.
    pub sensors: SensorMap,
    /// Derivation tunables.
    pub derive: DeriveOptions,
    /// Flows at or below this many watts are hidden.
    pub flow_threshold: u64,
}

/// Accumulated dashboard state.
#[derive(Debug, Clone)]
pub struct DashboardSession {
    config: SessionConfig,
    previous_price: i64,
    history: ConsumptionHistory,
    latest: Option<DashboardView>,
    connection: ConnectionState,
    source: Option<String>,
    last_disconnect: Option<DisconnectReason>,
    has_connected: bool,
    snapshots: u64,
}

impl DashboardSession {
    /// Create a session with the default history limits.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_history(config, ConsumptionHistory::new())
    }

    /// Create a session with a custom history.
    pub fn with_history(config: SessionConfig, history: ConsumptionHistory) -> Self {
        Self {
            config,
            previous_price: 0,
            history,
            latest: None,
            connection: ConnectionState::Disconnected,
            source: None,
            last_disconnect: None,
            has_connected: false,
            snapshots: 0,
        }
    }

    /// Fold one snapshot into the session.
    ///
    /// The state is derived with the price carried from the previous
    /// snapshot, which is then replaced by this snapshot's price.
    pub fn apply(&mut self, reading: &RawReading, now: OffsetDateTime) -> DashboardView {
        let state = derive_state(
            reading,
            &self.config.sensors,
            &self.config.derive,
            self.previous_price,
        );
        self.previous_price = state.electricity_price;

        let sample_recorded = self.history.record(now, state.house_consumption);
        let flows = route_flows_with_threshold(&state, self.config.flow_threshold);
        self.snapshots += 1;

        let view = DashboardView {
            state,
            flows,
            sample_recorded,
        };
        self.latest = Some(view.clone());
        view
    }

    /// Fold a telemetry event. Returns the new view for snapshot events.
    pub fn handle_event(
        &mut self,
        event: &TelemetryEvent,
        now: OffsetDateTime,
    ) -> Option<DashboardView> {
        match event {
            TelemetryEvent::Connected { source } => {
                if self.has_connected && self.last_disconnect.is_some() {
                    info!("Reconnected, clearing consumption history");
                    self.history.clear();
                }
                self.has_connected = true;
                self.connection = ConnectionState::Connected;
                self.source = Some(source.clone());
                self.last_disconnect = None;
                None
            }
            TelemetryEvent::Snapshot { reading } => Some(self.apply(reading, now)),
            TelemetryEvent::Disconnected { reason } => {
                debug!(%reason, "Session disconnected");
                self.connection = ConnectionState::Disconnected;
                self.last_disconnect = Some(reason.clone());
                None
            }
            TelemetryEvent::ReconnectScheduled { .. } => {
                self.connection = ConnectionState::Reconnecting;
                None
            }
            TelemetryEvent::GaveUp { .. } => {
                self.connection = ConnectionState::Failed;
                None
            }
        }
    }

    /// Whether the telemetry source is currently connected.
    pub fn connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    /// Description of the current or last source.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Why the last connection ended, while disconnected.
    pub fn last_disconnect(&self) -> Option<&DisconnectReason> {
        self.last_disconnect.as_ref()
    }

    /// Most recent view.
    pub fn latest(&self) -> Option<&DashboardView> {
        self.latest.as_ref()
    }

    /// Consumption history.
    pub fn history(&self) -> &ConsumptionHistory {
        &self.history
    }

    /// Number of snapshots folded so far.
    pub fn snapshot_count(&self) -> u64 {
        self.snapshots
    }

    /// Session settings.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solarflow_types::PriceTrend;

    fn at(secs: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000 + secs).unwrap()
    }

    fn snapshot(price: &str, house: &str) -> RawReading {
        RawReading::new()
            .with("sensor.electricity_price", price)
            .with("sensor.house_consumption", house)
            .with("sensor.solar_power", "2000")
    }

    #[test]
    fn test_apply_carries_previous_price() {
        let mut session = DashboardSession::new(SessionConfig::default());

        let first = session.apply(&snapshot("0,30", "800"), at(0));
        assert_eq!(first.state.previous_price, 0);
        assert!(first.state.price_trend().is_none());

        let second = session.apply(&snapshot("0,35", "820"), at(10));
        assert_eq!(second.state.previous_price, 30);
        assert_eq!(second.state.price_trend(), Some(PriceTrend::Rising));

        let third = session.apply(&snapshot("0,35", "840"), at(20));
        assert_eq!(third.state.price_trend(), Some(PriceTrend::Stable));
    }

    #[test]
    fn test_apply_records_history_and_routes() {
        let mut session = DashboardSession::new(SessionConfig::default());

        let view = session.apply(&snapshot("0,30", "800"), at(0));
        assert!(view.sample_recorded);
        assert_eq!(view.flows.len(), 1);
        assert_eq!(view.flows[0].magnitude, 800);

        let view = session.apply(&snapshot("0,30", "900"), at(10));
        assert!(!view.sample_recorded);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.latest().map(|v| v.state.house_consumption), Some(900));
        assert_eq!(session.snapshot_count(), 2);
    }

    #[test]
    fn test_flow_threshold_applied() {
        let config = SessionConfig {
            flow_threshold: 1000,
            ..Default::default()
        };
        let mut session = DashboardSession::new(config);
        let view = session.apply(&snapshot("0,30", "800"), at(0));
        assert!(view.flows.is_empty());
    }

    #[test]
    fn test_events_drive_connection_state() {
        let mut session = DashboardSession::new(SessionConfig::default());
        assert!(!session.connected());

        session.handle_event(
            &TelemetryEvent::Connected {
                source: "ws://ha/api/websocket".into(),
            },
            at(0),
        );
        assert!(session.connected());
        assert_eq!(session.source(), Some("ws://ha/api/websocket"));

        let view = session.handle_event(
            &TelemetryEvent::Snapshot {
                reading: snapshot("0,30", "800"),
            },
            at(1),
        );
        assert!(view.is_some());

        session.handle_event(
            &TelemetryEvent::Disconnected {
                reason: DisconnectReason::ServerClosed,
            },
            at(2),
        );
        assert!(!session.connected());
        assert_eq!(
            session.last_disconnect(),
            Some(&DisconnectReason::ServerClosed)
        );

        session.handle_event(
            &TelemetryEvent::ReconnectScheduled {
                attempt: 1,
                delay: std::time::Duration::from_secs(1),
            },
            at(2),
        );
        assert_eq!(session.connection_state(), ConnectionState::Reconnecting);

        session.handle_event(&TelemetryEvent::GaveUp { attempts: 1 }, at(3));
        assert_eq!(session.connection_state(), ConnectionState::Failed);
    }

    #[test]
    fn test_reconnect_clears_history_but_keeps_price() {
        let mut session = DashboardSession::new(SessionConfig::default());
        let connected = TelemetryEvent::Connected {
            source: "mock".into(),
        };

        session.handle_event(&connected, at(0));
        session.apply(&snapshot("0,30", "800"), at(0));
        assert_eq!(session.history().len(), 1);

        session.handle_event(
            &TelemetryEvent::Disconnected {
                reason: DisconnectReason::Timeout,
            },
            at(5),
        );
        session.handle_event(&connected, at(6));
        assert!(session.history().is_empty());

        let view = session.apply(&snapshot("0,25", "800"), at(7));
        assert_eq!(view.state.price_trend(), Some(PriceTrend::Falling));
    }

    #[test]
    fn test_first_connection_keeps_history() {
        let mut session = DashboardSession::new(SessionConfig::default());
        session.apply(&snapshot("0,30", "800"), at(0));
        session.handle_event(
            &TelemetryEvent::Connected {
                source: "mock".into(),
            },
            at(1),
        );
        assert_eq!(session.history().len(), 1);
    }
}
