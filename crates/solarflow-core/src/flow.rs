//! Routing of an [`EnergyState`] into active flow edges.
//!
//! Five rules are evaluated independently, in a fixed order:
//!
//! | edge | active when | magnitude |
//! |------|-------------|-----------|
//! | `solar-house` | solar > 0 | min(solar, house) |
//! | `solar-battery` | battery > 0 | battery |
//! | `battery-house` | battery < 0 | -battery |
//! | `grid-house` | grid > 0 | grid |
//! | `house-grid` | grid < 0 | -grid |
//!
//! Edges with a zero magnitude are never emitted.

use solarflow_types::{EnergyNode, EnergyState, FlowEdge, FlowStyle};

/// Active flows for a state, in rule order.
///
/// ```
/// use solarflow_core::flow::route_flows;
/// use solarflow_types::EnergyState;
///
/// let state = EnergyState {
///     solar_power: 3000,
///     house_consumption: 1000,
///     ..Default::default()
/// };
/// let flows = route_flows(&state);
/// assert_eq!(flows.len(), 1);
/// assert_eq!(flows[0].id, "solar-house");
/// assert_eq!(flows[0].magnitude, 1000);
/// ```
#[must_use]
pub fn route_flows(state: &EnergyState) -> Vec<FlowEdge> {
    route_flows_with_threshold(state, 0)
}

/// Like [`route_flows`], dropping edges whose magnitude is at or below
/// `min_watts`.
///
/// Inverters report a few watts of noise at night; a small threshold keeps
/// those from animating.
#[must_use]
pub fn route_flows_with_threshold(state: &EnergyState, min_watts: u64) -> Vec<FlowEdge> {
    let mut flows = Vec::with_capacity(3);
    let mut push = |from: EnergyNode, to: EnergyNode, magnitude: u64, style: FlowStyle| {
        if magnitude > min_watts {
            flows.push(FlowEdge::new(from, to, magnitude, style));
        }
    };

    if state.solar_power > 0 {
        let direct = state.solar_power.min(state.house_consumption).max(0);
        push(
            EnergyNode::Solar,
            EnergyNode::House,
            direct.unsigned_abs(),
            FlowStyle::Solar,
        );
    }

    if state.battery_power > 0 {
        push(
            EnergyNode::Solar,
            EnergyNode::Battery,
            state.battery_power.unsigned_abs(),
            FlowStyle::Battery,
        );
    } else if state.battery_power < 0 {
        push(
            EnergyNode::Battery,
            EnergyNode::House,
            state.battery_power.unsigned_abs(),
            FlowStyle::Battery,
        );
    }

    if state.grid_flow > 0 {
        push(
            EnergyNode::Grid,
            EnergyNode::House,
            state.grid_flow.unsigned_abs(),
            FlowStyle::GridImport,
        );
    } else if state.grid_flow < 0 {
        push(
            EnergyNode::House,
            EnergyNode::Grid,
            state.grid_flow.unsigned_abs(),
            FlowStyle::GridExport,
        );
    }

    flows
}
