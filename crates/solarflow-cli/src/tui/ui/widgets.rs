//! Geometry and data helpers for the dashboard widgets.
//!
//! Kept free of rendering so they can be tested without a terminal.

use ratatui::prelude::*;

use solarflow_core::{ConsumptionHistory, EnergyNode, FlowEdge, PriceTrend};

use super::theme::AppTheme;

/// Width of the flow diagram's coordinate space.
pub const DIAGRAM_WIDTH: f64 = 1024.0;
/// Height of the flow diagram's coordinate space.
pub const DIAGRAM_HEIGHT: f64 = 600.0;

/// Node anchors in screen coordinates (y grows downwards).
const NODE_ANCHORS: [(EnergyNode, f64, f64); 4] = [
    (EnergyNode::Solar, 512.0, 80.0),
    (EnergyNode::Battery, 180.0, 300.0),
    (EnergyNode::Grid, 844.0, 300.0),
    (EnergyNode::House, 512.0, 300.0),
];

/// Position of a node on the canvas (y grows upwards).
#[must_use]
pub fn node_position(node: EnergyNode) -> (f64, f64) {
    NODE_ANCHORS
        .iter()
        .find(|(n, _, _)| *n == node)
        .map(|&(_, x, y)| (x, DIAGRAM_HEIGHT - y))
        .unwrap_or((DIAGRAM_WIDTH / 2.0, DIAGRAM_HEIGHT / 2.0))
}

/// Where particle `index` of an edge is at `elapsed_secs`.
#[must_use]
pub fn particle_point(edge: &FlowEdge, index: u8, elapsed_secs: f64) -> (f64, f64) {
    let (x1, y1) = node_position(edge.from);
    let (x2, y2) = node_position(edge.to);
    let t = edge.animation().particle_offset(index, elapsed_secs);
    (x1 + (x2 - x1) * t, y1 + (y2 - y1) * t)
}

/// All particle positions of an edge at `elapsed_secs`.
#[must_use]
pub fn particle_points(edge: &FlowEdge, elapsed_secs: f64) -> Vec<(f64, f64)> {
    let animation = edge.animation();
    (0..animation.particle_count)
        .map(|i| particle_point(edge, i, elapsed_secs))
        .collect()
}

/// Midpoint of an edge, where its magnitude label goes.
#[must_use]
pub fn edge_midpoint(edge: &FlowEdge) -> (f64, f64) {
    let (x1, y1) = node_position(edge.from);
    let (x2, y2) = node_position(edge.to);
    ((x1 + x2) / 2.0, (y1 + y2) / 2.0)
}

/// The last `width` history values, negatives clamped to zero.
#[must_use]
pub fn sparkline_tail(history: &ConsumptionHistory, width: usize) -> Vec<u64> {
    let skip = history.len().saturating_sub(width);
    history
        .iter()
        .skip(skip)
        .map(|sample| sample.watts.max(0).unsigned_abs())
        .collect()
}

/// Price arrow and color. Rising prices are bad news.
#[must_use]
pub fn trend_indicator(trend: Option<PriceTrend>, theme: &AppTheme) -> Option<(&'static str, Color)> {
    trend.map(|t| {
        let color = match t {
            PriceTrend::Rising => theme.danger,
            PriceTrend::Falling => theme.success,
            PriceTrend::Stable => theme.text_muted,
        };
        (t.arrow(), color)
    })
}

/// Color for a battery state of charge.
#[must_use]
pub fn battery_color(level: u8, theme: &AppTheme) -> Color {
    if level < 20 {
        theme.danger
    } else if level < 50 {
        theme.warning
    } else {
        theme.success
    }
}

/// Color for a self-sufficiency percentage.
#[must_use]
pub fn autarky_color(percent: u8, theme: &AppTheme) -> Color {
    if percent >= 70 {
        theme.success
    } else if percent >= 30 {
        theme.warning
    } else {
        theme.danger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solarflow_core::FlowStyle;
    use std::time::Duration;
    use time::OffsetDateTime;

    #[test]
    fn test_node_positions_flip_y() {
        assert_eq!(node_position(EnergyNode::Solar), (512.0, 520.0));
        assert_eq!(node_position(EnergyNode::House), (512.0, 300.0));
        assert_eq!(node_position(EnergyNode::Battery), (180.0, 300.0));
        assert_eq!(node_position(EnergyNode::Grid), (844.0, 300.0));
    }

    #[test]
    fn test_particles_stay_on_edge() {
        let edge = FlowEdge::new(EnergyNode::Grid, EnergyNode::House, 1200, FlowStyle::GridImport);
        let points = particle_points(&edge, 0.7);
        assert_eq!(points.len(), 2);
        for (x, y) in points {
            assert!((512.0..=844.0).contains(&x));
            assert_eq!(y, 300.0);
        }
    }

    #[test]
    fn test_first_particle_starts_at_source() {
        let edge = FlowEdge::new(EnergyNode::Solar, EnergyNode::House, 500, FlowStyle::Solar);
        assert_eq!(particle_point(&edge, 0, 0.0), node_position(EnergyNode::Solar));
    }

    #[test]
    fn test_edge_midpoint() {
        let edge = FlowEdge::new(EnergyNode::Battery, EnergyNode::House, 300, FlowStyle::Battery);
        assert_eq!(edge_midpoint(&edge), (346.0, 300.0));
    }

    #[test]
    fn test_sparkline_tail() {
        let mut history = ConsumptionHistory::with_limits(10, Duration::from_secs(30));
        let start = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        for (i, watts) in [100, -5, 300, 400].into_iter().enumerate() {
            history.record(start + time::Duration::minutes(i as i64), watts);
        }
        assert_eq!(sparkline_tail(&history, 3), vec![0, 300, 400]);
        assert_eq!(sparkline_tail(&history, 10), vec![100, 0, 300, 400]);
    }

    #[test]
    fn test_trend_colors() {
        let theme = AppTheme::dark();
        assert_eq!(
            trend_indicator(Some(PriceTrend::Rising), &theme),
            Some(("↑", theme.danger))
        );
        assert!(trend_indicator(None, &theme).is_none());
    }

    #[test]
    fn test_level_colors() {
        let theme = AppTheme::dark();
        assert_eq!(battery_color(10, &theme), theme.danger);
        assert_eq!(battery_color(35, &theme), theme.warning);
        assert_eq!(battery_color(90, &theme), theme.success);
        assert_eq!(autarky_color(100, &theme), theme.success);
        assert_eq!(autarky_color(0, &theme), theme.danger);
    }
}
