//! Output formatting utilities for text, JSON, and CSV output.

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use solarflow_core::{
    DashboardView, DisconnectReason, EnergyState, FlowEdge, FlowStyle, PriceTrend, TelemetryEvent,
};

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Omit header row in CSV output.
    pub no_header: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool) -> Self {
        Self {
            no_color,
            ..Default::default()
        }
    }

    /// Create with no_header option for CSV output.
    pub fn with_no_header(mut self, no_header: bool) -> Self {
        self.no_header = no_header;
        self
    }

    /// Create with compact JSON option.
    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Serialize value to JSON string, respecting compact option.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }
}

// ============================================================================
// Units
// ============================================================================

/// Format a power value, switching to kW from 1000 W on.
///
/// The sign is kept, so grid export reads as `-1.2 kW`.
#[must_use]
pub fn format_watts(watts: i64) -> String {
    if watts.unsigned_abs() >= 1000 {
        format!("{:.1} kW", watts as f64 / 1000.0)
    } else {
        format!("{} W", watts)
    }
}

/// Format an unsigned flow magnitude.
#[must_use]
pub fn format_magnitude(watts: u64) -> String {
    format_watts(i64::try_from(watts).unwrap_or(i64::MAX))
}

/// Format an energy amount in kWh.
#[must_use]
pub fn format_kwh(kwh: f64) -> String {
    format!("{:.1} kWh", kwh)
}

/// Format a price in cents per kWh.
#[must_use]
pub fn format_price(cents: i64) -> String {
    format!("{} ct/kWh", cents)
}

/// Price with its trend arrow, if there is a previous price.
#[must_use]
pub fn format_price_with_trend(state: &EnergyState, no_color: bool) -> String {
    let price = format_price(state.electricity_price);
    match state.price_trend() {
        Some(trend) => format!("{} {}", price, trend_arrow(trend, no_color)),
        None => price,
    }
}

/// Trend arrow. Rising prices are red, falling ones green.
#[must_use]
pub fn trend_arrow(trend: PriceTrend, no_color: bool) -> String {
    if no_color {
        let ascii = match trend {
            PriceTrend::Rising => "^",
            PriceTrend::Falling => "v",
            PriceTrend::Stable => "=",
        };
        return ascii.to_string();
    }
    let arrow = trend.arrow();
    match trend {
        PriceTrend::Rising => arrow.red().to_string(),
        PriceTrend::Falling => arrow.green().to_string(),
        PriceTrend::Stable => arrow.dimmed().to_string(),
    }
}

// ============================================================================
// Color Thresholds
// ============================================================================

/// Battery state-of-charge thresholds (percentage).
pub mod battery {
    pub const LOW: u8 = 20; // Red: < 20%
    pub const MEDIUM: u8 = 50; // Yellow: 20-50%
}

/// Self-sufficiency thresholds (percentage).
pub mod autarky {
    pub const LOW: u8 = 30;
    pub const HIGH: u8 = 70;
}

/// Format battery percentage with appropriate color.
pub fn format_battery_colored(percent: u8, no_color: bool) -> String {
    if no_color {
        return format!("{}%", percent);
    }

    if percent < battery::LOW {
        format!("{}%", percent.red())
    } else if percent < battery::MEDIUM {
        format!("{}%", percent.yellow())
    } else {
        format!("{}%", percent.green())
    }
}

/// Format self-sufficiency with appropriate color.
pub fn format_autarky_colored(percent: u8, no_color: bool) -> String {
    if no_color {
        return format!("{}%", percent);
    }

    if percent < autarky::LOW {
        format!("{}%", percent.red())
    } else if percent < autarky::HIGH {
        format!("{}%", percent.yellow())
    } else {
        format!("{}%", percent.green())
    }
}

/// Color a string with the palette of a flow style.
#[must_use]
pub fn paint(text: &str, style: FlowStyle, no_color: bool) -> String {
    if no_color {
        return text.to_string();
    }
    let (r, g, b) = style.rgb();
    text.truecolor(r, g, b).to_string()
}

/// Escape a string for CSV output.
/// Wraps the value in quotes if it contains commas, quotes, or newlines.
#[must_use]
pub fn csv_escape(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn timestamp(now: OffsetDateTime) -> String {
    now.format(&Rfc3339).unwrap_or_else(|_| "???".to_string())
}

// ============================================================================
// Flows
// ============================================================================

/// One flow as `solar -> house  1.2 kW`.
#[must_use]
pub fn format_flow(edge: &FlowEdge, no_color: bool) -> String {
    let arrow = if no_color { "->" } else { "→" };
    let route = format!("{} {} {}", edge.from, arrow, edge.to);
    format!(
        "{:<17} {:>9}",
        paint(&route, edge.style, no_color),
        format_magnitude(edge.magnitude)
    )
}

/// Compact `id:watts` list joined with `;`.
#[must_use]
pub fn flows_compact(flows: &[FlowEdge]) -> String {
    flows
        .iter()
        .map(|edge| format!("{}:{}", edge.id, edge.magnitude))
        .collect::<Vec<_>>()
        .join(";")
}

// ============================================================================
// State
// ============================================================================

fn kv(label: &str, value: &str) -> String {
    format!("{:<18}{}\n", format!("{}:", label), value)
}

/// Multi-line state summary followed by the active flows.
#[must_use]
pub fn format_view_text(view: &DashboardView, opts: &FormatOptions) -> String {
    let state = &view.state;
    let no_color = opts.no_color;
    let mut output = String::new();

    output.push_str(&kv(
        "Solar",
        &paint(&format_watts(state.solar_power), FlowStyle::Solar, no_color),
    ));
    output.push_str(&kv("House", &format_watts(state.house_consumption)));
    output.push_str(&kv(
        "Battery",
        &format!(
            "{} {} ({})",
            format_battery_colored(state.battery_level, no_color),
            paint(&format_watts(state.battery_power), FlowStyle::Battery, no_color),
            state.battery_status()
        ),
    ));
    let grid_style = if state.grid_flow < 0 {
        FlowStyle::GridExport
    } else {
        FlowStyle::GridImport
    };
    output.push_str(&kv(
        "Grid",
        &format!(
            "{} ({})",
            paint(&format_watts(state.grid_flow), grid_style, no_color),
            state.grid_status()
        ),
    ));
    output.push_str(&kv(
        "Self-sufficiency",
        &format_autarky_colored(state.self_sufficiency, no_color),
    ));
    output.push_str(&kv("Yield today", &format_kwh(state.daily_yield)));
    output.push_str(&kv("Forecast", &format_kwh(state.energy_forecast)));
    output.push_str(&kv("Price", &format_price_with_trend(state, no_color)));
    output.push_str(&kv("Temperature", &format!("{:.1} °C", state.temperature)));

    output.push('\n');
    if view.flows.is_empty() {
        output.push_str("No active flows\n");
    } else {
        output.push_str("Flows:\n");
        for edge in &view.flows {
            output.push_str("  ");
            output.push_str(&format_flow(edge, no_color));
            output.push('\n');
        }
    }

    output
}

#[derive(Serialize)]
struct ViewJson<'a> {
    timestamp: String,
    #[serde(flatten)]
    state: &'a EnergyState,
    price_trend: Option<PriceTrend>,
    flows: &'a [FlowEdge],
}

/// State and flows as one JSON object.
pub fn format_view_json(
    view: &DashboardView,
    now: OffsetDateTime,
    opts: &FormatOptions,
) -> Result<String> {
    let json = ViewJson {
        timestamp: timestamp(now),
        state: &view.state,
        price_trend: view.state.price_trend(),
        flows: &view.flows,
    };
    opts.as_json(&json)
}

/// CSV header shared by `read` and `watch`.
#[must_use]
pub fn format_csv_header() -> String {
    "timestamp,solar_w,house_w,battery_w,battery_pct,grid_w,self_sufficiency_pct,\
     yield_kwh,forecast_kwh,price_ct,temperature_c,flows\n"
        .to_string()
}

/// One CSV row (no header).
#[must_use]
pub fn format_csv_line(view: &DashboardView, now: OffsetDateTime) -> String {
    let s = &view.state;
    format!(
        "{},{},{},{},{},{},{},{:.1},{:.1},{},{:.1},{}\n",
        timestamp(now),
        s.solar_power,
        s.house_consumption,
        s.battery_power,
        s.battery_level,
        s.grid_flow,
        s.self_sufficiency,
        s.daily_yield,
        s.energy_forecast,
        s.electricity_price,
        s.temperature,
        csv_escape(&flows_compact(&view.flows))
    )
}

/// CSV with a header unless `no_header` is set.
#[must_use]
pub fn format_view_csv(view: &DashboardView, now: OffsetDateTime, opts: &FormatOptions) -> String {
    let mut out = String::new();
    if !opts.no_header {
        out.push_str(&format_csv_header());
    }
    out.push_str(&format_csv_line(view, now));
    out
}

/// Single-line summary for `watch`.
#[must_use]
pub fn format_watch_line(view: &DashboardView, now: OffsetDateTime, opts: &FormatOptions) -> String {
    let s = &view.state;
    let no_color = opts.no_color;
    let parts = [
        timestamp(now),
        format!(
            "PV {}",
            paint(&format_watts(s.solar_power), FlowStyle::Solar, no_color)
        ),
        format!("House {}", format_watts(s.house_consumption)),
        format!(
            "Bat {}% {}",
            s.battery_level,
            paint(&format_watts(s.battery_power), FlowStyle::Battery, no_color)
        ),
        format!("Grid {}", format_watts(s.grid_flow)),
        format!("Self {}%", s.self_sufficiency),
        format_price_with_trend(s, no_color),
    ];
    parts.join("  ") + "\n"
}

// ============================================================================
// Connection events
// ============================================================================

/// Human-readable status line for non-snapshot events.
#[must_use]
pub fn format_event_status(event: &TelemetryEvent) -> Option<String> {
    match event {
        TelemetryEvent::Connected { source } => Some(format!("Connected to {}", source)),
        TelemetryEvent::Disconnected { reason } => match reason {
            DisconnectReason::UserRequested => None,
            other => Some(format!("Disconnected: {}", other)),
        },
        TelemetryEvent::ReconnectScheduled { attempt, delay } => Some(format!(
            "Reconnecting in {:.1}s (attempt {})",
            delay.as_secs_f64(),
            attempt
        )),
        TelemetryEvent::GaveUp { attempts } => Some(format!(
            "Giving up after {} reconnect attempt{}",
            attempts,
            if *attempts == 1 { "" } else { "s" }
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solarflow_core::{EnergyNode, route_flows};

    fn at() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
    }

    fn sample_view() -> DashboardView {
        let state = EnergyState {
            solar_power: 3200,
            battery_level: 64,
            battery_power: 500,
            house_consumption: 900,
            grid_flow: -1800,
            daily_yield: 12.4,
            self_sufficiency: 100,
            electricity_price: 35,
            previous_price: 30,
            temperature: 18.5,
            energy_forecast: 21.0,
        };
        DashboardView {
            flows: route_flows(&state),
            state,
            sample_recorded: true,
        }
    }

    #[test]
    fn test_format_watts() {
        assert_eq!(format_watts(0), "0 W");
        assert_eq!(format_watts(999), "999 W");
        assert_eq!(format_watts(1000), "1.0 kW");
        assert_eq!(format_watts(1250), "1.2 kW");
        assert_eq!(format_watts(-1800), "-1.8 kW");
        assert_eq!(format_watts(-78), "-78 W");
    }

    #[test]
    fn test_format_magnitude_saturates() {
        assert_eq!(format_magnitude(u64::MAX), format_watts(i64::MAX));
    }

    #[test]
    fn test_price_trend_plain() {
        let view = sample_view();
        assert_eq!(format_price_with_trend(&view.state, true), "35 ct/kWh ^");

        let first = EnergyState {
            electricity_price: 35,
            ..Default::default()
        };
        assert_eq!(format_price_with_trend(&first, true), "35 ct/kWh");
    }

    #[test]
    fn test_flow_line_plain() {
        let edge = FlowEdge::new(EnergyNode::House, EnergyNode::Grid, 1800, FlowStyle::GridExport);
        let line = format_flow(&edge, true);
        assert!(line.starts_with("house -> grid"));
        assert!(line.ends_with("1.8 kW"));
    }

    #[test]
    fn test_text_lists_flows() {
        let text = format_view_text(&sample_view(), &FormatOptions::new(true));
        assert!(text.contains(&format!("{:<18}3.2 kW", "Solar:")));
        assert!(text.contains("64% 500 W (Charging)"));
        assert!(text.contains("(Exporting)"));
        assert!(text.contains("solar -> house"));
        assert!(text.contains("solar -> battery"));
        assert!(text.contains("house -> grid"));
        assert!(!text.contains("No active flows"));
    }

    #[test]
    fn test_text_labels_keep_a_gap() {
        let text = format_view_text(&sample_view(), &FormatOptions::new(true));
        assert!(text.contains("Self-sufficiency: 100%"));
        for line in text
            .lines()
            .filter(|l| l.contains(':') && !l.starts_with(' ') && !l.ends_with(':'))
        {
            let (_, value) = line.split_once(':').unwrap();
            assert!(value.starts_with(' '), "no gap after label in {line:?}");
        }
    }

    #[test]
    fn test_text_without_flows() {
        let view = DashboardView {
            state: EnergyState::default(),
            flows: vec![],
            sample_recorded: false,
        };
        let text = format_view_text(&view, &FormatOptions::new(true));
        assert!(text.contains("No active flows"));
    }

    #[test]
    fn test_json_shape() {
        let json = format_view_json(&sample_view(), at(), &FormatOptions::new(true)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["solar_power"], 3200);
        assert_eq!(value["grid_flow"], -1800);
        assert_eq!(value["price_trend"], "rising");
        assert_eq!(value["flows"][0]["id"], "solar-house");
        assert_eq!(value["flows"][2]["style"], "grid_export");
        assert_eq!(value["timestamp"], "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_json_compact() {
        let opts = FormatOptions::new(true).with_compact(true);
        let json = format_view_json(&sample_view(), at(), &opts).unwrap();
        assert_eq!(json.lines().count(), 1);
    }

    #[test]
    fn test_csv_header_and_line() {
        let opts = FormatOptions::new(true);
        let csv = format_view_csv(&sample_view(), at(), &opts);
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        let row = lines.next().unwrap();
        assert_eq!(header.split(',').count(), row.split(',').count());
        assert!(row.starts_with("2023-11-14T22:13:20Z,3200,900,500,64,-1800,100,12.4,21.0,35,18.5,"));
        assert!(row.ends_with("solar-house:900;solar-battery:500;house-grid:1800"));

        let no_header = format_view_csv(&sample_view(), at(), &opts.with_no_header(true));
        assert_eq!(no_header.lines().count(), 1);
    }

    #[test]
    fn test_colored_values_keep_text() {
        assert!(format_battery_colored(10, false).contains("10"));
        assert_eq!(format_battery_colored(10, true), "10%");
        assert_eq!(format_autarky_colored(85, true), "85%");
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_watch_line() {
        let line = format_watch_line(&sample_view(), at(), &FormatOptions::new(true));
        assert!(line.starts_with("2023-11-14T22:13:20Z"));
        assert!(line.contains("PV 3.2 kW"));
        assert!(line.contains("Bat 64% 500 W"));
        assert!(line.ends_with("35 ct/kWh ^\n"));
    }

    #[test]
    fn test_event_status() {
        let event = TelemetryEvent::ReconnectScheduled {
            attempt: 2,
            delay: std::time::Duration::from_secs(2),
        };
        assert_eq!(
            format_event_status(&event).as_deref(),
            Some("Reconnecting in 2.0s (attempt 2)")
        );
        assert_eq!(
            format_event_status(&TelemetryEvent::GaveUp { attempts: 1 }).as_deref(),
            Some("Giving up after 1 reconnect attempt")
        );
        assert!(
            format_event_status(&TelemetryEvent::Disconnected {
                reason: DisconnectReason::UserRequested
            })
            .is_none()
        );
    }
}
