//! Lenient parsing of sensor state text.
//!
//! Home Assistant reports every state as a string. Sensors that are
//! offline report `"unavailable"` or `"unknown"`, and some integrations
//! append units or use a decimal comma. None of this is an error here:
//! whatever cannot be read as a number becomes zero.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Nominal pack voltage used to turn a battery current into power.
pub const NOMINAL_BATTERY_VOLTAGE: f64 = 52.0;

/// Readings below this magnitude are taken as amperes in [`BatteryUnit::Auto`].
pub const AMPERE_HEURISTIC_LIMIT: f64 = 100.0;

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("leading number pattern")
});

static PRICE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?(?:\d+(?:\.\d*)?|\.\d+)").expect("price pattern"));

/// Parse the leading decimal number of a state string.
///
/// Leading whitespace is ignored and trailing text such as a unit is
/// dropped. Anything else yields `0.0`.
///
/// ```
/// use solarflow_core::parse::parse_numeric;
///
/// assert_eq!(parse_numeric("523.4 W"), 523.4);
/// assert_eq!(parse_numeric("-12"), -12.0);
/// assert_eq!(parse_numeric("unavailable"), 0.0);
/// ```
#[must_use]
pub fn parse_numeric(text: &str) -> f64 {
    LEADING_NUMBER
        .find(text.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// [`parse_numeric`] over an optional state.
#[must_use]
pub fn parse_optional(text: Option<&str>) -> f64 {
    text.map_or(0.0, parse_numeric)
}

/// Parse a price in currency units into whole cents.
///
/// Only the first comma is treated as a decimal separator. The first
/// number found anywhere in the text is used, keeping a directly
/// preceding minus sign so negative tariffs survive.
///
/// ```
/// use solarflow_core::parse::parse_price_cents;
///
/// assert_eq!(parse_price_cents("0,347 EUR/kWh"), 35);
/// assert_eq!(parse_price_cents("garbage"), 0);
/// ```
#[must_use]
pub fn parse_price_cents(text: &str) -> i64 {
    let normalized = text.replacen(',', ".", 1);
    PRICE_NUMBER
        .find(&normalized)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map_or(0, |euros| (euros * 100.0).round() as i64)
}

/// How the battery sensor reports its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatteryUnit {
    /// Values with a magnitude below 100 are amperes, larger ones watts.
    #[default]
    Auto,
    /// Always amperes.
    Amperes,
    /// Always watts.
    Watts,
}

impl std::fmt::Display for BatteryUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatteryUnit::Auto => write!(f, "auto"),
            BatteryUnit::Amperes => write!(f, "amperes"),
            BatteryUnit::Watts => write!(f, "watts"),
        }
    }
}

/// Convert a raw battery reading into watts.
///
/// The sign is preserved: positive charges the battery, negative
/// discharges it.
///
/// ```
/// use solarflow_core::parse::{BatteryUnit, NOMINAL_BATTERY_VOLTAGE, normalize_battery_power};
///
/// let v = NOMINAL_BATTERY_VOLTAGE;
/// assert_eq!(normalize_battery_power(-1.5, BatteryUnit::Auto, v), -78.0);
/// assert_eq!(normalize_battery_power(-1500.0, BatteryUnit::Auto, v), -1500.0);
/// ```
#[must_use]
pub fn normalize_battery_power(raw: f64, unit: BatteryUnit, voltage: f64) -> f64 {
    let is_current = match unit {
        BatteryUnit::Auto => raw.abs() < AMPERE_HEURISTIC_LIMIT,
        BatteryUnit::Amperes => true,
        BatteryUnit::Watts => false,
    };
    if is_current { raw * voltage } else { raw }
}

/// Round to the nearest whole watt.
#[must_use]
pub fn round_watts(value: f64) -> i64 {
    value.round() as i64
}

/// Round to one decimal place.
#[must_use]
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to the nearest integer percentage, clamped to 0..=100.
#[must_use]
pub fn round_percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_prefixes() {
        assert_eq!(parse_numeric("3000"), 3000.0);
        assert_eq!(parse_numeric("  42.5"), 42.5);
        assert_eq!(parse_numeric("523.4 W"), 523.4);
        assert_eq!(parse_numeric("+7"), 7.0);
        assert_eq!(parse_numeric(".5"), 0.5);
        assert_eq!(parse_numeric("1e3"), 1000.0);
        assert_eq!(parse_numeric("12."), 12.0);
    }

    #[test]
    fn test_parse_numeric_garbage_is_zero() {
        assert_eq!(parse_numeric(""), 0.0);
        assert_eq!(parse_numeric("unavailable"), 0.0);
        assert_eq!(parse_numeric("unknown"), 0.0);
        assert_eq!(parse_numeric("W 12"), 0.0);
        assert_eq!(parse_numeric("-"), 0.0);
        assert_eq!(parse_numeric("1e999"), 0.0);
        assert_eq!(parse_optional(None), 0.0);
    }

    #[test]
    fn test_parse_numeric_decimal_comma_truncates() {
        // Only prices get comma handling.
        assert_eq!(parse_numeric("1,5"), 1.0);
    }

    #[test]
    fn test_parse_price_cents() {
        assert_eq!(parse_price_cents("0,347 EUR/kWh"), 35);
        assert_eq!(parse_price_cents("0.30"), 30);
        assert_eq!(parse_price_cents("EUR 0.2849"), 28);
        assert_eq!(parse_price_cents("1,234,5"), 123);
        assert_eq!(parse_price_cents("garbage"), 0);
        assert_eq!(parse_price_cents(""), 0);
    }

    #[test]
    fn test_parse_price_keeps_negative_sign() {
        assert_eq!(parse_price_cents("-0,05 EUR/kWh"), -5);
    }

    #[test]
    fn test_battery_auto_heuristic() {
        let v = NOMINAL_BATTERY_VOLTAGE;
        assert_eq!(normalize_battery_power(-1.5, BatteryUnit::Auto, v), -78.0);
        assert_eq!(normalize_battery_power(-1500.0, BatteryUnit::Auto, v), -1500.0);
        assert_eq!(normalize_battery_power(99.0, BatteryUnit::Auto, v), 5148.0);
        assert_eq!(normalize_battery_power(100.0, BatteryUnit::Auto, v), 100.0);
        assert_eq!(normalize_battery_power(0.0, BatteryUnit::Auto, v), 0.0);
    }

    #[test]
    fn test_battery_explicit_units() {
        let v = NOMINAL_BATTERY_VOLTAGE;
        assert_eq!(normalize_battery_power(150.0, BatteryUnit::Amperes, v), 7800.0);
        assert_eq!(normalize_battery_power(-2.0, BatteryUnit::Watts, v), -2.0);
        assert_eq!(normalize_battery_power(10.0, BatteryUnit::Amperes, 48.0), 480.0);
    }

    #[test]
    fn test_rounding_helpers() {
        assert_eq!(round_watts(523.4), 523);
        assert_eq!(round_watts(-77.6), -78);
        assert_eq!(round_tenth(12.345), 12.3);
        assert_eq!(round_tenth(-3.06), -3.1);
        assert_eq!(round_percent(66.6), 67);
        assert_eq!(round_percent(140.0), 100);
        assert_eq!(round_percent(-5.0), 0);
        assert_eq!(round_percent(f64::NAN), 0);
    }

    #[test]
    fn test_battery_unit_serde() {
        let unit: BatteryUnit = serde_json::from_str("\"amperes\"").unwrap();
        assert_eq!(unit, BatteryUnit::Amperes);
        assert_eq!(BatteryUnit::default(), BatteryUnit::Auto);
        assert_eq!(BatteryUnit::Watts.to_string(), "watts");
    }
}
