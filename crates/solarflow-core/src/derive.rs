//! Derivation of [`EnergyState`] from a raw sensor snapshot.
//!
//! Derivation is pure and infallible. Each call recomputes every field from
//! the snapshot; the only carried input is the previous electricity price,
//! which the caller threads through (see [`crate::session`]).

use serde::{Deserialize, Serialize};

use solarflow_types::{EnergyState, RawReading};

use crate::parse::{
    BatteryUnit, NOMINAL_BATTERY_VOLTAGE, normalize_battery_power, parse_optional,
    parse_price_cents, round_percent, round_tenth, round_watts,
};
use crate::sensors::{SensorKind, SensorMap};

/// Tunables for [`derive_state`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeriveOptions {
    /// How to interpret the battery sensor.
    pub battery_unit: BatteryUnit,
    /// Pack voltage used when the battery sensor reports amperes.
    pub battery_voltage: f64,
}

impl Default for DeriveOptions {
    fn default() -> Self {
        Self {
            battery_unit: BatteryUnit::Auto,
            battery_voltage: NOMINAL_BATTERY_VOLTAGE,
        }
    }
}

impl DeriveOptions {
    /// Pin the battery unit.
    #[must_use]
    pub fn battery_unit(mut self, unit: BatteryUnit) -> Self {
        self.battery_unit = unit;
        self
    }

    /// Set the pack voltage.
    #[must_use]
    pub fn battery_voltage(mut self, voltage: f64) -> Self {
        self.battery_voltage = voltage;
        self
    }

    /// Validate the options.
    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.battery_voltage.is_finite() || self.battery_voltage <= 0.0 {
            return Err(crate::error::Error::invalid_config(
                "battery_voltage must be a positive number",
            ));
        }
        Ok(())
    }
}

/// Share of house consumption not covered by grid import, in percent.
///
/// Works on unrounded watts. Returns 100 when the house draws nothing.
///
/// ```
/// use solarflow_core::derive::self_sufficiency;
///
/// assert_eq!(self_sufficiency(1000.0, 250.0), 75);
/// assert_eq!(self_sufficiency(1000.0, -400.0), 100);
/// assert_eq!(self_sufficiency(0.0, 300.0), 100);
/// ```
#[must_use]
pub fn self_sufficiency(house_watts: f64, grid_watts: f64) -> u8 {
    if house_watts <= 0.0 {
        return 100;
    }
    let imported = grid_watts.max(0.0);
    round_percent((house_watts - imported) / house_watts * 100.0)
}

/// Map a snapshot to a normalized [`EnergyState`].
///
/// Missing sensors and unreadable states count as zero.
/// `previous_price` is copied into the result so the price trend can be
/// computed from the state alone.
#[must_use]
pub fn derive_state(
    reading: &RawReading,
    sensors: &SensorMap,
    options: &DeriveOptions,
    previous_price: i64,
) -> EnergyState {
    let value = |kind: SensorKind| parse_optional(reading.state(sensors.get(kind)));

    let solar = value(SensorKind::SolarPower);
    let house = value(SensorKind::HouseConsumption);
    let grid = value(SensorKind::GridFlow);
    let battery = normalize_battery_power(
        value(SensorKind::BatteryCurrent),
        options.battery_unit,
        options.battery_voltage,
    );
    let price = reading
        .state(sensors.get(SensorKind::ElectricityPrice))
        .map_or(0, parse_price_cents);

    EnergyState {
        solar_power: round_watts(solar),
        battery_level: round_percent(value(SensorKind::BatterySoc)),
        battery_power: round_watts(battery),
        house_consumption: round_watts(house),
        grid_flow: round_watts(grid),
        daily_yield: round_tenth(value(SensorKind::YieldToday)),
        self_sufficiency: self_sufficiency(house, grid),
        electricity_price: price,
        previous_price,
        temperature: round_tenth(value(SensorKind::Temperature)),
        energy_forecast: round_tenth(value(SensorKind::EnergyForecast)),
    }
}
