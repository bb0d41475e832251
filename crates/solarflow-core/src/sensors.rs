//! Mapping from logical energy quantities to Home Assistant entity ids.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A logical quantity the dashboard reads from one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    SolarPower,
    HouseConsumption,
    GridFlow,
    BatterySoc,
    BatteryCurrent,
    YieldToday,
    ElectricityPrice,
    EnergyForecast,
    Temperature,
}

impl SensorKind {
    /// Every kind, in configuration order.
    pub const ALL: [SensorKind; 9] = [
        SensorKind::SolarPower,
        SensorKind::HouseConsumption,
        SensorKind::GridFlow,
        SensorKind::BatterySoc,
        SensorKind::BatteryCurrent,
        SensorKind::YieldToday,
        SensorKind::ElectricityPrice,
        SensorKind::EnergyForecast,
        SensorKind::Temperature,
    ];

    /// Key used in the configuration file.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            SensorKind::SolarPower => "solar_power",
            SensorKind::HouseConsumption => "house_consumption",
            SensorKind::GridFlow => "grid_flow",
            SensorKind::BatterySoc => "battery_soc",
            SensorKind::BatteryCurrent => "battery_current",
            SensorKind::YieldToday => "yield_today",
            SensorKind::ElectricityPrice => "electricity_price",
            SensorKind::EnergyForecast => "energy_forecast",
            SensorKind::Temperature => "temperature",
        }
    }

    /// Entity id used when nothing is configured.
    #[must_use]
    pub const fn default_entity(&self) -> &'static str {
        match self {
            SensorKind::SolarPower => "sensor.solar_power",
            SensorKind::HouseConsumption => "sensor.house_consumption",
            SensorKind::GridFlow => "sensor.grid_power",
            SensorKind::BatterySoc => "sensor.battery_soc",
            SensorKind::BatteryCurrent => "sensor.battery_current",
            SensorKind::YieldToday => "sensor.solar_yield_today",
            SensorKind::ElectricityPrice => "sensor.electricity_price",
            SensorKind::EnergyForecast => "sensor.energy_production_today",
            SensorKind::Temperature => "sensor.outdoor_temperature",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SensorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        SensorKind::ALL
            .into_iter()
            .find(|kind| kind.key() == normalized)
            .ok_or_else(|| Error::invalid_config(format!("unknown sensor '{s}'")))
    }
}

fn default_solar_power() -> String {
    SensorKind::SolarPower.default_entity().to_string()
}
fn default_house_consumption() -> String {
    SensorKind::HouseConsumption.default_entity().to_string()
}
fn default_grid_flow() -> String {
    SensorKind::GridFlow.default_entity().to_string()
}
fn default_battery_soc() -> String {
    SensorKind::BatterySoc.default_entity().to_string()
}
fn default_battery_current() -> String {
    SensorKind::BatteryCurrent.default_entity().to_string()
}
fn default_yield_today() -> String {
    SensorKind::YieldToday.default_entity().to_string()
}
fn default_electricity_price() -> String {
    SensorKind::ElectricityPrice.default_entity().to_string()
}
fn default_energy_forecast() -> String {
    SensorKind::EnergyForecast.default_entity().to_string()
}
fn default_temperature() -> String {
    SensorKind::Temperature.default_entity().to_string()
}

/// Entity ids for every [`SensorKind`].
///
/// Missing keys in a configuration file fall back to the defaults, so a
/// file only needs to list the sensors that differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorMap {
    #[serde(default = "default_solar_power")]
    pub solar_power: String,
    #[serde(default = "default_house_consumption")]
    pub house_consumption: String,
    #[serde(default = "default_grid_flow")]
    pub grid_flow: String,
    #[serde(default = "default_battery_soc")]
    pub battery_soc: String,
    #[serde(default = "default_battery_current")]
    pub battery_current: String,
    #[serde(default = "default_yield_today")]
    pub yield_today: String,
    #[serde(default = "default_electricity_price")]
    pub electricity_price: String,
    #[serde(default = "default_energy_forecast")]
    pub energy_forecast: String,
    #[serde(default = "default_temperature")]
    pub temperature: String,
}

impl Default for SensorMap {
    fn default() -> Self {
        Self {
            solar_power: default_solar_power(),
            house_consumption: default_house_consumption(),
            grid_flow: default_grid_flow(),
            battery_soc: default_battery_soc(),
            battery_current: default_battery_current(),
            yield_today: default_yield_today(),
            electricity_price: default_electricity_price(),
            energy_forecast: default_energy_forecast(),
            temperature: default_temperature(),
        }
    }
}

impl SensorMap {
    /// Entity id configured for a kind.
    #[must_use]
    pub fn get(&self, kind: SensorKind) -> &str {
        match kind {
            SensorKind::SolarPower => &self.solar_power,
            SensorKind::HouseConsumption => &self.house_consumption,
            SensorKind::GridFlow => &self.grid_flow,
            SensorKind::BatterySoc => &self.battery_soc,
            SensorKind::BatteryCurrent => &self.battery_current,
            SensorKind::YieldToday => &self.yield_today,
            SensorKind::ElectricityPrice => &self.electricity_price,
            SensorKind::EnergyForecast => &self.energy_forecast,
            SensorKind::Temperature => &self.temperature,
        }
    }

    /// Replace the entity id for a kind.
    pub fn set(&mut self, kind: SensorKind, entity_id: impl Into<String>) {
        let slot = match kind {
            SensorKind::SolarPower => &mut self.solar_power,
            SensorKind::HouseConsumption => &mut self.house_consumption,
            SensorKind::GridFlow => &mut self.grid_flow,
            SensorKind::BatterySoc => &mut self.battery_soc,
            SensorKind::BatteryCurrent => &mut self.battery_current,
            SensorKind::YieldToday => &mut self.yield_today,
            SensorKind::ElectricityPrice => &mut self.electricity_price,
            SensorKind::EnergyForecast => &mut self.energy_forecast,
            SensorKind::Temperature => &mut self.temperature,
        };
        *slot = entity_id.into();
    }

    /// Distinct, non-empty entity ids to subscribe to.
    #[must_use]
    pub fn entity_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::with_capacity(SensorKind::ALL.len());
        for kind in SensorKind::ALL {
            let id = self.get(kind).trim();
            if !id.is_empty() && !ids.iter().any(|existing| existing == id) {
                ids.push(id.to_string());
            }
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_dashboard_defaults() {
        let map = SensorMap::default();
        assert_eq!(map.grid_flow, "sensor.grid_power");
        assert_eq!(map.yield_today, "sensor.solar_yield_today");
        assert_eq!(map.energy_forecast, "sensor.energy_production_today");
        assert_eq!(map.entity_ids().len(), 9);
    }

    #[test]
    fn test_partial_map_uses_defaults() {
        let map: SensorMap = from_json(r#"{"solar_power":"sensor.pv_now"}"#);
        assert_eq!(map.solar_power, "sensor.pv_now");
        assert_eq!(map.battery_soc, "sensor.battery_soc");
    }

    fn from_json(json: &str) -> SensorMap {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_entity_ids_skip_blank_and_duplicates() {
        let mut map = SensorMap::default();
        map.set(SensorKind::Temperature, "");
        map.set(SensorKind::EnergyForecast, "sensor.solar_power");
        let ids = map.entity_ids();
        assert_eq!(ids.len(), 7);
        assert_eq!(ids[0], "sensor.solar_power");
    }

    #[test]
    fn test_get_set_round_trip() {
        let mut map = SensorMap::default();
        for kind in SensorKind::ALL {
            map.set(kind, format!("sensor.custom_{}", kind.key()));
        }
        for kind in SensorKind::ALL {
            assert_eq!(map.get(kind), format!("sensor.custom_{}", kind.key()));
        }
    }

    #[test]
    fn test_sensor_kind_from_str() {
        assert_eq!(
            "battery-current".parse::<SensorKind>().unwrap(),
            SensorKind::BatteryCurrent
        );
        assert_eq!(
            "YIELD_TODAY".parse::<SensorKind>().unwrap(),
            SensorKind::YieldToday
        );
        assert!("wind_speed".parse::<SensorKind>().is_err());
    }
}
