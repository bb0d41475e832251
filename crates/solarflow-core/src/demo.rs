//! Synthetic telemetry for running the dashboard without Home Assistant.
//!
//! The demo household has a 6 kWp array, a 10 kWh battery and a base load
//! with periodic appliance bumps. Sensor text is produced in the same
//! shapes Home Assistant uses (battery current in amperes, price with a
//! decimal comma) so the whole derivation path is exercised.

use std::f64::consts::PI;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use solarflow_types::RawReading;

use crate::error::Result;
use crate::parse::NOMINAL_BATTERY_VOLTAGE;
use crate::sensors::{SensorKind, SensorMap};
use crate::traits::{SourceConnector, TelemetrySource};

const PEAK_SOLAR_WATTS: f64 = 5200.0;
const BATTERY_CAPACITY_WH: f64 = 10_000.0;
const MAX_BATTERY_WATTS: f64 = 2500.0;
/// Simulated minutes that pass per tick.
const MINUTES_PER_TICK: f64 = 2.0;

/// State of the simulated household.
#[derive(Debug, Clone)]
pub struct DemoModel {
    minute_of_day: f64,
    soc: f64,
    yield_kwh: f64,
}

impl Default for DemoModel {
    fn default() -> Self {
        Self::starting_at(10 * 60)
    }
}

impl DemoModel {
    /// Start the simulation at the given minute of the day.
    pub fn starting_at(minute_of_day: u32) -> Self {
        let minute = f64::from(minute_of_day % 1440);
        Self {
            minute_of_day: minute,
            soc: 55.0,
            yield_kwh: solar_energy_until(minute),
        }
    }

    /// Advance one tick and render the sensor snapshot.
    pub fn tick(&mut self, sensors: &SensorMap) -> RawReading {
        let minute = self.minute_of_day;
        let solar = solar_watts(minute);
        let house = house_watts(minute);

        let surplus = solar - house;
        let battery = if surplus > 0.0 && self.soc < 100.0 {
            surplus.min(MAX_BATTERY_WATTS)
        } else if surplus < 0.0 && self.soc > 10.0 {
            surplus.max(-MAX_BATTERY_WATTS)
        } else {
            0.0
        };
        let grid = house + battery - solar;

        let hours = MINUTES_PER_TICK / 60.0;
        self.soc = (self.soc + battery * hours / BATTERY_CAPACITY_WH * 100.0).clamp(0.0, 100.0);
        self.yield_kwh += solar * hours / 1000.0;

        let amps = battery / NOMINAL_BATTERY_VOLTAGE;
        let price = 0.28 + 0.06 * ((minute - 18.0 * 60.0) / 1440.0 * 2.0 * PI).cos();
        let temperature = 12.0 + 7.0 * ((minute - 15.0 * 60.0) / 1440.0 * 2.0 * PI).cos();

        let reading = RawReading::new()
            .with(sensors.get(SensorKind::SolarPower), format!("{solar:.0}"))
            .with(sensors.get(SensorKind::HouseConsumption), format!("{house:.0}"))
            .with(sensors.get(SensorKind::GridFlow), format!("{grid:.0}"))
            .with(sensors.get(SensorKind::BatterySoc), format!("{:.0}", self.soc))
            .with(sensors.get(SensorKind::BatteryCurrent), format!("{amps:.1}"))
            .with(
                sensors.get(SensorKind::YieldToday),
                format!("{:.2}", self.yield_kwh),
            )
            .with(
                sensors.get(SensorKind::ElectricityPrice),
                format!("{price:.3} EUR/kWh").replacen('.', ",", 1),
            )
            .with(sensors.get(SensorKind::EnergyForecast), "31.4")
            .with(
                sensors.get(SensorKind::Temperature),
                format!("{temperature:.1}"),
            );

        self.minute_of_day += MINUTES_PER_TICK;
        if self.minute_of_day >= 1440.0 {
            self.minute_of_day -= 1440.0;
            self.yield_kwh = 0.0;
        }

        reading
    }
}

fn solar_watts(minute: f64) -> f64 {
    // Daylight from 06:00 to 20:00.
    let t = (minute - 360.0) / 840.0;
    if !(0.0..=1.0).contains(&t) {
        return 0.0;
    }
    let clouds = 0.85 + 0.15 * (minute / 7.0).sin();
    PEAK_SOLAR_WATTS * (t * PI).sin().powf(1.5) * clouds
}

fn solar_energy_until(minute: f64) -> f64 {
    let mut kwh = 0.0;
    let mut m = 0.0;
    while m < minute {
        kwh += solar_watts(m) * (MINUTES_PER_TICK / 60.0) / 1000.0;
        m += MINUTES_PER_TICK;
    }
    kwh
}

fn house_watts(minute: f64) -> f64 {
    let base = 380.0 + 120.0 * (minute / 90.0).sin();
    let evening = if (17.0 * 60.0..22.0 * 60.0).contains(&minute) {
        900.0
    } else {
        0.0
    };
    // Dishwasher or kettle every couple of hours.
    let appliance = if (minute as u32 % 150) < 12 { 1800.0 } else { 0.0 };
    base + evening + appliance
}

/// A [`TelemetrySource`] backed by [`DemoModel`].
#[derive(Debug)]
pub struct DemoSource {
    model: DemoModel,
    sensors: SensorMap,
    interval: Duration,
    started: bool,
}

impl DemoSource {
    /// Create a source emitting one snapshot per `interval`.
    pub fn new(sensors: SensorMap, interval: Duration) -> Self {
        Self {
            model: DemoModel::default(),
            sensors,
            interval,
            started: false,
        }
    }

    /// Replace the simulation model.
    #[must_use]
    pub fn with_model(mut self, model: DemoModel) -> Self {
        self.model = model;
        self
    }
}

#[async_trait]
impl TelemetrySource for DemoSource {
    async fn next_snapshot(&mut self) -> Result<Option<RawReading>> {
        if self.started {
            tokio::time::sleep(self.interval).await;
        }
        self.started = true;
        Ok(Some(self.model.tick(&self.sensors)))
    }

    async fn close(&mut self) -> Result<()> {
        debug!("Demo source closed");
        Ok(())
    }

    fn describe(&self) -> String {
        "demo".to_string()
    }
}

/// Connector that always succeeds with a fresh [`DemoSource`].
#[derive(Debug, Clone)]
pub struct DemoConnector {
    sensors: SensorMap,
    interval: Duration,
}

impl DemoConnector {
    /// Create a demo connector.
    pub fn new(sensors: SensorMap, interval: Duration) -> Self {
        Self { sensors, interval }
    }
}

#[async_trait]
impl SourceConnector for DemoConnector {
    async fn connect(&self) -> Result<Box<dyn TelemetrySource>> {
        Ok(Box::new(DemoSource::new(
            self.sensors.clone(),
            self.interval,
        )))
    }
}
