//! Configuration file management.
//!
//! The file lives at `<config dir>/solarflow/config.toml`. Every section is
//! optional; missing keys fall back to the built-in defaults. A few
//! environment variables override the file:
//!
//! | variable | overrides |
//! |----------|-----------|
//! | `SOLARFLOW_HA_URL` | `home_assistant.url` |
//! | `SOLARFLOW_HA_TOKEN` | `home_assistant.token` |
//! | `SOLARFLOW_SENSOR_<NAME>` | `sensors.<name>`, e.g. `SOLARFLOW_SENSOR_GRID_FLOW` |

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use solarflow_core::{
    BatteryUnit, ConnectionConfig, ConsumptionHistory, DeriveOptions, ReconnectOptions,
    SensorKind, SensorMap, SessionConfig,
};

/// Home Assistant URL used when nothing is configured.
pub const DEFAULT_URL: &str = "http://homeassistant.local:8123";

/// Prefix of the per-sensor environment overrides.
const SENSOR_ENV_PREFIX: &str = "SOLARFLOW_SENSOR_";

/// Shown instead of the access token.
const REDACTED: &str = "<redacted>";

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Connection settings.
    #[serde(default)]
    pub home_assistant: HomeAssistantConfig,

    /// Entity ids per quantity.
    #[serde(default)]
    pub sensors: SensorMap,

    /// Battery sensor interpretation.
    #[serde(default)]
    pub battery: BatteryConfig,

    /// Reconnect backoff.
    #[serde(default)]
    pub reconnect: ReconnectConfig,

    /// Dashboard and history settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// `[home_assistant]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeAssistantConfig {
    /// Base URL, e.g. `http://homeassistant.local:8123`.
    #[serde(default = "default_url")]
    pub url: String,

    /// Long-lived access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Handshake and subscription timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for HomeAssistantConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// `[battery]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryConfig {
    /// `auto`, `amperes` or `watts`.
    #[serde(default)]
    pub unit: BatteryUnit,

    /// Pack voltage used to convert amperes into watts.
    #[serde(default = "default_voltage")]
    pub voltage: f64,
}

fn default_voltage() -> f64 {
    solarflow_core::parse::NOMINAL_BATTERY_VOLTAGE
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            unit: BatteryUnit::default(),
            voltage: default_voltage(),
        }
    }
}

/// `[reconnect]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Give up after this many reconnect attempts (unset = never).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    /// Delay before the first reconnect attempt, in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Upper bound for the delay, in seconds.
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,

    /// Factor applied to the delay after every failed attempt.
    #[serde(default = "default_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_secs() -> u64 {
    60
}

fn default_multiplier() -> f64 {
    2.0
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_secs: default_max_delay_secs(),
            backoff_multiplier: default_multiplier(),
        }
    }
}

/// `[dashboard]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Flows at or below this many watts are hidden.
    #[serde(default)]
    pub flow_threshold: u64,

    /// Number of consumption samples kept for the trend.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Minimum spacing between consumption samples, in seconds.
    #[serde(default = "default_history_interval_secs")]
    pub history_interval_secs: u64,

    /// Seconds between snapshots of the demo source.
    #[serde(default = "default_demo_interval_secs")]
    pub demo_interval_secs: u64,

    /// Write dashboard logs to a file. When false they are discarded.
    #[serde(default = "default_true")]
    pub log_to_file: bool,

    /// Log file location (defaults to the data directory).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

fn default_history_capacity() -> usize {
    solarflow_core::history::DEFAULT_CAPACITY
}

fn default_history_interval_secs() -> u64 {
    solarflow_core::history::DEFAULT_MIN_INTERVAL.as_secs()
}

fn default_demo_interval_secs() -> u64 {
    2
}

fn default_true() -> bool {
    true
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            flow_threshold: 0,
            history_capacity: default_history_capacity(),
            history_interval_secs: default_history_interval_secs(),
            demo_interval_secs: default_demo_interval_secs(),
            log_to_file: true,
            log_file: None,
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("solarflow")
            .join("config.toml")
    }

    /// Default location of the dashboard log file.
    pub fn default_log_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("solarflow").join("dashboard.log"))
    }

    /// Load config from the default path plus environment overrides.
    ///
    /// A broken file is reported on stderr and replaced by the defaults.
    pub fn load() -> Self {
        Self::load_or_default(&Self::path())
    }

    /// Like [`Config::load`], for an explicit path.
    pub fn load_or_default(path: &Path) -> Self {
        let mut config = match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {:#}", e);
                Self::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Read a config file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    /// Save config to a file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        fs::write(path, self.to_toml()?)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Serialize as pretty TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("SOLARFLOW_HA_URL") {
            self.home_assistant.url = url;
        }
        if let Some(token) = get("SOLARFLOW_HA_TOKEN") {
            self.home_assistant.token = Some(token);
        }
        for kind in SensorKind::ALL {
            let key = format!("{}{}", SENSOR_ENV_PREFIX, kind.key().to_ascii_uppercase());
            if let Some(entity) = get(&key) {
                self.sensors.set(kind, entity.trim());
            }
        }
    }

    /// Apply `--url` / `--token` flags.
    pub fn with_overrides(mut self, url: Option<String>, token: Option<String>) -> Self {
        if let Some(url) = url {
            self.home_assistant.url = url;
        }
        if let Some(token) = token {
            self.home_assistant.token = Some(token);
        }
        self
    }

    /// Connection settings, failing early when the URL or token is missing.
    pub fn connection_config(&self) -> Result<ConnectionConfig> {
        let Some(token) = self
            .home_assistant
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
        else {
            bail!(
                "No Home Assistant access token configured.\n\
                 Set SOLARFLOW_HA_TOKEN, pass --token, or add `token` to the [home_assistant] \
                 section of {}",
                Self::path().display()
            );
        };

        let config = ConnectionConfig::new(self.home_assistant.url.trim(), token.trim())
            .timeout(Duration::from_secs(self.home_assistant.timeout_secs.max(1)));
        config
            .validate()
            .context("Invalid Home Assistant connection settings")?;
        Ok(config)
    }

    /// Derivation tunables from the `[battery]` section.
    pub fn derive_options(&self) -> DeriveOptions {
        DeriveOptions::default()
            .battery_unit(self.battery.unit)
            .battery_voltage(self.battery.voltage)
    }

    /// Backoff policy from the `[reconnect]` section.
    pub fn reconnect_options(&self) -> ReconnectOptions {
        let mut options = ReconnectOptions::default()
            .initial_delay(Duration::from_millis(self.reconnect.initial_delay_ms))
            .max_delay(Duration::from_secs(self.reconnect.max_delay_secs))
            .backoff_multiplier(self.reconnect.backoff_multiplier);
        if let Some(max) = self.reconnect.max_attempts {
            options = options.max_attempts(max);
        }
        options
    }

    /// Empty consumption history sized from the `[dashboard]` section.
    pub fn history(&self) -> ConsumptionHistory {
        ConsumptionHistory::with_limits(
            self.dashboard.history_capacity,
            Duration::from_secs(self.dashboard.history_interval_secs),
        )
    }

    /// Settings for a dashboard session.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            sensors: self.sensors.clone(),
            derive: self.derive_options(),
            flow_threshold: self.dashboard.flow_threshold,
        }
    }

    /// Check everything that does not need a connection.
    pub fn validate(&self) -> Result<()> {
        self.derive_options()
            .validate()
            .context("Invalid [battery] settings")?;
        self.reconnect_options()
            .validate()
            .context("Invalid [reconnect] settings")?;
        if self.dashboard.history_capacity == 0 {
            bail!("Invalid [dashboard] settings: history_capacity must be at least 1");
        }
        Ok(())
    }

    /// Copy with the access token masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.home_assistant.token.is_some() {
            copy.home_assistant.token = Some(REDACTED.to_string());
        }
        copy
    }

    /// Where the dashboard should log, if anywhere.
    pub fn log_path(&self) -> Option<PathBuf> {
        if !self.dashboard.log_to_file {
            return None;
        }
        self.dashboard
            .log_file
            .clone()
            .or_else(Self::default_log_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.home_assistant.url, DEFAULT_URL);
        assert!(config.home_assistant.token.is_none());
        assert_eq!(config.battery.voltage, 52.0);
        assert_eq!(config.dashboard.history_capacity, 240);
        assert_eq!(config.dashboard.history_interval_secs, 30);
        assert_eq!(config.sensors.get(SensorKind::GridFlow), "sensor.grid_power");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.home_assistant.token = Some("abc".into());
        config.battery.unit = BatteryUnit::Watts;
        config.reconnect.max_attempts = Some(5);
        config.sensors.set(SensorKind::SolarPower, "sensor.pv_total");
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[home_assistant]
token = "secret"

[sensors]
grid_flow = "sensor.netz"

[battery]
unit = "amperes"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.home_assistant.url, DEFAULT_URL);
        assert_eq!(config.home_assistant.token.as_deref(), Some("secret"));
        assert_eq!(config.sensors.get(SensorKind::GridFlow), "sensor.netz");
        assert_eq!(
            config.sensors.get(SensorKind::SolarPower),
            "sensor.solar_power"
        );
        assert_eq!(config.battery.unit, BatteryUnit::Amperes);
        assert_eq!(config.battery.voltage, 52.0);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[battery]\nunit = \"volts\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("SOLARFLOW_HA_URL", "https://ha.example.com"),
            ("SOLARFLOW_HA_TOKEN", "tok"),
            ("SOLARFLOW_SENSOR_BATTERY_SOC", " sensor.byd_soc "),
            ("SOLARFLOW_SENSOR_TEMPERATURE", ""),
        ]));

        assert_eq!(config.home_assistant.url, "https://ha.example.com");
        assert_eq!(config.home_assistant.token.as_deref(), Some("tok"));
        assert_eq!(config.sensors.get(SensorKind::BatterySoc), "sensor.byd_soc");
        assert_eq!(
            config.sensors.get(SensorKind::Temperature),
            "sensor.outdoor_temperature"
        );
    }

    #[test]
    fn test_flag_overrides_win() {
        let mut config = Config::default();
        config.apply_env(env(&[("SOLARFLOW_HA_TOKEN", "from-env")]));
        let config = config.with_overrides(None, Some("from-flag".into()));
        assert_eq!(config.home_assistant.token.as_deref(), Some("from-flag"));
        assert_eq!(config.home_assistant.url, DEFAULT_URL);
    }

    #[test]
    fn test_connection_config_requires_token() {
        let config = Config::default();
        let err = config.connection_config().unwrap_err();
        assert!(err.to_string().contains("access token"));

        let config = Config::default().with_overrides(None, Some("  ".into()));
        assert!(config.connection_config().is_err());
    }

    #[test]
    fn test_connection_config_rejects_bad_url() {
        let config = Config::default().with_overrides(Some("ftp://ha".into()), Some("t".into()));
        assert!(config.connection_config().is_err());
    }

    #[test]
    fn test_connection_config_ok() {
        let config = Config::default().with_overrides(None, Some("t".into()));
        let connection = config.connection_config().unwrap();
        assert_eq!(
            connection.websocket_url().unwrap(),
            "ws://homeassistant.local:8123/api/websocket"
        );
    }

    #[test]
    fn test_reconnect_options_mapping() {
        let mut config = Config::default();
        config.reconnect.max_attempts = Some(3);
        config.reconnect.initial_delay_ms = 500;
        let options = config.reconnect_options();
        assert_eq!(options.max_attempts, Some(3));
        assert_eq!(options.initial_delay, Duration::from_millis(500));
        assert_eq!(options.max_delay, Duration::from_secs(60));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.battery.voltage = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.dashboard.history_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_redacted_hides_token() {
        let config = Config::default().with_overrides(None, Some("super-secret".into()));
        let shown = config.redacted().to_toml().unwrap();
        assert!(!shown.contains("super-secret"));
        assert!(shown.contains(REDACTED));

        // No token, nothing to mask.
        assert!(Config::default().redacted().home_assistant.token.is_none());
    }

    #[test]
    fn test_session_config_carries_threshold() {
        let mut config = Config::default();
        config.dashboard.flow_threshold = 25;
        config.battery.unit = BatteryUnit::Watts;
        let session = config.session_config();
        assert_eq!(session.flow_threshold, 25);
        assert_eq!(session.derive.battery_unit, BatteryUnit::Watts);
    }

    #[test]
    fn test_log_path_disabled() {
        let mut config = Config::default();
        config.dashboard.log_to_file = false;
        assert!(config.log_path().is_none());

        config.dashboard.log_to_file = true;
        config.dashboard.log_file = Some(PathBuf::from("/tmp/sf.log"));
        assert_eq!(config.log_path(), Some(PathBuf::from("/tmp/sf.log")));
    }
}
