//! Utility functions for CLI operations.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use solarflow_core::{DemoConnector, HassConnector, SourceConnector};

use crate::config::Config;

/// Build the connector for the configured source.
///
/// With `demo` set no token is needed; otherwise the Home Assistant
/// settings are validated before anything touches the network.
pub fn build_connector(config: &Config, demo: bool) -> Result<Arc<dyn SourceConnector>> {
    if demo {
        let interval = Duration::from_secs(config.dashboard.demo_interval_secs.max(1));
        return Ok(Arc::new(DemoConnector::new(config.sensors.clone(), interval)));
    }

    let connection = config.connection_config()?;
    Ok(Arc::new(HassConnector::new(
        connection,
        config.sensors.entity_ids(),
    )))
}

/// Name of the source for status messages.
pub fn source_label(config: &Config, demo: bool) -> String {
    if demo {
        "demo household".to_string()
    } else {
        config.home_assistant.url.clone()
    }
}

/// Write output to file or stdout
pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}

/// Append output to a file, or print it. Used by `watch`.
pub fn append_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            file.write_all(content.as_bytes())
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_connector_needs_no_token() {
        let config = Config::default();
        assert!(build_connector(&config, true).is_ok());
    }

    #[test]
    fn test_missing_token_is_reported() {
        let config = Config::default();
        let err = build_connector(&config, false).err().unwrap();
        assert!(err.to_string().contains("No Home Assistant access token"));
    }

    #[test]
    fn test_connector_with_token() {
        let config = Config::default().with_overrides(None, Some("abc".into()));
        assert!(build_connector(&config, false).is_ok());
    }

    #[test]
    fn test_append_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watch.csv");
        append_output(Some(&path), "a\n").unwrap();
        append_output(Some(&path), "b\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\nb\n");
    }

    #[test]
    fn test_write_output_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("read.json");
        write_output(Some(&path), "first").unwrap();
        write_output(Some(&path), "second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }
}
