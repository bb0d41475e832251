//! Read command implementation.
//!
//! Connects once, waits for the first complete snapshot and prints the
//! derived state with its active flows.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use time::OffsetDateTime;
use tracing::debug;

use solarflow_core::{DashboardSession, RawReading};

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::format::{FormatOptions, format_view_csv, format_view_json, format_view_text};
use crate::style;
use crate::util::{build_connector, source_label, write_output};

/// Arguments for the read command.
pub struct ReadArgs<'a> {
    pub config: &'a Config,
    pub demo: bool,
    pub timeout: Duration,
    pub format: OutputFormat,
    pub output: Option<&'a PathBuf>,
    pub quiet: bool,
    pub opts: &'a FormatOptions,
}

pub async fn cmd_read(args: ReadArgs<'_>) -> Result<()> {
    let ReadArgs {
        config,
        demo,
        timeout,
        format,
        output,
        quiet,
        opts,
    } = args;

    config.validate()?;
    let connector = build_connector(config, demo)?;
    let label = source_label(config, demo);

    let show_progress = !quiet && matches!(format, OutputFormat::Text) && io::stderr().is_terminal();
    let spinner = show_progress.then(|| style::connecting_spinner(&label));

    let result = tokio::time::timeout(timeout, async {
        let mut source = connector
            .connect()
            .await
            .with_context(|| format!("Failed to connect to {}", label))?;
        debug!(source = %source.describe(), "Connected");
        let reading = source
            .next_snapshot()
            .await
            .context("Failed to read sensor states")?;
        source.close().await.ok();
        Ok::<Option<RawReading>, anyhow::Error>(reading)
    })
    .await;

    if let Some(sp) = spinner {
        sp.finish_and_clear();
    }

    let reading = match result {
        Ok(reading) => reading?,
        Err(_) => bail!(
            "Timed out after {}s waiting for the first snapshot from {}",
            timeout.as_secs(),
            label
        ),
    };
    let Some(reading) = reading else {
        bail!("{} closed the connection before sending any states", label);
    };

    let now = OffsetDateTime::now_utc();
    let mut session = DashboardSession::with_history(config.session_config(), config.history());
    let view = session.apply(&reading, now);

    let content = match format {
        OutputFormat::Json => format_view_json(&view, now, opts)?,
        OutputFormat::Csv => format_view_csv(&view, now, opts),
        OutputFormat::Text => format_view_text(&view, opts),
    };

    write_output(output, &content)?;
    Ok(())
}
