//! Watch command implementation.
//!
//! Runs a [`SnapshotStream`], which keeps one subscription open and
//! reconnects with exponential backoff when it drops. Status changes go to
//! stderr, snapshots to stdout (or the output file).

use std::path::PathBuf;

use anyhow::{Result, bail};
use owo_colors::OwoColorize;
use time::OffsetDateTime;

use solarflow_core::{DashboardSession, SnapshotStream, StreamOptions, TelemetryEvent};

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::format::{
    FormatOptions, format_csv_header, format_csv_line, format_event_status, format_view_json,
    format_watch_line,
};
use crate::style;
use crate::util::{append_output, build_connector, source_label, write_output};

/// Arguments for the watch command.
pub struct WatchArgs<'a> {
    pub config: &'a Config,
    pub demo: bool,
    pub count: u32,
    pub format: OutputFormat,
    pub output: Option<&'a PathBuf>,
    pub quiet: bool,
    pub opts: &'a FormatOptions,
}

pub async fn cmd_watch(args: WatchArgs<'_>) -> Result<()> {
    let WatchArgs {
        config,
        demo,
        count,
        format,
        output,
        quiet,
        opts,
    } = args;

    config.validate()?;
    let connector = build_connector(config, demo)?;
    let label = source_label(config, demo);

    let options = StreamOptions::builder()
        .reconnect(config.reconnect_options())
        .build();
    let mut stream = SnapshotStream::spawn_shared(connector, options);
    let mut session = DashboardSession::with_history(config.session_config(), config.history());

    if !quiet {
        let header = if opts.no_color {
            format!("Watching: {}", label)
        } else {
            format!("Watching: {}", label.cyan())
        };
        eprintln!("{}", header);
        if count > 0 {
            eprintln!("Count: {} | Press Ctrl+C to stop", count);
        } else {
            eprintln!("Press Ctrl+C to stop");
        }
        eprintln!("{}", "-".repeat(50));
    }

    // Truncate the output file once, then append per snapshot.
    if let Some(path) = output {
        write_output(Some(path), "")?;
    }

    let mut header_written = opts.no_header;
    let mut printed: u32 = 0;

    loop {
        let event = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                if !quiet {
                    eprintln!("\nShutting down...");
                }
                break;
            }
            event = stream.recv() => event,
        };

        let Some(event) = event else {
            break;
        };

        let now = OffsetDateTime::now_utc();
        let view = session.handle_event(&event, now);

        if let TelemetryEvent::GaveUp { attempts } = &event {
            stream.close();
            bail!(
                "Lost connection to {} and gave up after {} reconnect attempts",
                label,
                attempts
            );
        }

        let Some(view) = view else {
            if !quiet && let Some(status) = format_event_status(&event) {
                let line = match &event {
                    TelemetryEvent::Connected { .. } => style::format_success(&status, opts.no_color),
                    _ => style::format_warning(&status, opts.no_color),
                };
                eprintln!("{}", line);
            }
            continue;
        };

        let content = match format {
            OutputFormat::Json => format_view_json(&view, now, &opts.with_compact(true))?,
            OutputFormat::Csv => {
                let mut out = String::new();
                if !header_written {
                    out.push_str(&format_csv_header());
                    header_written = true;
                }
                out.push_str(&format_csv_line(&view, now));
                out
            }
            OutputFormat::Text => format_watch_line(&view, now, opts),
        };
        append_output(output, &content)?;

        printed += 1;
        if count > 0 && printed >= count {
            if !quiet {
                eprintln!("Completed {} snapshots.", printed);
            }
            break;
        }
    }

    stream.close();
    Ok(())
}
