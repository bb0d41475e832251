use std::io;
use std::time::Duration;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use solarflow_cli::cli::{Cli, Commands, OutputArgs, SourceArgs};
use solarflow_cli::commands::{ReadArgs, WatchArgs, cmd_config, cmd_read, cmd_watch};
use solarflow_cli::config::Config;
use solarflow_cli::format::FormatOptions;

fn load_config(cli: &Cli, source: &SourceArgs) -> Config {
    let path = cli.config.clone().unwrap_or_else(Config::path);
    Config::load_or_default(&path).with_overrides(source.url.clone(), source.token.clone())
}

fn format_options(cli: &Cli, output: &OutputArgs) -> FormatOptions {
    FormatOptions::new(cli.no_color)
        .with_compact(output.compact)
        .with_no_header(output.no_header)
}

fn init_tracing(cli: &Cli) {
    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "solarflow", &mut io::stdout());
        return Ok(());
    }

    // The dashboard owns the terminal and sets up its own file logging
    #[cfg(feature = "tui")]
    if let Commands::Dashboard { source } = &cli.command {
        let config = load_config(&cli, source);
        return solarflow_cli::tui::run(solarflow_cli::tui::TuiOptions {
            config,
            demo: source.demo,
        })
        .await;
    }

    init_tracing(&cli);

    match &cli.command {
        Commands::Read {
            source,
            output,
            timeout,
        } => {
            let config = load_config(&cli, source);
            let opts = format_options(&cli, output);
            cmd_read(ReadArgs {
                config: &config,
                demo: source.demo,
                timeout: Duration::from_secs((*timeout).max(1)),
                format: output.format,
                output: cli.output.as_ref(),
                quiet: cli.quiet,
                opts: &opts,
            })
            .await?;
        }
        Commands::Watch {
            source,
            output,
            count,
        } => {
            let config = load_config(&cli, source);
            let opts = format_options(&cli, output);
            cmd_watch(WatchArgs {
                config: &config,
                demo: source.demo,
                count: *count,
                format: output.format,
                output: cli.output.as_ref(),
                quiet: cli.quiet,
                opts: &opts,
            })
            .await?;
        }
        Commands::Config { action } => {
            let path = cli.config.clone().unwrap_or_else(Config::path);
            cmd_config(action.clone(), &path, cli.no_color)?;
        }
        #[cfg(feature = "tui")]
        Commands::Dashboard { .. } => unreachable!("handled before tracing init"),
        Commands::Completions { .. } => unreachable!("handled before tracing init"),
    }

    Ok(())
}
