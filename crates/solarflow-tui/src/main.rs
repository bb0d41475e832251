use std::env;
use std::path::PathBuf;

use anyhow::{Result, bail};
use solarflow_cli::config::Config;
use solarflow_cli::tui::{self, TuiOptions};

const USAGE: &str = "Usage: solarflow-tui [--demo]

Options:
  --demo       Use the built-in demo household instead of Home Assistant
  -h, --help   Print help

Settings are read from SOLARFLOW_CONFIG or the default config file;
SOLARFLOW_HA_URL and SOLARFLOW_HA_TOKEN override the connection.";

#[tokio::main]
async fn main() -> Result<()> {
    human_panic::setup_panic!();

    let mut demo = false;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--demo" => demo = true,
            "-h" | "--help" => {
                println!("{}", USAGE);
                return Ok(());
            }
            other => bail!("Unknown argument: {}\n\n{}", other, USAGE),
        }
    }

    let path = env::var_os("SOLARFLOW_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(Config::path);
    let config = Config::load_or_default(&path);

    tui::run(TuiOptions { config, demo }).await
}
