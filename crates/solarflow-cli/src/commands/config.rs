//! Config command implementation.

use std::path::Path;

use anyhow::{Result, bail};

use crate::cli::ConfigAction;
use crate::config::Config;
use crate::style;

pub fn cmd_config(action: ConfigAction, path: &Path, no_color: bool) -> Result<()> {
    match action {
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Show => {
            let config = Config::load_or_default(path);
            if !path.exists() {
                eprintln!(
                    "{}",
                    style::format_info(
                        &format!("No config file at {}, showing defaults", path.display()),
                        no_color
                    )
                );
            }
            print!("{}", config.redacted().to_toml()?);
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                bail!(
                    "Config file already exists: {}\nUse --force to overwrite it.",
                    path.display()
                );
            }
            Config::default().save_to(path)?;
            println!(
                "{}",
                style::format_success(&format!("Wrote {}", path.display()), no_color)
            );
        }
    }
    Ok(())
}
