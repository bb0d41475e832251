//! Command implementations for the CLI.

mod config;
mod read;
mod watch;

pub use config::cmd_config;
pub use read::{ReadArgs, cmd_read};
pub use watch::{WatchArgs, cmd_watch};
