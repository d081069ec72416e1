//! CLI module for qwatch.
//!
//! This module provides the command-line interface:
//! - Argument parsing (`clap` derive)
//! - `watch`: follow the live feed
//! - `clear`: drop the backend's retained events
//! - `status`: backend health and retention
//!
//! # Usage
//!
//! ```ignore
//! use clap::Parser;
//! use qwatch::cli::{run_cli_command, Cli};
//!
//! let cli = Cli::parse();
//! run_cli_command(cli).await?;
//! ```

pub mod args;
pub mod clear;
pub mod status;
pub mod watch;

pub use args::{Cli, Command, WatchArgs};

use color_eyre::{Report, Result, Section};

use crate::error::MonitorError;

/// Turn a monitor error into a report carrying its user message and
/// recovery hint.
pub fn report(err: impl Into<MonitorError>) -> Report {
    let err = err.into();
    let message = err.user_message();
    let hint = err.recovery_hint();
    Report::new(err).note(message).suggestion(hint)
}

/// Run the parsed command to completion.
pub async fn run_cli_command(cli: Cli) -> Result<()> {
    let config = cli.monitor_config().map_err(report)?;
    match cli.command {
        Command::Watch(args) => watch::run(config, args).await,
        Command::Clear => clear::run(config).await,
        Command::Status { json } => status::run(config, json).await,
    }
}
