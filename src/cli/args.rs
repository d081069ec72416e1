//! Command-line definition for `qwatch`.

use clap::{Args, Parser, Subcommand};

use crate::config::{ConfigError, MonitorConfig, ENV_URL};

#[derive(Debug, Parser)]
#[command(
    name = "qwatch",
    version,
    about = "Live monitor for an LLM query event feed"
)]
pub struct Cli {
    /// Backend base URL (overrides QWATCH_URL env var)
    #[arg(long, env = ENV_URL)]
    pub url: Option<String>,

    /// Log at debug level to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Follow the live feed and print each event
    Watch(WatchArgs),

    /// Clear the backend's retained events
    Clear,

    /// Show backend health and retained event counts
    Status {
        /// Print the reports as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct WatchArgs {
    /// Print events as JSON lines instead of text
    #[arg(long)]
    pub json: bool,

    /// Do not print heartbeat events
    #[arg(long)]
    pub quiet_heartbeats: bool,

    /// Stop after this many failed reconnects in a row
    #[arg(long)]
    pub max_reconnects: Option<u32>,

    /// Print the prompt log when the watch ends
    #[arg(long)]
    pub prompts: bool,
}

impl Cli {
    /// Environment configuration with the command-line overrides applied.
    pub fn monitor_config(&self) -> Result<MonitorConfig, ConfigError> {
        let mut config = MonitorConfig::from_env()?;
        if let Some(url) = &self.url {
            config = config.with_base_url(url.clone());
        }
        if let Command::Watch(WatchArgs {
            max_reconnects: Some(max),
            ..
        }) = &self.command
        {
            let policy = config.reconnect.with_max_attempts(Some(*max));
            config = config.with_reconnect(policy);
        }
        config.validate()?;
        Ok(config)
    }
}
