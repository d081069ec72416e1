//! qwatch - live monitor for an LLM query event feed
//!
//! This library exposes modules for use in integration tests.

pub mod adapters;
pub mod backend;
pub mod clear;
pub mod cli;
pub mod cli_output;
pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod logging;
pub mod monitor;
pub mod sse;
pub mod stats;
pub mod store;
pub mod traits;

pub use clear::{ClearCommand, ClearError, ClearOutcome};
pub use config::MonitorConfig;
pub use error::{MonitorError, MonitorResult};
pub use events::{Event, EventCategory, EventKind};
pub use monitor::{Monitor, MonitorHandle};
pub use stats::StatsSnapshot;
