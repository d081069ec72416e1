//! Monitor configuration.
//!
//! Built from defaults, then environment variables, then CLI overrides.
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `QWATCH_URL` | Backend base URL |
//! | `QWATCH_RECONNECT_MS` | Reconnect delay |
//! | `QWATCH_RECONNECT_MAX_MS` | Enables exponential backoff, capped at this delay |
//! | `QWATCH_MAX_RECONNECTS` | Consecutive failures before giving up |
//! | `QWATCH_STATS_INTERVAL_MS` | Stats refresh period |
//! | `QWATCH_RECENT_CAPACITY` | Size of the recent-events buffer |
//! | `QWATCH_HISTORY_LIMIT` | Cap on retained history (unbounded when unset) |
//! | `QWATCH_REQUEST_TIMEOUT_MS` | Bound on clear, health and stats requests |

use std::time::Duration;

use thiserror::Error;

use crate::connection::{Backoff, ReconnectPolicy};
use crate::store::{DEFAULT_RECENT_CAPACITY, MAX_RECENT_CAPACITY};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_STATS_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_URL: &str = "QWATCH_URL";
pub const ENV_RECONNECT_MS: &str = "QWATCH_RECONNECT_MS";
pub const ENV_RECONNECT_MAX_MS: &str = "QWATCH_RECONNECT_MAX_MS";
pub const ENV_MAX_RECONNECTS: &str = "QWATCH_MAX_RECONNECTS";
pub const ENV_STATS_INTERVAL_MS: &str = "QWATCH_STATS_INTERVAL_MS";
pub const ENV_RECENT_CAPACITY: &str = "QWATCH_RECENT_CAPACITY";
pub const ENV_HISTORY_LIMIT: &str = "QWATCH_HISTORY_LIMIT";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "QWATCH_REQUEST_TIMEOUT_MS";

/// Invalid configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// The backend URL is not an http(s) URL.
    #[error("invalid backend URL {0:?}: expected http:// or https://")]
    InvalidUrl(String),

    /// A setting is out of range.
    #[error("invalid {field}: {reason}")]
    OutOfRange { field: &'static str, reason: String },
}

/// Everything needed to start a [`Monitor`](crate::monitor::Monitor).
///
/// # Example
///
/// ```ignore
/// use qwatch::config::MonitorConfig;
///
/// let config = MonitorConfig::default()
///     .with_base_url("http://192.168.1.102:8080")
///     .with_history_limit(Some(10_000));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Backend base URL, without trailing slash
    pub base_url: String,
    pub reconnect: ReconnectPolicy,
    /// Period of the stats refresh
    pub stats_interval: Duration,
    /// Size of the recent-events buffer
    pub recent_capacity: usize,
    /// Cap on retained history; `None` keeps everything
    pub history_limit: Option<usize>,
    /// Bound on establishing a connection (not on reading the stream)
    pub connect_timeout: Duration,
    /// Bound on a whole non-streaming request, reply body included
    pub request_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            reconnect: ReconnectPolicy::default(),
            stats_interval: DEFAULT_STATS_INTERVAL,
            recent_capacity: DEFAULT_RECENT_CAPACITY,
            history_limit: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

impl MonitorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    pub fn with_stats_interval(mut self, interval: Duration) -> Self {
        self.stats_interval = interval;
        self
    }

    pub fn with_recent_capacity(mut self, capacity: usize) -> Self {
        self.recent_capacity = capacity;
        self
    }

    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Defaults overridden by the `QWATCH_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_URL) {
            config = config.with_base_url(url.trim());
        }
        if let Some(value) = lookup(ENV_RECONNECT_MS) {
            let ms: u64 = parse_var(ENV_RECONNECT_MS, &value)?;
            config.reconnect.delay = Duration::from_millis(ms);
        }
        if let Some(value) = lookup(ENV_RECONNECT_MAX_MS) {
            let ms: u64 = parse_var(ENV_RECONNECT_MAX_MS, &value)?;
            config.reconnect.backoff = Backoff::Exponential {
                max_delay: Duration::from_millis(ms),
            };
        }
        if let Some(value) = lookup(ENV_MAX_RECONNECTS) {
            config.reconnect.max_attempts = Some(parse_var(ENV_MAX_RECONNECTS, &value)?);
        }
        if let Some(value) = lookup(ENV_STATS_INTERVAL_MS) {
            let ms: u64 = parse_var(ENV_STATS_INTERVAL_MS, &value)?;
            config.stats_interval = Duration::from_millis(ms);
        }
        if let Some(value) = lookup(ENV_RECENT_CAPACITY) {
            config.recent_capacity = parse_var(ENV_RECENT_CAPACITY, &value)?;
        }
        if let Some(value) = lookup(ENV_HISTORY_LIMIT) {
            config.history_limit = Some(parse_var(ENV_HISTORY_LIMIT, &value)?);
        }
        if let Some(value) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            let ms: u64 = parse_var(ENV_REQUEST_TIMEOUT_MS, &value)?;
            config.request_timeout = Duration::from_millis(ms);
        }

        Ok(config)
    }

    /// Check that every setting is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let has_host = self
            .base_url
            .strip_prefix("http://")
            .or_else(|| self.base_url.strip_prefix("https://"))
            .map_or(false, |rest| !rest.is_empty());
        if !has_host {
            return Err(ConfigError::InvalidUrl(self.base_url.clone()));
        }

        if self.reconnect.delay.is_zero() {
            return Err(ConfigError::OutOfRange {
                field: "reconnect delay",
                reason: "must be greater than zero".to_string(),
            });
        }
        if let Backoff::Exponential { max_delay } = self.reconnect.backoff {
            if max_delay < self.reconnect.delay {
                return Err(ConfigError::OutOfRange {
                    field: "reconnect max delay",
                    reason: format!(
                        "{}ms is below the base delay of {}ms",
                        max_delay.as_millis(),
                        self.reconnect.delay.as_millis()
                    ),
                });
            }
        }
        if self.stats_interval.is_zero() {
            return Err(ConfigError::OutOfRange {
                field: "stats interval",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.recent_capacity == 0 {
            return Err(ConfigError::OutOfRange {
                field: "recent capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.recent_capacity > MAX_RECENT_CAPACITY {
            return Err(ConfigError::OutOfRange {
                field: "recent capacity",
                reason: format!("must be at most {}", MAX_RECENT_CAPACITY),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::OutOfRange {
                field: "request timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.history_limit == Some(0) {
            return Err(ConfigError::OutOfRange {
                field: "history limit",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}
