//! Reconnect scheduling.

use std::time::Duration;

/// Default delay before reconnecting after a failure.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// How the delay grows across consecutive failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Same delay every time
    #[default]
    Fixed,
    /// Doubling delay, capped at `max_delay`
    Exponential { max_delay: Duration },
}

/// When and how often the feed connection is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Base delay before a reconnect
    pub delay: Duration,
    pub backoff: Backoff,
    /// Consecutive failures tolerated before giving up (`None` retries forever)
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RECONNECT_DELAY,
            backoff: Backoff::Fixed,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_exponential_backoff(mut self, max_delay: Duration) -> Self {
        self.backoff = Backoff::Exponential { max_delay };
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Delay before reconnect number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential { max_delay } => {
                // delay, 2*delay, 4*delay, ... capped at max_delay
                let shift = attempt.saturating_sub(1).min(31);
                std::cmp::min(self.delay.saturating_mul(1u32 << shift), max_delay)
            }
        }
    }

    /// Whether reconnect number `attempt` may be scheduled.
    pub fn allows(&self, attempt: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempt <= max)
    }
}
