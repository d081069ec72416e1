//! Connection lifecycle states.

use std::fmt;
use std::time::Duration;

/// Where the feed connection is in its lifecycle.
///
/// `attempt` counts consecutive failed connections; it is zero for the
/// initial connect and after every successful open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting {
        attempt: u32,
    },
    Connected,
    ReconnectPending {
        attempt: u32,
        delay: Duration,
    },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// Check if a reconnect is scheduled or in progress.
    pub fn is_reconnecting(&self) -> bool {
        self.reconnection_attempt().is_some()
    }

    /// Get the current reconnection attempt number, if reconnecting.
    pub fn reconnection_attempt(&self) -> Option<u32> {
        match *self {
            ConnectionState::ReconnectPending { attempt, .. } => Some(attempt),
            ConnectionState::Connecting { attempt } if attempt > 0 => Some(attempt),
            _ => None,
        }
    }

    /// Short label for status lines.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting { .. } => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::ReconnectPending { .. } => "reconnecting",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting { attempt } if *attempt > 0 => {
                write!(f, "connecting (attempt {})", attempt)
            }
            ConnectionState::ReconnectPending { attempt, delay } => {
                write!(f, "reconnecting in {}ms (attempt {})", delay.as_millis(), attempt)
            }
            other => f.write_str(other.label()),
        }
    }
}
