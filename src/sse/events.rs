//! SSE line and frame types.

/// Represents a parsed SSE line
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    /// Event type declaration (e.g., "event: message")
    Event(String),
    /// Data payload (e.g., "data: {\"event\": \"heartbeat\"}")
    Data(String),
    /// Last event id
    Id(String),
    /// Server-suggested reconnection time in milliseconds
    Retry(u64),
    /// Empty line - signals end of a message
    Empty,
    /// Comment line (starts with ':')
    Comment(String),
}

/// A complete SSE message, dispatched when a blank line is seen.
///
/// `data` holds every `data:` line of the message joined with `\n`, which is
/// the raw message text handed to the classifier.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SseFrame {
    /// Value of the `event:` field, if the server sent one
    pub event_type: Option<String>,
    /// Joined data payload
    pub data: String,
    /// Value of the `id:` field, if any
    pub id: Option<String>,
    /// Value of the `retry:` field, if any
    pub retry_ms: Option<u64>,
}

impl SseFrame {
    /// Create a frame carrying only a data payload.
    pub fn data(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }
}
