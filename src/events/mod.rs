//! Instrumentation event types for the query feed.
//!
//! Every message on the feed describes one step in the life of an LLM query
//! (start, streamed chunk, completion, error) or is a heartbeat. Messages are
//! classified into an [`Event`] whose [`EventKind`] carries a typed view of the
//! payload, while the verbatim payload map is kept alongside for inspection.

mod classifier;
mod payloads;

pub use classifier::{classify, classify_value, ClassificationError, CATEGORY_FIELD, PAYLOAD_FIELD};
pub use payloads::{
    chat_messages, ChatMessage, ErrorInfo, QueryComplete, QueryStart, StreamChunk, TokenUsage, UNKNOWN_LABEL,
};

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Semantic classification tag of an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    QueryStart,
    StreamChunk,
    QueryComplete,
    Error,
    Heartbeat,
    Unknown,
}

impl EventCategory {
    /// The five categories that have their own counter.
    pub const KNOWN: [EventCategory; 5] = [
        EventCategory::QueryStart,
        EventCategory::StreamChunk,
        EventCategory::QueryComplete,
        EventCategory::Error,
        EventCategory::Heartbeat,
    ];

    /// Resolve a wire tag. Only exact known tags match.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "query_start" => Some(EventCategory::QueryStart),
            "stream_chunk" => Some(EventCategory::StreamChunk),
            "query_complete" => Some(EventCategory::QueryComplete),
            "error" => Some(EventCategory::Error),
            "heartbeat" => Some(EventCategory::Heartbeat),
            _ => None,
        }
    }

    /// Returns the wire tag for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::QueryStart => "query_start",
            EventCategory::StreamChunk => "stream_chunk",
            EventCategory::QueryComplete => "query_complete",
            EventCategory::Error => "error",
            EventCategory::Heartbeat => "heartbeat",
            EventCategory::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, EventCategory::Unknown)
    }
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed event variants, one per category.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    QueryStart(QueryStart),
    StreamChunk(StreamChunk),
    QueryComplete(QueryComplete),
    Error(ErrorInfo),
    Heartbeat,
    /// Unrecognized or missing category tag. The raw tag is kept when present.
    Unknown { tag: Option<String> },
}

impl EventKind {
    pub fn category(&self) -> EventCategory {
        match self {
            EventKind::QueryStart(_) => EventCategory::QueryStart,
            EventKind::StreamChunk(_) => EventCategory::StreamChunk,
            EventKind::QueryComplete(_) => EventCategory::QueryComplete,
            EventKind::Error(_) => EventCategory::Error,
            EventKind::Heartbeat => EventCategory::Heartbeat,
            EventKind::Unknown { .. } => EventCategory::Unknown,
        }
    }
}

/// One classified message from the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Typed view, derived from the category tag and payload
    pub kind: EventKind,
    /// Seconds since the Unix epoch, as sent by the producer
    pub timestamp: Option<f64>,
    /// Receipt stamp added by the backend, if any
    pub received_at: Option<String>,
    /// Verbatim payload object (empty when absent)
    pub payload: Map<String, Value>,
}

impl Event {
    /// Build an event from its wire parts.
    ///
    /// An absent or unrecognized `tag` yields [`EventKind::Unknown`].
    pub fn from_parts(
        tag: Option<&str>,
        timestamp: Option<f64>,
        received_at: Option<String>,
        payload: Map<String, Value>,
    ) -> Self {
        let kind = match tag.and_then(EventCategory::from_tag) {
            Some(EventCategory::QueryStart) => {
                EventKind::QueryStart(QueryStart::from_payload(&payload))
            }
            Some(EventCategory::StreamChunk) => {
                EventKind::StreamChunk(StreamChunk::from_payload(&payload))
            }
            Some(EventCategory::QueryComplete) => {
                EventKind::QueryComplete(QueryComplete::from_payload(&payload))
            }
            Some(EventCategory::Error) => EventKind::Error(ErrorInfo::from_payload(&payload)),
            Some(EventCategory::Heartbeat) => EventKind::Heartbeat,
            Some(EventCategory::Unknown) | None => EventKind::Unknown {
                tag: tag.map(str::to_string),
            },
        };

        Self {
            kind,
            timestamp,
            received_at,
            payload,
        }
    }

    pub fn category(&self) -> EventCategory {
        self.kind.category()
    }

    /// The `query_start` view, if this is a query start.
    pub fn as_query_start(&self) -> Option<&QueryStart> {
        match &self.kind {
            EventKind::QueryStart(qs) => Some(qs),
            _ => None,
        }
    }

    /// Producer timestamp as a UTC datetime, when present and in range.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        let ts = self.timestamp?;
        if !ts.is_finite() {
            return None;
        }
        let secs = ts.floor();
        let nanos = ((ts - secs) * 1_000_000_000.0) as u32;
        DateTime::<Utc>::from_timestamp(secs as i64, nanos)
    }

    /// Wire tag to report for this event: the raw tag for unknown events.
    pub fn tag(&self) -> &str {
        match &self.kind {
            EventKind::Unknown { tag: Some(tag) } => tag,
            kind => kind.category().as_str(),
        }
    }

    /// Serialize back to the wire JSON shape.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match &self.kind {
            EventKind::Unknown { tag: None } => {}
            _ => map.serialize_entry(CATEGORY_FIELD, self.tag())?,
        }
        if let Some(ts) = self.timestamp {
            map.serialize_entry("timestamp", &ts)?;
        }
        map.serialize_entry(PAYLOAD_FIELD, &self.payload)?;
        if let Some(received_at) = &self.received_at {
            map.serialize_entry("received_at", received_at)?;
        }
        map.end()
    }
}
