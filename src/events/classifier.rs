//! Raw message text → [`Event`].

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use super::Event;

/// Field holding the category tag.
pub const CATEGORY_FIELD: &str = "event";
/// Field holding the category-specific payload object.
pub const PAYLOAD_FIELD: &str = "data";

/// Why a raw message could not be turned into an event.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassificationError {
    /// The message is not valid JSON.
    #[error("malformed event payload: {reason}")]
    MalformedPayload { reason: String },
}

/// Classify one raw feed message.
///
/// The category comes verbatim from the `event` field. A missing, non-string
/// or unrecognized tag is not an error: the event is returned as
/// [`EventKind::Unknown`](super::EventKind::Unknown) so it still lands in raw
/// history. Only text that is not JSON at all is rejected.
pub fn classify(raw: &str) -> Result<Event, ClassificationError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| ClassificationError::MalformedPayload {
            reason: e.to_string(),
        })?;

    Ok(classify_value(value))
}

/// Classify an already parsed message. Valid JSON that is not an object
/// reads as an untagged event with an empty payload.
pub fn classify_value(value: Value) -> Event {
    let mut object = match value {
        Value::Object(object) => object,
        other => {
            debug!("Untagged non-object message: {}", other);
            Map::new()
        }
    };

    let tag = object
        .get(CATEGORY_FIELD)
        .and_then(Value::as_str)
        .map(str::to_string);
    let timestamp = object.get("timestamp").and_then(Value::as_f64);
    let received_at = object
        .get("received_at")
        .and_then(Value::as_str)
        .map(str::to_string);
    let payload = match object.remove(PAYLOAD_FIELD) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    let event = Event::from_parts(tag.as_deref(), timestamp, received_at, payload);
    if !event.category().is_known() {
        debug!("Unknown event type: {:?}", tag);
    }

    event
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventCategory, EventKind, TokenUsage};

    #[test]
    fn test_classify_query_start() {
        let raw = r#"{"event": "query_start", "timestamp": 1736956800, "data": {
            "provider": "openai", "model": "gpt-4", "title": "Explain",
            "history": [{"role": "user", "content": "Hi"}]}}"#;

        let event = classify(raw).unwrap();
        assert_eq!(event.category(), EventCategory::QueryStart);
        assert_eq!(event.timestamp, Some(1_736_956_800.0));

        let qs = event.as_query_start().unwrap();
        assert_eq!(qs.provider.as_deref(), Some("openai"));
        assert_eq!(qs.model.as_deref(), Some("gpt-4"));
        assert_eq!(qs.history.len(), 1);
        assert_eq!(event.payload.get("title").and_then(Value::as_str), Some("Explain"));
    }

    #[test]
    fn test_classify_query_complete() {
        let event =
            classify(r#"{"event": "query_complete", "data": {"tokens": {"prompt": 10, "completion": 5}}}"#)
                .unwrap();

        match event.kind {
            EventKind::QueryComplete(done) => {
                assert_eq!(done.tokens, Some(TokenUsage { prompt: 10, completion: 5 }));
            }
            other => panic!("Expected QueryComplete, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_heartbeat_without_payload() {
        let event = classify(r#"{"event": "heartbeat", "timestamp": 5}"#).unwrap();
        assert_eq!(event.kind, EventKind::Heartbeat);
        assert!(event.payload.is_empty());
    }

    #[test]
    fn test_classify_keeps_received_at() {
        let event =
            classify(r#"{"event": "error", "data": {"message": "x"}, "received_at": "2025-01-15T12:00:00"}"#)
                .unwrap();
        assert_eq!(event.received_at.as_deref(), Some("2025-01-15T12:00:00"));
    }

    #[test]
    fn test_classify_unknown_category_is_not_an_error() {
        let event = classify(r#"{"event": "tool_call", "data": {"name": "search"}}"#).unwrap();
        assert_eq!(event.category(), EventCategory::Unknown);
        assert_eq!(
            event.kind,
            EventKind::Unknown {
                tag: Some("tool_call".to_string())
            }
        );
        assert_eq!(event.payload.len(), 1);
    }

    #[test]
    fn test_classify_missing_or_non_string_category() {
        let event = classify(r#"{"data": {}}"#).unwrap();
        assert_eq!(event.kind, EventKind::Unknown { tag: None });

        let event = classify(r#"{"event": 3}"#).unwrap();
        assert_eq!(event.category(), EventCategory::Unknown);
    }

    #[test]
    fn test_classify_non_object_payload_is_emptied() {
        let event = classify(r#"{"event": "stream_chunk", "data": "plain text"}"#).unwrap();
        assert_eq!(event.category(), EventCategory::StreamChunk);
        assert!(event.payload.is_empty());
    }

    #[test]
    fn test_classify_malformed_json() {
        let err = classify("not valid json").unwrap_err();
        assert!(matches!(err, ClassificationError::MalformedPayload { .. }));
        assert!(err.to_string().starts_with("malformed event payload"));

        assert!(classify("").is_err());
        assert!(classify(r#"{"event": "query_start""#).is_err());
    }

    #[test]
    fn test_classify_value_matches_classify() {
        let raw = r#"{"event": "error", "timestamp": 3, "data": {"message": "boom"}}"#;
        let value: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(classify_value(value), classify(raw).unwrap());
    }

    #[test]
    fn test_classify_non_object_json_as_unknown() {
        for raw in ["42", r#""x""#, "[1, 2]", "true", "null"] {
            let event = classify(raw).unwrap();
            assert_eq!(event.kind, EventKind::Unknown { tag: None }, "for {}", raw);
            assert!(event.payload.is_empty());
            assert_eq!(event.timestamp, None);
        }
    }
}
