//! Typed, lenient views over category-specific event payloads.
//!
//! Payloads arrive as free-form JSON objects. Nothing here ever fails:
//! a missing, empty or mistyped field simply reads as absent, so downstream
//! consumers can rely on default semantics instead of error handling.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fallback label for a missing provider or model.
pub const UNKNOWN_LABEL: &str = "unknown";

fn str_field(payload: &Map<String, Value>, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn u64_field(payload: &Map<String, Value>, key: &str) -> Option<u64> {
    let value = payload.get(key)?;
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|n| *n >= 0.0).map(|n| n as u64))
}

/// Display view of one message of the conversation history sent with a
/// query. The history itself is kept verbatim as JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Option<String>,
    pub content: Option<String>,
}

impl ChatMessage {
    /// Read one history entry. Only objects are messages.
    ///
    /// String content is taken as is. Content given as a list of parts
    /// (`[{"type": "text", "text": ..}, ..]`) reads as its text parts joined
    /// by a space.
    pub fn from_value(value: &Value) -> Option<Self> {
        let message = value.as_object()?;
        let content = match message.get("content") {
            Some(Value::Array(parts)) => {
                let text: Vec<&str> = parts
                    .iter()
                    .filter_map(|part| part.get("text").and_then(Value::as_str))
                    .filter(|text| !text.is_empty())
                    .collect();
                (!text.is_empty()).then(|| text.join(" "))
            }
            _ => str_field(message, "content"),
        };
        Some(Self {
            role: str_field(message, "role"),
            content,
        })
    }

    /// Role for display; messages without a role are shown as user input.
    pub fn role_or_default(&self) -> &str {
        self.role.as_deref().unwrap_or("user")
    }

    pub fn content_or_default(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// Message views over a verbatim history, skipping entries that are not
/// objects.
pub fn chat_messages(history: &[Value]) -> impl DoubleEndedIterator<Item = ChatMessage> + '_ {
    history.iter().filter_map(ChatMessage::from_value)
}

/// Payload of a `query_start` event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryStart {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub title: Option<String>,
    /// Conversation history exactly as sent
    pub history: Vec<Value>,
}

impl QueryStart {
    pub fn from_payload(payload: &Map<String, Value>) -> Self {
        Self {
            provider: str_field(payload, "provider"),
            model: str_field(payload, "model"),
            title: str_field(payload, "title"),
            history: payload
                .get("history")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        }
    }

    pub fn messages(&self) -> impl DoubleEndedIterator<Item = ChatMessage> + '_ {
        chat_messages(&self.history)
    }

    pub fn provider_or_unknown(&self) -> &str {
        self.provider.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    pub fn model_or_unknown(&self) -> &str {
        self.model.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or("untitled")
    }
}

/// Payload of a `stream_chunk` event. Either part may be missing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamChunk {
    pub reasoning: Option<String>,
    pub content: Option<String>,
}

impl StreamChunk {
    pub fn from_payload(payload: &Map<String, Value>) -> Self {
        Self {
            reasoning: str_field(payload, "reasoning"),
            content: str_field(payload, "content"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.reasoning.as_deref().map_or(true, str::is_empty)
            && self.content.as_deref().map_or(true, str::is_empty)
    }
}

/// Token accounting reported on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt: u64,
    pub completion: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.prompt.saturating_add(self.completion)
    }
}

/// Payload of a `query_complete` event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryComplete {
    pub tokens: Option<TokenUsage>,
    /// Duration in milliseconds
    pub duration_ms: Option<f64>,
}

impl QueryComplete {
    pub fn from_payload(payload: &Map<String, Value>) -> Self {
        let tokens = payload
            .get("tokens")
            .and_then(Value::as_object)
            .map(|tokens| TokenUsage {
                prompt: u64_field(tokens, "prompt").unwrap_or(0),
                completion: u64_field(tokens, "completion").unwrap_or(0),
            });

        Self {
            tokens,
            duration_ms: payload.get("duration").and_then(Value::as_f64),
        }
    }
}

/// Payload of an `error` event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErrorInfo {
    pub message: Option<String>,
}

impl ErrorInfo {
    pub fn from_payload(payload: &Map<String, Value>) -> Self {
        Self {
            message: str_field(payload, "message"),
        }
    }

    pub fn message_or_default(&self) -> &str {
        self.message.as_deref().unwrap_or("Unknown error")
    }
}
