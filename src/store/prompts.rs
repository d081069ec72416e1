//! Prompt log entries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::events::{chat_messages, ChatMessage, QueryStart};

/// One logged prompt, taken from a `query_start` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptEntry {
    /// Producer timestamp of the originating event
    pub timestamp: Option<f64>,
    pub provider: String,
    pub model: String,
    pub title: String,
    /// Conversation history exactly as sent with the query
    pub history: Vec<Value>,
}

impl PromptEntry {
    pub fn from_query_start(query: &QueryStart, timestamp: Option<f64>) -> Self {
        Self {
            timestamp,
            provider: query.provider_or_unknown().to_string(),
            model: query.model_or_unknown().to_string(),
            title: query.title_or_default().to_string(),
            history: query.history.clone(),
        }
    }

    pub fn messages(&self) -> impl DoubleEndedIterator<Item = ChatMessage> + '_ {
        chat_messages(&self.history)
    }

    /// The last user message of the history, if any.
    pub fn last_user_message(&self) -> Option<ChatMessage> {
        self.messages()
            .rev()
            .find(|msg| msg.role_or_default() == "user")
    }
}
