//! Mock backend fixtures for integration tests.
//!
//! Builds a [`wiremock::MockServer`] that speaks the backend's endpoints, so
//! the real reqwest transport is exercised end to end.

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Encode wire events as one `text/event-stream` body.
pub fn sse_body(events: &[Value]) -> String {
    events
        .iter()
        .map(|event| format!("data: {}\n\n", event))
        .collect()
}

/// Builder for a mock backend.
pub struct MockBackend {
    server: MockServer,
}

impl MockBackend {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Serve `events` on `GET /stream`, then close the response.
    pub async fn with_stream(self, events: &[Value]) -> Self {
        self.with_raw_stream(sse_body(events)).await
    }

    /// Serve a literal `text/event-stream` body on `GET /stream`.
    pub async fn with_raw_stream(self, body: String) -> Self {
        Mock::given(method("GET"))
            .and(path("/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&self.server)
            .await;
        self
    }

    /// Answer `POST /api/clear` with `status` and `body`.
    pub async fn with_clear(self, status: u16, body: &str) -> Self {
        Mock::given(method("POST"))
            .and(path("/api/clear"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
        self
    }

    /// Answer `POST /api/clear` successfully, but only after `delay`.
    pub async fn with_slow_clear(self, delay: Duration) -> Self {
        Mock::given(method("POST"))
            .and(path("/api/clear"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"status": "cleared"}"#)
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
        self
    }

    /// Answer a GET endpoint with a JSON body.
    pub async fn with_json(self, endpoint: &str, status: u16, body: Value) -> Self {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
        self
    }

    /// Number of requests received for `endpoint`.
    pub async fn hits(&self, endpoint: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == endpoint)
            .count()
    }
}

/// Wire JSON of a `query_start` event.
pub fn query_start(provider: &str, model: &str, title: &str) -> Value {
    json!({
        "event": "query_start",
        "timestamp": 1736956800.0,
        "data": {
            "provider": provider,
            "model": model,
            "title": title,
            "history": [{"role": "user", "content": title}]
        },
        "received_at": "2025-01-15T12:00:00.123456"
    })
}

/// Wire JSON of an event with only a tag.
pub fn bare(tag: &str) -> Value {
    json!({ "event": tag, "timestamp": 1736956801.0 })
}
