//! Typed access to the companion backend's HTTP endpoints.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::events::{classify_value, Event};
use crate::traits::{ByteStream, Headers, HttpClient, HttpError, Response};

/// Server-sent event feed.
pub const STREAM_PATH: &str = "/stream";
/// Remote log reset.
pub const CLEAR_PATH: &str = "/api/clear";
pub const HEALTH_PATH: &str = "/health";
pub const STATS_PATH: &str = "/api/stats";
pub const EVENTS_PATH: &str = "/api/events";

/// Failure talking to one backend endpoint.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The request never produced a response.
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: HttpError,
    },

    /// The backend answered with a non-2xx status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The reply body could not be decoded.
    #[error("invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

impl BackendError {
    pub fn endpoint(&self) -> &str {
        match self {
            BackendError::Transport { endpoint, .. }
            | BackendError::Status { endpoint, .. }
            | BackendError::InvalidResponse { endpoint, .. } => endpoint,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Transport { source, .. } => source.is_retryable(),
            BackendError::Status { status, .. } => *status >= 500 || *status == 429,
            BackendError::InvalidResponse { .. } => false,
        }
    }
}

/// Reply of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    /// Backend clock at the time of the check (ISO-8601)
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Events currently retained by the backend
    #[serde(default)]
    pub events_count: u64,
}

impl HealthReport {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// Reply of `GET /api/stats`: the backend's view of its own buffer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteStats {
    #[serde(default)]
    pub total_events: u64,
    #[serde(default)]
    pub connected_clients: u64,
    /// Count per raw category tag, unknown tags included
    #[serde(default)]
    pub event_types: BTreeMap<String, u64>,
    /// Receipt stamp of the oldest retained event
    #[serde(default)]
    pub oldest_event: Option<String>,
    /// Receipt stamp of the newest retained event
    #[serde(default)]
    pub newest_event: Option<String>,
}

/// Reply of `GET /api/events`, classified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteEvents {
    /// Count reported by the backend
    pub total: u64,
    /// Retained entries in backend order
    pub events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
struct RawEvents {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    events: Vec<Value>,
}

/// Reply of `POST /api/clear`. `Null` when the backend sent an empty body.
pub type ClearReply = Value;

/// Client for the backend's HTTP interface.
///
/// Cheap to clone; clones share the underlying [`HttpClient`].
#[derive(Clone)]
pub struct BackendClient {
    http: Arc<dyn HttpClient>,
    base_url: String,
}

impl fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl BackendClient {
    pub fn new(http: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of an endpoint path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Open the event feed. The returned stream stays open until the server
    /// or the network closes it.
    pub async fn open_stream(&self) -> Result<ByteStream, HttpError> {
        let mut headers = Headers::new();
        headers.insert("Accept".to_string(), "text/event-stream".to_string());
        headers.insert("Cache-Control".to_string(), "no-cache".to_string());

        self.http.get_stream(&self.url(STREAM_PATH), &headers).await
    }

    /// Ask the backend to drop its retained events.
    ///
    /// Succeeds only on a 2xx status with an empty or well-formed JSON body.
    pub async fn clear(&self) -> Result<ClearReply, BackendError> {
        let response = self
            .http
            .post(&self.url(CLEAR_PATH), "", &Headers::new())
            .await
            .map_err(|source| BackendError::Transport {
                endpoint: CLEAR_PATH.to_string(),
                source,
            })?;

        let response = Self::check_status(CLEAR_PATH, response)?;
        if response.is_blank() {
            return Ok(Value::Null);
        }
        Self::decode(CLEAR_PATH, &response)
    }

    pub async fn health(&self) -> Result<HealthReport, BackendError> {
        self.get_json(HEALTH_PATH).await
    }

    pub async fn remote_stats(&self) -> Result<RemoteStats, BackendError> {
        self.get_json(STATS_PATH).await
    }

    /// Fetch the backend's retained events, classified the same way as the
    /// live feed.
    pub async fn events(&self) -> Result<RemoteEvents, BackendError> {
        let raw: RawEvents = self.get_json(EVENTS_PATH).await?;

        Ok(RemoteEvents {
            total: raw.total,
            events: raw.events.into_iter().map(classify_value).collect(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, BackendError> {
        let response = self
            .http
            .get(&self.url(path), &Headers::new())
            .await
            .map_err(|source| BackendError::Transport {
                endpoint: path.to_string(),
                source,
            })?;

        let response = Self::check_status(path, response)?;
        Self::decode(path, &response)
    }

    fn check_status(path: &str, response: Response) -> Result<Response, BackendError> {
        debug!("{} -> HTTP {}", path, response.status);
        if response.is_success() {
            return Ok(response);
        }
        Err(BackendError::Status {
            endpoint: path.to_string(),
            status: response.status,
            body: response.text().unwrap_or_default(),
        })
    }

    fn decode<T: serde::de::DeserializeOwned>(
        path: &str,
        response: &Response,
    ) -> Result<T, BackendError> {
        response.json().map_err(|e| BackendError::InvalidResponse {
            endpoint: path.to_string(),
            reason: e.to_string(),
        })
    }
}
