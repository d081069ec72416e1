//! Transport seam between the backend client and the network.
//!
//! Everything qwatch sends goes through [`HttpClient`], so tests can swap the
//! reqwest transport for [`MockHttpClient`](crate::adapters::MockHttpClient).

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use thiserror::Error;

/// Request headers, name to value.
pub type Headers = HashMap<String, String>;

/// Incrementally received response body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>;

/// A fully read, non-streaming reply.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: Bytes) -> Self {
        Self { status, body }
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Empty or whitespace-only body.
    pub fn is_blank(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }
}

/// Transport failures.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The connect phase or a bounded request ran out of time.
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Non-2xx status on a stream request.
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// The body broke off mid-read.
    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Other(String),
}

impl HttpError {
    /// Whether the same request may succeed later.
    pub fn is_retryable(&self) -> bool {
        match self {
            HttpError::ConnectionFailed(_) | HttpError::Timeout(_) | HttpError::Io(_) => true,
            HttpError::ServerError { status, .. } => *status >= 500 || *status == 429,
            HttpError::InvalidUrl(_) | HttpError::Other(_) => false,
        }
    }
}

/// The three calls the backend client needs.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET and read the whole body.
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError>;

    /// POST `body` and read the whole reply.
    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError>;

    /// GET a body that arrives incrementally and may never end, such as an
    /// event stream. A non-2xx status is reported as
    /// [`HttpError::ServerError`] before any body is read.
    async fn get_stream(&self, url: &str, headers: &Headers) -> Result<ByteStream, HttpError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_is_success() {
        assert!(Response::new(200, Bytes::new()).is_success());
        assert!(Response::new(204, Bytes::new()).is_success());
        assert!(!Response::new(304, Bytes::new()).is_success());
        assert!(!Response::new(404, Bytes::new()).is_success());
        assert!(!Response::new(500, Bytes::new()).is_success());
    }

    #[test]
    fn test_response_is_blank() {
        assert!(Response::new(204, Bytes::new()).is_blank());
        assert!(Response::new(200, Bytes::from(" \r\n")).is_blank());
        assert!(!Response::new(200, Bytes::from("{}")).is_blank());
    }

    #[test]
    fn test_response_json_and_text() {
        let response = Response::new(200, Bytes::from(r#"{"status": "cleared"}"#));
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["status"], "cleared");
        assert_eq!(response.text().unwrap(), r#"{"status": "cleared"}"#);

        assert!(Response::new(200, Bytes::from("<html>"))
            .json::<serde_json::Value>()
            .is_err());
    }

    #[test]
    fn test_http_error_retryable() {
        assert!(HttpError::ConnectionFailed("refused".to_string()).is_retryable());
        assert!(HttpError::Timeout("10s".to_string()).is_retryable());
        assert!(HttpError::ServerError {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(!HttpError::ServerError {
            status: 404,
            message: String::new()
        }
        .is_retryable());
        assert!(!HttpError::InvalidUrl("x".to_string()).is_retryable());
    }

    #[test]
    fn test_http_error_display() {
        assert_eq!(
            HttpError::ServerError {
                status: 500,
                message: "Internal Error".to_string()
            }
            .to_string(),
            "Server error (500): Internal Error"
        );
        assert_eq!(
            HttpError::Timeout("deadline elapsed".to_string()).to_string(),
            "Request timeout: deadline elapsed"
        );
    }
}
