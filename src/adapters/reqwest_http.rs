//! Production [`HttpClient`] on top of reqwest.

use async_trait::async_trait;
use futures_util::StreamExt;
use std::time::Duration;

use crate::config::MonitorConfig;
use crate::traits::{ByteStream, Headers, HttpClient, HttpError, Response};

/// reqwest transport.
///
/// `get` and `post` are bounded by the request timeout, reply body included.
/// `get_stream` only has the connect timeout: the event feed is expected to
/// stay open indefinitely.
///
/// # Example
///
/// ```ignore
/// use qwatch::adapters::ReqwestHttpClient;
/// use qwatch::config::MonitorConfig;
///
/// let client = ReqwestHttpClient::from_config(&MonitorConfig::default())?;
/// let response = client.get("http://localhost:8080/health", &Headers::new()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    request_timeout: Option<Duration>,
}

impl ReqwestHttpClient {
    /// Client without any timeout.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            request_timeout: None,
        }
    }

    /// Client that fails the connect phase after `timeout`.
    pub fn with_connect_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(Self::convert_error)?;
        Ok(Self {
            client,
            request_timeout: None,
        })
    }

    /// Bound every `get` and `post` to `timeout`.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Client using the connect and request timeouts of `config`.
    pub fn from_config(config: &MonitorConfig) -> Result<Self, HttpError> {
        Ok(Self::with_connect_timeout(config.connect_timeout)?
            .with_request_timeout(config.request_timeout))
    }

    fn convert_error(err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout(err.to_string())
        } else if err.is_connect() {
            HttpError::ConnectionFailed(err.to_string())
        } else if err.is_builder() {
            HttpError::InvalidUrl(err.to_string())
        } else {
            HttpError::Other(err.to_string())
        }
    }

    fn prepare(
        &self,
        builder: reqwest::RequestBuilder,
        headers: &Headers,
        bounded: bool,
    ) -> reqwest::RequestBuilder {
        let mut builder = builder;
        for (key, value) in headers {
            builder = builder.header(key, value);
        }
        match self.request_timeout {
            Some(timeout) if bounded => builder.timeout(timeout),
            _ => builder,
        }
    }

    async fn read(builder: reqwest::RequestBuilder) -> Result<Response, HttpError> {
        let response = builder.send().await.map_err(Self::convert_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(Self::convert_error)?;
        Ok(Response::new(status, body))
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        Self::read(self.prepare(self.client.get(url), headers, true)).await
    }

    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError> {
        let builder = self.client.post(url).body(body.to_string());
        Self::read(self.prepare(builder, headers, true)).await
    }

    async fn get_stream(&self, url: &str, headers: &Headers) -> Result<ByteStream, HttpError> {
        let builder = self.prepare(self.client.get(url), headers, false);
        let response = builder.send().await.map_err(Self::convert_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(HttpError::ServerError { status, message });
        }

        let stream = response.bytes_stream().map(|result| {
            result.map_err(|e| {
                if e.is_timeout() {
                    HttpError::Timeout(e.to_string())
                } else {
                    HttpError::Io(e.to_string())
                }
            })
        });

        Ok(Box::pin(stream))
    }
}
