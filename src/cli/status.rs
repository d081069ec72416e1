//! `qwatch status`: backend health and retention.

use std::sync::Arc;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use serde_json::json;
use tracing::warn;

use crate::adapters::ReqwestHttpClient;
use crate::backend::BackendClient;
use crate::cli_output;
use crate::config::MonitorConfig;
use crate::traits::HttpClient;

pub async fn run(config: MonitorConfig, json: bool) -> Result<()> {
    let http = ReqwestHttpClient::from_config(&config)?;
    run_with_client(&config, Arc::new(http), json).await
}

/// Health is required; the stats endpoint is best effort.
pub async fn run_with_client(
    config: &MonitorConfig,
    http: Arc<dyn HttpClient>,
    json: bool,
) -> Result<()> {
    let backend = BackendClient::new(http, config.base_url.clone());

    let health = backend
        .health()
        .await
        .wrap_err_with(|| format!("backend at {} is not reachable", backend.base_url()))?;

    let remote = match backend.remote_stats().await {
        Ok(stats) => Some(stats),
        Err(e) => {
            warn!("Could not fetch backend stats: {}", e);
            None
        }
    };

    if json {
        println!("{}", json!({ "health": health, "stats": remote }));
    } else {
        cli_output::print_status(backend.base_url(), &health, remote.as_ref());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MockHttpClient, MockResponse};
    use crate::traits::{HttpError, Response};
    use bytes::Bytes;

    #[tokio::test]
    async fn test_status_tolerates_missing_stats() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://localhost:8080/health",
            MockResponse::Success(Response::new(
                200,
                Bytes::from(r#"{"status": "ok", "events_count": 3}"#),
            )),
        );
        mock.set_response(
            "http://localhost:8080/api/stats",
            MockResponse::Success(Response::new(404, Bytes::new())),
        );

        run_with_client(&MonitorConfig::new(), Arc::new(mock.clone()), true)
            .await
            .unwrap();
        assert_eq!(mock.get_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_status_fails_when_backend_is_down() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Error(HttpError::ConnectionFailed(
            "refused".to_string(),
        )));

        let err = run_with_client(&MonitorConfig::new(), Arc::new(mock), false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not reachable"));
    }
}
