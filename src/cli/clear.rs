//! `qwatch clear`: drop the backend's retained events.

use std::sync::Arc;

use color_eyre::Result;
use serde_json::Value;

use crate::adapters::ReqwestHttpClient;
use crate::backend::BackendClient;
use crate::cli_output::{self, icons};
use crate::config::MonitorConfig;
use crate::traits::HttpClient;

pub async fn run(config: MonitorConfig) -> Result<()> {
    let http = ReqwestHttpClient::from_config(&config)?;
    run_with_client(&config, Arc::new(http)).await
}

pub async fn run_with_client(config: &MonitorConfig, http: Arc<dyn HttpClient>) -> Result<()> {
    let backend = BackendClient::new(http, config.base_url.clone());

    match backend.clear().await {
        Ok(reply) => {
            let status = reply
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or("ok");
            cli_output::print_line(icons::SUCCESS, &format!("Backend cleared ({})", status));
            Ok(())
        }
        Err(e) => {
            cli_output::print_line(icons::FAILURE, "Clear failed");
            Err(super::report(e))
        }
    }
}
