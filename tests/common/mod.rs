//! Common test utilities for integration tests.
//!
//! This module provides a wiremock-backed fake backend and helpers to start
//! a monitor against it.
//!
//! # Example
//!
//! ```ignore
//! let backend = MockBackend::start().await.with_stream(&[bare("heartbeat")]).await;
//! let monitor = start_monitor(&backend);
//! wait_for_total(&monitor.handle(), 1).await;
//! ```

pub mod mocks;

pub use mocks::*;

use std::time::Duration;

use qwatch::config::MonitorConfig;
use qwatch::connection::ReconnectPolicy;
use qwatch::monitor::{Monitor, MonitorHandle};
use qwatch::stats::StatsSnapshot;

/// Config pointing at `backend`, with a reconnect delay long enough that a
/// test never sees the stream replayed.
pub fn test_config(backend: &MockBackend) -> MonitorConfig {
    MonitorConfig::new()
        .with_base_url(backend.uri())
        .with_reconnect(ReconnectPolicy::new().with_delay(Duration::from_secs(600)))
        .with_stats_interval(Duration::from_millis(50))
}

pub fn start_monitor(backend: &MockBackend) -> Monitor {
    Monitor::start(test_config(backend)).expect("monitor should start")
}

/// Poll the engine until `total` events have been recorded.
pub async fn wait_for_total(handle: &MonitorHandle, total: u64) -> StatsSnapshot {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let snapshot = handle.snapshot().await.expect("engine running");
            if snapshot.counters.total >= total {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timed out waiting for events")
}
