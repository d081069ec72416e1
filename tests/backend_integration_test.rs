//! Typed backend endpoints over the real HTTP transport.

mod common;

use std::sync::Arc;

use common::{bare, query_start, MockBackend};
use qwatch::adapters::ReqwestHttpClient;
use qwatch::backend::{BackendClient, BackendError};
use qwatch::events::EventCategory;
use serde_json::json;

fn client(backend: &MockBackend) -> BackendClient {
    BackendClient::new(Arc::new(ReqwestHttpClient::new()), backend.uri())
}

#[tokio::test]
async fn test_health_report() {
    let backend = MockBackend::start()
        .await
        .with_json(
            "/health",
            200,
            json!({"status": "ok", "timestamp": "2025-01-15T12:00:00", "events_count": 42}),
        )
        .await;

    let health = client(&backend).health().await.unwrap();
    assert!(health.is_ok());
    assert_eq!(health.events_count, 42);
    assert_eq!(health.timestamp.as_deref(), Some("2025-01-15T12:00:00"));
}

#[tokio::test]
async fn test_remote_stats() {
    let backend = MockBackend::start()
        .await
        .with_json(
            "/api/stats",
            200,
            json!({
                "total_events": 3,
                "connected_clients": 1,
                "event_types": {"query_start": 2, "heartbeat": 1},
                "oldest_event": "2025-01-15T12:00:00",
                "newest_event": "2025-01-15T12:05:00"
            }),
        )
        .await;

    let stats = client(&backend).remote_stats().await.unwrap();
    assert_eq!(stats.total_events, 3);
    assert_eq!(stats.connected_clients, 1);
    assert_eq!(stats.event_types.get("query_start"), Some(&2));
    assert_eq!(stats.newest_event.as_deref(), Some("2025-01-15T12:05:00"));
}

#[tokio::test]
async fn test_retained_events_are_classified() {
    let backend = MockBackend::start()
        .await
        .with_json(
            "/api/events",
            200,
            json!({
                "total": 3,
                "events": [query_start("openai", "gpt-4", "hi"), "garbage", bare("heartbeat")]
            }),
        )
        .await;

    let events = client(&backend).events().await.unwrap();
    assert_eq!(events.total, 3);
    let categories: Vec<_> = events.events.iter().map(|e| e.category()).collect();
    assert_eq!(
        categories,
        vec![
            EventCategory::QueryStart,
            EventCategory::Unknown,
            EventCategory::Heartbeat
        ]
    );
}

#[tokio::test]
async fn test_error_status_is_reported_with_endpoint() {
    let backend = MockBackend::start()
        .await
        .with_json("/health", 503, json!({"status": "down"}))
        .await;

    let err = client(&backend).health().await.unwrap_err();
    assert_eq!(err.endpoint(), "/health");
    assert!(err.is_retryable());
    assert!(matches!(err, BackendError::Status { status: 503, .. }));
}

#[tokio::test]
async fn test_clear_accepts_empty_body() {
    let backend = MockBackend::start().await.with_clear(200, "").await;

    let reply = client(&backend).clear().await.unwrap();
    assert!(reply.is_null());
    assert_eq!(backend.hits("/api/clear").await, 1);
}
