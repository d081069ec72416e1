//! Live feed connection with automatic reconnection.
//!
//! [`StreamConnection::spawn`] starts a background task that keeps exactly
//! one logical connection to the backend's event stream, forwards every
//! classified event over an ordered channel, and publishes its
//! [`ConnectionState`] on a watch channel.

mod policy;
mod state;
mod stream;

pub use policy::{Backoff, ReconnectPolicy, DEFAULT_RECONNECT_DELAY};
pub use state::ConnectionState;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::backend::BackendClient;
use crate::events::Event;
use stream::{ConnectionControl, ConnectionTask};

/// Unstarted connection to the backend feed.
#[derive(Debug, Clone)]
pub struct StreamConnection {
    backend: BackendClient,
    policy: ReconnectPolicy,
}

impl StreamConnection {
    pub fn new(backend: BackendClient, policy: ReconnectPolicy) -> Self {
        Self { backend, policy }
    }

    /// Start the connection task.
    ///
    /// Events are sent to `events_tx` in arrival order. The task stops when
    /// `cancel` fires, when `events_tx`'s receiver is dropped, when every
    /// [`ConnectionHandle`] is dropped, or when the policy's attempt limit
    /// is reached.
    pub fn spawn(
        self,
        events_tx: mpsc::Sender<Event>,
        cancel: CancellationToken,
    ) -> (ConnectionHandle, JoinHandle<()>) {
        let (control_tx, control_rx) = mpsc::channel(8);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        let task = ConnectionTask {
            backend: self.backend,
            policy: self.policy,
            events_tx,
            control_rx,
            state_tx,
            cancel: cancel.clone(),
        };
        let join = tokio::spawn(task.run());

        let handle = ConnectionHandle {
            control_tx,
            state_rx,
            cancel,
        };
        (handle, join)
    }
}

/// Control and status handle for a running connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    control_tx: mpsc::Sender<ConnectionControl>,
    state_rx: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
}

impl ConnectionHandle {
    /// Close the current stream (if open) and connect again immediately,
    /// skipping any pending reconnect delay.
    ///
    /// Returns false if the connection task has already stopped.
    pub async fn reconnect(&self) -> bool {
        self.control_tx
            .send(ConnectionControl::Reconnect)
            .await
            .is_ok()
    }

    /// Stop the connection. A pending reconnect never fires after this.
    pub fn shutdown(&self) {
        if !self.cancel.is_cancelled() {
            info!("Shutting down event stream connection");
        }
        self.cancel.cancel();
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Subscribe to state changes.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MockHttpClient, MockResponse};
    use crate::events::EventCategory;
    use crate::traits::HttpError;
    use bytes::Bytes;
    use std::sync::Arc;
    use std::time::Duration;

    const BASE: &str = "http://localhost:8080";
    const STREAM_URL: &str = "http://localhost:8080/stream";

    fn start(
        mock: &MockHttpClient,
        policy: ReconnectPolicy,
    ) -> (ConnectionHandle, JoinHandle<()>, mpsc::Receiver<Event>) {
        let backend = BackendClient::new(Arc::new(mock.clone()), BASE);
        let (events_tx, events_rx) = mpsc::channel(64);
        let (handle, join) =
            StreamConnection::new(backend, policy).spawn(events_tx, CancellationToken::new());
        (handle, join, events_rx)
    }

    fn refused() -> MockResponse {
        MockResponse::StreamError(HttpError::ConnectionFailed("refused".to_string()))
    }

    async fn wait_for_state(handle: &ConnectionHandle, f: impl Fn(&ConnectionState) -> bool) {
        let mut rx = handle.watch_state();
        tokio::time::timeout(Duration::from_secs(60), rx.wait_for(|s| f(s)))
            .await
            .expect("timed out waiting for state")
            .expect("state channel closed");
    }

    async fn wait_for_requests(mock: &MockHttpClient, count: usize) {
        tokio::time::timeout(Duration::from_secs(60), async {
            while mock.requests_to(STREAM_URL).len() < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("timed out waiting for requests");
    }

    #[tokio::test(start_paused = true)]
    async fn test_forwards_events_in_order_and_skips_malformed() {
        let mock = MockHttpClient::new();
        mock.set_response(
            STREAM_URL,
            MockResponse::OpenStream(vec![
                Bytes::from("data: {\"event\": \"query_start\", \"data\": {}}\n\n"),
                Bytes::from("data: not json\n\n: keepalive\n\n"),
                Bytes::from("data: {\"event\": \"stream_"),
                Bytes::from("chunk\"}\n\ndata: {\"event\": \"query_complete\"}\n\n"),
            ]),
        );

        let (handle, join, mut events_rx) = start(&mock, ReconnectPolicy::default());

        let mut categories = Vec::new();
        for _ in 0..3 {
            categories.push(events_rx.recv().await.unwrap().category());
        }
        assert_eq!(
            categories,
            vec![
                EventCategory::QueryStart,
                EventCategory::StreamChunk,
                EventCategory::QueryComplete
            ]
        );
        assert!(handle.is_connected());

        handle.shutdown();
        join.await.unwrap();
        assert_eq!(handle.state(), ConnectionState::Disconnected);
        assert_eq!(mock.requests_to(STREAM_URL).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_error_schedules_exactly_one_reconnect() {
        let mock = MockHttpClient::new();
        mock.push_response(STREAM_URL, refused());
        mock.set_response(STREAM_URL, MockResponse::OpenStream(Vec::new()));

        let (handle, join, _events_rx) = start(&mock, ReconnectPolicy::default());

        wait_for_state(&handle, |s| s.is_connected()).await;

        // Stay connected well past another delay: no extra attempts
        tokio::time::sleep(Duration::from_secs(30)).await;

        let requests = mock.requests_to(STREAM_URL);
        assert_eq!(requests.len(), 2);
        let gap = requests[1].at - requests[0].at;
        assert!(gap >= Duration::from_millis(3000), "gap was {:?}", gap);
        assert!(gap < Duration::from_millis(3100), "gap was {:?}", gap);

        handle.shutdown();
        join.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_of_stream_triggers_reconnect() {
        let mock = MockHttpClient::new();
        mock.push_response(
            STREAM_URL,
            MockResponse::Stream(vec![Bytes::from("data: {\"event\": \"heartbeat\"}")]),
        );
        mock.set_response(STREAM_URL, MockResponse::OpenStream(Vec::new()));

        let (handle, join, mut events_rx) = start(&mock, ReconnectPolicy::default());

        // The unterminated frame is flushed when the stream ends
        let event = events_rx.recv().await.unwrap();
        assert_eq!(event.category(), EventCategory::Heartbeat);

        wait_for_requests(&mock, 2).await;
        wait_for_state(&handle, |s| s.is_connected()).await;

        handle.shutdown();
        join.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_broken_stream_reports_pending_reconnect() {
        let mock = MockHttpClient::new();
        mock.set_response(
            STREAM_URL,
            MockResponse::BrokenStream(Vec::new(), HttpError::Io("reset".to_string())),
        );

        let (handle, join, _events_rx) = start(&mock, ReconnectPolicy::default());

        wait_for_state(&handle, |s| {
            *s == ConnectionState::ReconnectPending {
                attempt: 1,
                delay: DEFAULT_RECONNECT_DELAY,
            }
        })
        .await;

        handle.shutdown();
        join.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_during_pending_reconnect_cancels_timer() {
        let mock = MockHttpClient::new();
        mock.set_response(STREAM_URL, refused());

        let (handle, join, _events_rx) = start(&mock, ReconnectPolicy::default());

        wait_for_state(&handle, |s| {
            matches!(s, ConnectionState::ReconnectPending { .. })
        })
        .await;
        handle.shutdown();
        join.await.unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(mock.requests_to(STREAM_URL).len(), 1);
        assert_eq!(handle.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_request_replaces_open_stream() {
        let mock = MockHttpClient::new();
        mock.set_response(STREAM_URL, MockResponse::OpenStream(Vec::new()));

        let (handle, join, _events_rx) = start(&mock, ReconnectPolicy::default());
        wait_for_state(&handle, |s| s.is_connected()).await;

        assert!(handle.reconnect().await);
        wait_for_requests(&mock, 2).await;
        wait_for_state(&handle, |s| s.is_connected()).await;

        let requests = mock.requests_to(STREAM_URL);
        // No reconnect delay on an explicit request
        assert!(requests[1].at - requests[0].at < Duration::from_millis(100));

        handle.shutdown();
        join.await.unwrap();
        assert!(!handle.reconnect().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_request_skips_pending_delay() {
        let mock = MockHttpClient::new();
        mock.push_response(STREAM_URL, refused());
        mock.set_response(STREAM_URL, MockResponse::OpenStream(Vec::new()));

        let (handle, join, _events_rx) = start(&mock, ReconnectPolicy::default());
        wait_for_state(&handle, |s| {
            matches!(s, ConnectionState::ReconnectPending { .. })
        })
        .await;

        handle.reconnect().await;
        wait_for_state(&handle, |s| s.is_connected()).await;

        let requests = mock.requests_to(STREAM_URL);
        assert_eq!(requests.len(), 2);
        assert!(requests[1].at - requests[0].at < Duration::from_millis(3000));

        handle.shutdown();
        join.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let mock = MockHttpClient::new();
        mock.set_response(STREAM_URL, refused());

        let policy = ReconnectPolicy::new()
            .with_delay(Duration::from_millis(100))
            .with_max_attempts(Some(2));
        let (handle, join, _events_rx) = start(&mock, policy);

        tokio::time::timeout(Duration::from_secs(60), join)
            .await
            .expect("connection task should stop")
            .unwrap();

        // Initial connect plus two reconnects
        assert_eq!(mock.requests_to(STREAM_URL).len(), 3);
        assert_eq!(handle.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exponential_backoff_spacing() {
        let mock = MockHttpClient::new();
        for _ in 0..3 {
            mock.push_response(STREAM_URL, refused());
        }
        mock.set_response(STREAM_URL, MockResponse::OpenStream(Vec::new()));

        let policy = ReconnectPolicy::new()
            .with_delay(Duration::from_millis(100))
            .with_exponential_backoff(Duration::from_millis(250));
        let (handle, join, _events_rx) = start(&mock, policy);
        wait_for_requests(&mock, 4).await;

        let at: Vec<_> = mock.requests_to(STREAM_URL).iter().map(|r| r.at).collect();
        let gaps: Vec<u128> = at.windows(2).map(|w| (w[1] - w[0]).as_millis()).collect();
        assert!((100..110).contains(&gaps[0]), "gaps: {:?}", gaps);
        assert!((200..210).contains(&gaps[1]), "gaps: {:?}", gaps);
        assert!((250..260).contains(&gaps[2]), "gaps: {:?}", gaps);

        handle.shutdown();
        join.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_event_receiver_dropped() {
        let mock = MockHttpClient::new();
        mock.set_response(
            STREAM_URL,
            MockResponse::OpenStream(vec![Bytes::from("data: {\"event\": \"heartbeat\"}\n\n")]),
        );

        let (handle, join, events_rx) = start(&mock, ReconnectPolicy::default());
        drop(events_rx);

        tokio::time::timeout(Duration::from_secs(60), join)
            .await
            .expect("connection task should stop")
            .unwrap();
        assert_eq!(handle.state(), ConnectionState::Disconnected);
    }
}
