//! The connection task: open the feed, decode frames, forward events, and
//! reconnect on failure.

use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::policy::ReconnectPolicy;
use super::state::ConnectionState;
use crate::backend::BackendClient;
use crate::events::{classify, Event};
use crate::sse::{SseDecoder, SseFrame};
use crate::traits::ByteStream;

/// Requests from a [`ConnectionHandle`](super::ConnectionHandle).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConnectionControl {
    /// Drop the current stream (if any) and connect again right away
    Reconnect,
}

/// Why a connected stream stopped being read.
#[derive(Debug)]
enum StreamEnd {
    /// Transport error or end of stream
    Failed(String),
    /// Reconnect requested through the handle
    Reconnect,
    /// Shutdown requested, or every handle dropped
    Shutdown,
    /// The engine stopped accepting events
    EngineGone,
}

pub(crate) struct ConnectionTask {
    pub backend: BackendClient,
    pub policy: ReconnectPolicy,
    pub events_tx: mpsc::Sender<Event>,
    pub control_rx: mpsc::Receiver<ConnectionControl>,
    pub state_tx: watch::Sender<ConnectionState>,
    pub cancel: CancellationToken,
}

impl ConnectionTask {
    fn set_state(&self, state: ConnectionState) {
        debug!("Connection state: {}", state);
        self.state_tx.send_replace(state);
    }

    /// Run until shutdown, until the engine goes away, or until the policy
    /// gives up. The state is `Disconnected` on return.
    pub(crate) async fn run(mut self) {
        let url = self.backend.url(crate::backend::STREAM_PATH);
        let mut attempt: u32 = 0;

        loop {
            self.set_state(ConnectionState::Connecting { attempt });
            info!("Connecting to {}", url);

            let opened = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                control = self.control_rx.recv() => match control {
                    Some(ConnectionControl::Reconnect) => {
                        debug!("Reconnect requested while connecting, restarting");
                        attempt = 0;
                        continue;
                    }
                    None => break,
                },
                opened = self.backend.open_stream() => opened,
            };

            let end = match opened {
                Ok(stream) => {
                    attempt = 0;
                    self.set_state(ConnectionState::Connected);
                    info!("Connected to event stream");
                    self.read_stream(stream).await
                }
                Err(e) => StreamEnd::Failed(e.to_string()),
            };

            match end {
                StreamEnd::Failed(reason) => warn!("Event stream error: {}", reason),
                StreamEnd::Reconnect => {
                    info!("Reconnecting on request");
                    continue;
                }
                StreamEnd::Shutdown => break,
                StreamEnd::EngineGone => {
                    warn!("Event channel closed, stopping connection");
                    break;
                }
            }

            attempt = attempt.saturating_add(1);
            if !self.policy.allows(attempt) {
                error!(
                    "Failed to reconnect after {} attempts, giving up",
                    attempt - 1
                );
                break;
            }

            let delay = self.policy.delay_for(attempt);
            self.set_state(ConnectionState::ReconnectPending { attempt, delay });
            info!(
                "Reconnection attempt {} in {}ms",
                attempt,
                delay.as_millis()
            );

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("Shutdown requested during reconnect delay");
                    break;
                }
                control = self.control_rx.recv() => match control {
                    Some(ConnectionControl::Reconnect) => {
                        debug!("Reconnect requested, skipping delay");
                    }
                    None => break,
                },
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.set_state(ConnectionState::Disconnected);
        info!("Connection loop ended");
    }

    /// Read one open stream until it ends. The stream is dropped (closed)
    /// when this returns.
    async fn read_stream(&mut self, mut stream: ByteStream) -> StreamEnd {
        let mut decoder = SseDecoder::new();

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return StreamEnd::Shutdown,
                control = self.control_rx.recv() => match control {
                    Some(ConnectionControl::Reconnect) => return StreamEnd::Reconnect,
                    None => return StreamEnd::Shutdown,
                },
                chunk = stream.next() => match chunk {
                    Some(Ok(bytes)) => {
                        for frame in decoder.feed(&bytes) {
                            if !self.forward(frame).await {
                                return StreamEnd::EngineGone;
                            }
                        }
                    }
                    Some(Err(e)) => return StreamEnd::Failed(e.to_string()),
                    None => {
                        if let Some(frame) = decoder.finish() {
                            if !self.forward(frame).await {
                                return StreamEnd::EngineGone;
                            }
                        }
                        return StreamEnd::Failed("stream ended by server".to_string());
                    }
                },
            }
        }
    }

    /// Classify a frame and hand it to the engine. Returns false once the
    /// engine has stopped.
    async fn forward(&self, frame: SseFrame) -> bool {
        if let Some(retry) = frame.retry_ms {
            debug!("Server suggested retry of {}ms (ignored)", retry);
        }

        match classify(&frame.data) {
            Ok(event) => {
                debug!("Received {} event", event.tag());
                self.events_tx.send(event).await.is_ok()
            }
            Err(e) => {
                warn!("Discarding message: {}", e);
                true
            }
        }
    }
}
