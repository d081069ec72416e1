//! Wiring of the connection, the engine and the backend client.
//!
//! [`Monitor::start`] spawns two tasks. The connection task feeds classified
//! events into the engine task, which is the only writer of the event store
//! and the stats. Everything else reads through a [`MonitorHandle`].

mod engine;
mod handle;

pub use handle::MonitorHandle;

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::adapters::ReqwestHttpClient;
use crate::backend::BackendClient;
use crate::clear::ClearCommand;
use crate::config::MonitorConfig;
use crate::connection::{ConnectionHandle, StreamConnection};
use crate::error::MonitorResult;
use crate::stats::{StatsAggregator, StatsSnapshot};
use crate::store::EventStore;
use crate::traits::HttpClient;
use engine::Engine;

const EVENT_CHANNEL_CAPACITY: usize = 1024;
const COMMAND_CHANNEL_CAPACITY: usize = 32;
const BROADCAST_CAPACITY: usize = 256;

/// A running monitor.
pub struct Monitor {
    handle: MonitorHandle,
    connection: ConnectionHandle,
    backend: BackendClient,
    cancel: CancellationToken,
    engine_task: JoinHandle<()>,
    connection_task: JoinHandle<()>,
}

impl Monitor {
    /// Start against a real backend over HTTP.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(config: MonitorConfig) -> MonitorResult<Self> {
        let http = ReqwestHttpClient::from_config(&config)?;
        Self::start_with_client(config, Arc::new(http))
    }

    /// Start with a caller-supplied HTTP client.
    pub fn start_with_client(
        config: MonitorConfig,
        http: Arc<dyn HttpClient>,
    ) -> MonitorResult<Self> {
        config.validate()?;

        let backend = BackendClient::new(http, config.base_url.clone());
        let cancel = CancellationToken::new();

        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (recorded_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (stats_tx, stats_rx) = watch::channel(StatsSnapshot::default());

        let engine = Engine {
            store: EventStore::new(config.recent_capacity)
                .with_history_limit(config.history_limit),
            stats: StatsAggregator::new(),
            events_rx,
            commands_rx,
            recorded_tx: recorded_tx.clone(),
            stats_tx,
            refresh_interval: config.stats_interval,
            cancel: cancel.clone(),
        };
        let engine_task = tokio::spawn(engine.run());

        // A child token lets the connection stop on its own while the
        // engine keeps serving queries.
        let (connection, connection_task) = StreamConnection::new(
            backend.clone(),
            config.reconnect,
        )
        .spawn(events_tx, cancel.child_token());

        info!("Monitor started for {}", backend.base_url());

        Ok(Self {
            handle: MonitorHandle::new(commands_tx, recorded_tx, stats_rx),
            connection,
            backend,
            cancel,
            engine_task,
            connection_task,
        })
    }

    pub fn handle(&self) -> MonitorHandle {
        self.handle.clone()
    }

    pub fn connection(&self) -> ConnectionHandle {
        self.connection.clone()
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    /// A clear command bound to this monitor's backend and state.
    pub fn clear_command(&self) -> ClearCommand {
        ClearCommand::new(self.backend.clone(), self.handle.clone())
    }

    /// Stop both tasks and wait for them to finish.
    pub async fn shutdown(self) {
        info!("Shutting down monitor");
        self.cancel.cancel();

        if let Err(e) = self.connection_task.await {
            error!("Connection task failed: {}", e);
        }
        if let Err(e) = self.engine_task.await {
            error!("Engine task failed: {}", e);
        }
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("base_url", &self.backend.base_url())
            .field("connection", &self.connection.state())
            .finish()
    }
}
