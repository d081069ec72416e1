//! Cloneable front for the engine task.

use tokio::sync::{broadcast, mpsc, oneshot, watch};

use super::engine::EngineCommand;
use crate::error::{MonitorError, MonitorResult};
use crate::events::Event;
use crate::stats::StatsSnapshot;
use crate::store::PromptEntry;

/// Query and subscription handle for a running monitor.
///
/// Every read goes through the engine, so a reply always reflects a
/// consistent point between two recorded events.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    commands_tx: mpsc::Sender<EngineCommand>,
    recorded_tx: broadcast::Sender<Event>,
    stats_rx: watch::Receiver<StatsSnapshot>,
}

impl MonitorHandle {
    pub(crate) fn new(
        commands_tx: mpsc::Sender<EngineCommand>,
        recorded_tx: broadcast::Sender<Event>,
        stats_rx: watch::Receiver<StatsSnapshot>,
    ) -> Self {
        Self {
            commands_tx,
            recorded_tx,
            stats_rx,
        }
    }

    /// Receive every event after it has been recorded, in arrival order.
    ///
    /// A subscriber that falls too far behind gets
    /// [`broadcast::error::RecvError::Lagged`] and skips ahead.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.recorded_tx.subscribe()
    }

    /// Watch the periodically refreshed stats.
    pub fn watch_stats(&self) -> watch::Receiver<StatsSnapshot> {
        self.stats_rx.clone()
    }

    /// Last published stats, without a round trip to the engine.
    pub fn latest_stats(&self) -> StatsSnapshot {
        self.stats_rx.borrow().clone()
    }

    /// Current counters with the breakdowns from the last refresh.
    pub async fn snapshot(&self) -> MonitorResult<StatsSnapshot> {
        self.request(EngineCommand::Snapshot).await
    }

    /// The recent window, oldest first.
    pub async fn recent(&self) -> MonitorResult<Vec<Event>> {
        self.request(EngineCommand::Recent).await
    }

    /// The full history, oldest first.
    pub async fn history(&self) -> MonitorResult<Vec<Event>> {
        self.request(EngineCommand::History).await
    }

    /// Prompt log, newest first.
    pub async fn prompts(&self) -> MonitorResult<Vec<PromptEntry>> {
        self.request(EngineCommand::Prompts).await
    }

    /// Recompute the breakdowns now and publish them.
    pub async fn refresh_now(&self) -> MonitorResult<StatsSnapshot> {
        self.request(EngineCommand::RefreshNow).await
    }

    /// Empty the store and the stats in one step.
    pub(crate) async fn reset(&self) -> MonitorResult<StatsSnapshot> {
        self.request(EngineCommand::Reset).await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> EngineCommand,
    ) -> MonitorResult<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| MonitorError::EngineStopped)?;
        reply_rx.await.map_err(|_| MonitorError::EngineStopped)
    }
}
