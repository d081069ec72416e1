//! The engine task: sole owner of the event store and the stats.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::events::Event;
use crate::stats::{StatsAggregator, StatsSnapshot};
use crate::store::{EventStore, PromptEntry};

/// Requests served by the engine, each answered on its own oneshot.
#[derive(Debug)]
pub(crate) enum EngineCommand {
    Snapshot(oneshot::Sender<StatsSnapshot>),
    Recent(oneshot::Sender<Vec<Event>>),
    History(oneshot::Sender<Vec<Event>>),
    Prompts(oneshot::Sender<Vec<PromptEntry>>),
    /// Clear store and stats together
    Reset(oneshot::Sender<StatsSnapshot>),
    /// Recompute stats now instead of waiting for the next tick
    RefreshNow(oneshot::Sender<StatsSnapshot>),
}

pub(crate) struct Engine {
    pub store: EventStore,
    pub stats: StatsAggregator,
    pub events_rx: mpsc::Receiver<Event>,
    pub commands_rx: mpsc::Receiver<EngineCommand>,
    pub recorded_tx: broadcast::Sender<Event>,
    pub stats_tx: watch::Sender<StatsSnapshot>,
    pub refresh_interval: Duration,
    pub cancel: CancellationToken,
}

impl Engine {
    /// Serve events, commands and refresh ticks from one loop, so record,
    /// refresh and reset never interleave. Queued events are recorded before
    /// any command is answered: a query reflects every event delivered
    /// before it was sent. Runs until cancelled or until both input channels
    /// have closed.
    pub(crate) async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut events_open = true;
        let mut commands_open = true;

        while events_open || commands_open {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("Engine cancelled");
                    break;
                }
                event = self.events_rx.recv(), if events_open => match event {
                    Some(event) => self.record(event),
                    None => {
                        debug!("Event channel closed");
                        events_open = false;
                    }
                },
                command = self.commands_rx.recv(), if commands_open => match command {
                    Some(command) => self.handle(command),
                    None => {
                        debug!("Command channel closed");
                        commands_open = false;
                    }
                },
                _ = ticker.tick() => {
                    self.refresh();
                }
            }
        }

        info!(
            "Engine stopped after {} events",
            self.store.counters().total
        );
    }

    fn record(&mut self, event: Event) {
        self.store.record(event.clone());
        // No subscribers is fine
        let _ = self.recorded_tx.send(event);
    }

    fn refresh(&mut self) -> StatsSnapshot {
        self.stats.refresh(&self.store);
        let snapshot = self.stats.snapshot(&self.store);
        self.stats_tx.send_replace(snapshot.clone());
        snapshot
    }

    fn handle(&mut self, command: EngineCommand) {
        // A dropped reply receiver only means the caller stopped waiting
        match command {
            EngineCommand::Snapshot(reply) => {
                let _ = reply.send(self.stats.snapshot(&self.store));
            }
            EngineCommand::Recent(reply) => {
                let _ = reply.send(self.store.recent_snapshot());
            }
            EngineCommand::History(reply) => {
                let _ = reply.send(self.store.history_snapshot());
            }
            EngineCommand::Prompts(reply) => {
                let _ = reply.send(self.store.prompts_snapshot());
            }
            EngineCommand::Reset(reply) => {
                let dropped = self.store.counters().total;
                self.store.reset();
                self.stats.reset();
                let snapshot = self.stats.snapshot(&self.store);
                self.stats_tx.send_replace(snapshot.clone());
                info!("Local state reset ({} events dropped)", dropped);
                let _ = reply.send(snapshot);
            }
            EngineCommand::RefreshNow(reply) => {
                let snapshot = self.refresh();
                let _ = reply.send(snapshot);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn engine() -> (
        Engine,
        mpsc::Sender<Event>,
        mpsc::Sender<EngineCommand>,
        broadcast::Receiver<Event>,
    ) {
        let (events_tx, events_rx) = mpsc::channel(64);
        let (commands_tx, commands_rx) = mpsc::channel(8);
        let (recorded_tx, recorded_rx) = broadcast::channel(64);
        let (stats_tx, _stats_rx) = watch::channel(StatsSnapshot::default());
        let engine = Engine {
            store: EventStore::default(),
            stats: StatsAggregator::new(),
            events_rx,
            commands_rx,
            recorded_tx,
            stats_tx,
            refresh_interval: Duration::from_secs(60),
            cancel: CancellationToken::new(),
        };
        (engine, events_tx, commands_tx, recorded_rx)
    }

    fn heartbeat() -> Event {
        Event::from_parts(Some("heartbeat"), None, None, Map::new())
    }

    #[tokio::test]
    async fn test_queued_events_are_recorded_before_a_command_is_answered() {
        let (engine, events_tx, commands_tx, mut recorded_rx) = engine();
        for _ in 0..20 {
            events_tx.send(heartbeat()).await.unwrap();
        }
        let (reply_tx, reply_rx) = oneshot::channel();
        commands_tx
            .send(EngineCommand::RefreshNow(reply_tx))
            .await
            .unwrap();

        let cancel = engine.cancel.clone();
        let task = tokio::spawn(engine.run());

        let snapshot = reply_rx.await.unwrap();
        assert_eq!(snapshot.counters.total, 20);
        assert_eq!(snapshot.counters.heartbeat, 20);

        // Every recorded event is already waiting for subscribers
        for _ in 0..20 {
            assert!(recorded_rx.try_recv().is_ok());
        }

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_stops_when_both_channels_close() {
        let (engine, events_tx, commands_tx, _recorded_rx) = engine();
        events_tx.send(heartbeat()).await.unwrap();
        drop(events_tx);
        drop(commands_tx);

        tokio::time::timeout(Duration::from_secs(5), engine.run())
            .await
            .unwrap();
    }
}
