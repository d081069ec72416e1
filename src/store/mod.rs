//! In-memory event retention.
//!
//! [`EventStore`] keeps the full event history, a bounded buffer of the most
//! recent events, per-category counters and the prompt log. It is a plain
//! owned value with no interior locking: the monitor engine is its only
//! writer.

mod counters;
mod prompts;

pub use counters::Counters;
pub use prompts::PromptEntry;

use std::collections::VecDeque;

use crate::events::{Event, EventKind};

/// Default size of the recent-events buffer.
pub const DEFAULT_RECENT_CAPACITY: usize = 100;
/// Largest accepted size of the recent-events buffer.
pub const MAX_RECENT_CAPACITY: usize = 100_000;

/// History, recent buffer, counters and prompt log of everything recorded
/// since the last reset.
#[derive(Debug, Clone)]
pub struct EventStore {
    history: VecDeque<Event>,
    recent: VecDeque<Event>,
    counters: Counters,
    prompts: VecDeque<PromptEntry>,
    recent_capacity: usize,
    history_limit: Option<usize>,
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_CAPACITY)
    }
}

impl EventStore {
    /// Create an empty store with unbounded history.
    ///
    /// The recent buffer grows on demand, so `recent_capacity` only bounds it.
    pub fn new(recent_capacity: usize) -> Self {
        Self {
            history: VecDeque::new(),
            recent: VecDeque::new(),
            counters: Counters::new(),
            prompts: VecDeque::new(),
            recent_capacity,
            history_limit: None,
        }
    }

    /// Cap the history (and prompt log) at `limit` entries, evicting the
    /// oldest. `None` keeps everything.
    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }

    /// Record one classified event.
    pub fn record(&mut self, event: Event) {
        self.counters.record(event.category());

        if let EventKind::QueryStart(query) = &event.kind {
            self.prompts
                .push_back(PromptEntry::from_query_start(query, event.timestamp));
        }

        self.recent.push_back(event.clone());
        while self.recent.len() > self.recent_capacity {
            self.recent.pop_front();
        }

        self.history.push_back(event);
        if let Some(limit) = self.history_limit {
            while self.history.len() > limit {
                self.history.pop_front();
            }
            while self.prompts.len() > limit {
                self.prompts.pop_front();
            }
        }
    }

    /// Drop everything recorded so far.
    pub fn reset(&mut self) {
        self.history.clear();
        self.recent.clear();
        self.counters.reset();
        self.prompts.clear();
    }

    /// Retained history, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Event> {
        self.history.iter()
    }

    pub fn history_snapshot(&self) -> Vec<Event> {
        self.history.iter().cloned().collect()
    }

    /// Recent events, oldest first.
    pub fn recent_snapshot(&self) -> Vec<Event> {
        self.recent.iter().cloned().collect()
    }

    /// Prompt log, newest first.
    pub fn prompts_snapshot(&self) -> Vec<PromptEntry> {
        self.prompts.iter().rev().cloned().collect()
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn recent_len(&self) -> usize {
        self.recent.len()
    }

    pub fn recent_capacity(&self) -> usize {
        self.recent_capacity
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
