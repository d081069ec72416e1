//! Provider and model breakdowns derived from the event history.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::{EventCategory, UNKNOWN_LABEL};
use crate::store::{Counters, EventStore};

/// Derived statistics, recomputed from history on each refresh.
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    provider_breakdown: BTreeMap<String, u64>,
    model_breakdown: BTreeMap<String, u64>,
    refreshed_at: Option<DateTime<Utc>>,
    refreshes: u64,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute both breakdowns from every retained `query_start` in
    /// `store`'s history. Linear in the history length.
    pub fn refresh(&mut self, store: &EventStore) {
        let mut providers = BTreeMap::new();
        let mut models = BTreeMap::new();

        for query in store.history().filter_map(|e| e.as_query_start()) {
            *providers
                .entry(query.provider_or_unknown().to_string())
                .or_insert(0) += 1;
            *models
                .entry(query.model_or_unknown().to_string())
                .or_insert(0) += 1;
        }

        self.provider_breakdown = providers;
        self.model_breakdown = models;
        self.refreshed_at = Some(Utc::now());
        self.refreshes += 1;
    }

    pub fn reset(&mut self) {
        self.provider_breakdown.clear();
        self.model_breakdown.clear();
    }

    pub fn provider_breakdown(&self) -> &BTreeMap<String, u64> {
        &self.provider_breakdown
    }

    pub fn model_breakdown(&self) -> &BTreeMap<String, u64> {
        &self.model_breakdown
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    /// Combine the live store counters with the last computed breakdowns.
    pub fn snapshot(&self, store: &EventStore) -> StatsSnapshot {
        StatsSnapshot {
            counters: store.counters(),
            providers: self.provider_breakdown.clone(),
            models: self.model_breakdown.clone(),
            history_len: store.history_len(),
            recent_len: store.recent_len(),
            refreshed_at: self.refreshed_at,
            refreshes: self.refreshes,
        }
    }
}

/// Point-in-time view of counters and breakdowns handed to presenters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub counters: Counters,
    pub providers: BTreeMap<String, u64>,
    pub models: BTreeMap<String, u64>,
    pub history_len: usize,
    pub recent_len: usize,
    pub refreshed_at: Option<DateTime<Utc>>,
    /// Number of refreshes since the engine started
    pub refreshes: u64,
}

impl StatsSnapshot {
    /// Events recorded without a recognized category.
    pub fn unknown_count(&self) -> u64 {
        self.counters.get(EventCategory::Unknown)
    }

    /// Count for the `"unknown"` provider bucket.
    pub fn unattributed_queries(&self) -> u64 {
        self.providers.get(UNKNOWN_LABEL).copied().unwrap_or(0)
    }
}
