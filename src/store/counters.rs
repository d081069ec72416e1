//! Per-category event counters.

use serde::{Deserialize, Serialize};

use crate::events::EventCategory;

/// Running totals since the last reset.
///
/// `total` counts every recorded event. Each known category has its own
/// counter; unknown events only contribute to `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub total: u64,
    pub query_start: u64,
    pub stream_chunk: u64,
    pub query_complete: u64,
    pub error: u64,
    pub heartbeat: u64,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one event of the given category.
    pub fn record(&mut self, category: EventCategory) {
        self.total += 1;
        match category {
            EventCategory::QueryStart => self.query_start += 1,
            EventCategory::StreamChunk => self.stream_chunk += 1,
            EventCategory::QueryComplete => self.query_complete += 1,
            EventCategory::Error => self.error += 1,
            EventCategory::Heartbeat => self.heartbeat += 1,
            EventCategory::Unknown => {}
        }
    }

    /// Counter for a category. `Unknown` has no counter of its own and
    /// reports the events not covered by any known category.
    pub fn get(&self, category: EventCategory) -> u64 {
        match category {
            EventCategory::QueryStart => self.query_start,
            EventCategory::StreamChunk => self.stream_chunk,
            EventCategory::QueryComplete => self.query_complete,
            EventCategory::Error => self.error,
            EventCategory::Heartbeat => self.heartbeat,
            EventCategory::Unknown => self.total - self.known_total(),
        }
    }

    fn known_total(&self) -> u64 {
        EventCategory::KNOWN.iter().map(|c| self.get(*c)).sum()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_known_category() {
        let mut counters = Counters::new();
        counters.record(EventCategory::QueryStart);
        counters.record(EventCategory::StreamChunk);
        counters.record(EventCategory::StreamChunk);

        assert_eq!(counters.total, 3);
        assert_eq!(counters.query_start, 1);
        assert_eq!(counters.stream_chunk, 2);
        assert_eq!(counters.get(EventCategory::Unknown), 0);
    }

    #[test]
    fn test_unknown_only_counts_toward_total() {
        let mut counters = Counters::new();
        counters.record(EventCategory::Unknown);

        assert_eq!(counters.total, 1);
        for category in EventCategory::KNOWN {
            assert_eq!(counters.get(category), 0);
        }
        assert_eq!(counters.get(EventCategory::Unknown), 1);
    }

    #[test]
    fn test_reset() {
        let mut counters = Counters::new();
        counters.record(EventCategory::Error);
        counters.reset();
        assert_eq!(counters, Counters::default());
    }
}
