//! Crawl counters shared by every worker
//!
//! Counters only ever increase; [`CrawlStats::snapshot`] gives a consistent
//! enough view for progress logs and the final summary.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters, updated concurrently by worker tasks
#[derive(Debug, Default)]
pub struct CrawlStats {
    pub(crate) dispatched: AtomicU64,
    pub(crate) not_found: AtomicU64,
    pub(crate) fetch_failures: AtomicU64,
    pub(crate) extraction_failures: AtomicU64,
    pub(crate) pages_of_interest: AtomicU64,
    pub(crate) pages_ignored: AtomicU64,
    pub(crate) records_emitted: AtomicU64,
    pub(crate) duplicate_records: AtomicU64,
    pub(crate) skipped_known_entity: AtomicU64,
    pub(crate) links_enqueued: AtomicU64,
    pub(crate) links_rejected: AtomicU64,
    pub(crate) invalid_links: AtomicU64,
    pub(crate) worker_panics: AtomicU64,
}

/// Point-in-time copy of the crawl counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// URLs handed to a worker
    pub dispatched: u64,
    /// Fetches classified as not found
    pub not_found: u64,
    /// Fetches that failed for any other reason
    pub fetch_failures: u64,
    /// Pages whose classification or extraction failed
    pub extraction_failures: u64,
    /// Pages classified as of interest
    pub pages_of_interest: u64,
    /// Pages fetched but classified as not of interest
    pub pages_ignored: u64,
    /// Records accepted into the result stream
    pub records_emitted: u64,
    /// Records dropped because their entity id was already seen
    pub duplicate_records: u64,
    /// URLs not dispatched because their predicted entity was already seen
    pub skipped_known_entity: u64,
    /// Links added to the frontier
    pub links_enqueued: u64,
    /// Links already queued or dispatched
    pub links_rejected: u64,
    /// Links that could not be resolved or normalized
    pub invalid_links: u64,
    /// Worker tasks that panicked outside the extractor
    pub worker_panics: u64,
}

impl StatsSnapshot {
    /// Total fetches that produced no page (not found plus other failures)
    pub fn total_fetch_failures(&self) -> u64 {
        self.not_found + self.fetch_failures
    }
}

pub(crate) fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl CrawlStats {
    /// Creates zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies every counter
    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            dispatched: load(&self.dispatched),
            not_found: load(&self.not_found),
            fetch_failures: load(&self.fetch_failures),
            extraction_failures: load(&self.extraction_failures),
            pages_of_interest: load(&self.pages_of_interest),
            pages_ignored: load(&self.pages_ignored),
            records_emitted: load(&self.records_emitted),
            duplicate_records: load(&self.duplicate_records),
            skipped_known_entity: load(&self.skipped_known_entity),
            links_enqueued: load(&self.links_enqueued),
            links_rejected: load(&self.links_rejected),
            invalid_links: load(&self.invalid_links),
            worker_panics: load(&self.worker_panics),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_zero() {
        assert_eq!(CrawlStats::new().snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_bump_and_snapshot() {
        let stats = CrawlStats::new();
        bump(&stats.not_found);
        bump(&stats.fetch_failures);
        bump(&stats.fetch_failures);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.not_found, 1);
        assert_eq!(snapshot.fetch_failures, 2);
        assert_eq!(snapshot.total_fetch_failures(), 3);
    }
}
