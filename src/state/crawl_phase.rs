//! Crawl phase definitions for the pull-based result stream
//!
//! The engine moves through these phases as the consumer pulls results.

use std::fmt;

/// Represents the current phase of a crawl as seen by the consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Results are buffered and the next pull returns one immediately
    Delivering,

    /// No results are buffered but URLs are queued or fetches are in flight
    DrainingAndDispatching,

    /// Frontier empty, no workers active, no results buffered (terminal)
    Done,
}

impl CrawlPhase {
    /// Computes the phase that follows this one
    ///
    /// `Done` is absorbing: once reached, no observation moves the engine back.
    ///
    /// # Arguments
    ///
    /// * `results_buffered` - Whether the result stream holds at least one record
    /// * `work_remaining` - Whether the frontier is non-empty or any worker is active
    pub fn advance(self, results_buffered: bool, work_remaining: bool) -> Self {
        match self {
            Self::Done => Self::Done,
            _ if results_buffered => Self::Delivering,
            _ if work_remaining => Self::DrainingAndDispatching,
            _ => Self::Done,
        }
    }

    /// Returns true if no further results will ever be produced
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Short lowercase name used in log output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivering => "delivering",
            Self::DrainingAndDispatching => "draining-and-dispatching",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
