//! Frontier queue and dispatch bookkeeping
//!
//! The frontier holds URLs that have not been handed to a worker yet, in FIFO
//! order. It also owns the set of dispatched URLs, so the enqueue-time check
//! ("is this URL queued or already dispatched?") and the insert happen inside
//! a single critical section.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// What happened to a URL offered to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The URL was appended to the queue
    Queued,

    /// The URL is already waiting in the queue
    AlreadyQueued,

    /// The URL was handed to a worker earlier
    AlreadyDispatched,
}

impl EnqueueOutcome {
    /// Returns true if the URL was added
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued)
    }
}

#[derive(Debug, Default)]
struct FrontierInner {
    /// Pending URLs, oldest first
    queue: VecDeque<String>,

    /// Mirror of `queue` for O(1) membership checks
    queued: HashSet<String>,

    /// Every URL ever returned by `dequeue_for_dispatch` (grows monotonically)
    dispatched: HashSet<String>,
}

/// FIFO frontier with duplicate suppression
///
/// All methods take `&self`; the frontier is shared between the dispatch loop
/// and every worker task.
#[derive(Debug, Default)]
pub struct Frontier {
    inner: Mutex<FrontierInner>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a frontier seeded with a single URL
    pub fn with_seed(seed: impl Into<String>) -> Self {
        let frontier = Self::new();
        frontier.enqueue(seed);
        frontier
    }

    fn lock(&self) -> MutexGuard<'_, FrontierInner> {
        // A worker panicking elsewhere must not take the frontier down with it.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a URL unless it is already queued or already dispatched
    ///
    /// The membership check and the insert are one atomic step, so two workers
    /// discovering the same link at the same time queue it exactly once.
    pub fn enqueue(&self, url: impl Into<String>) -> EnqueueOutcome {
        let url = url.into();
        let mut inner = self.lock();

        if inner.dispatched.contains(&url) {
            return EnqueueOutcome::AlreadyDispatched;
        }

        if !inner.queued.insert(url.clone()) {
            return EnqueueOutcome::AlreadyQueued;
        }

        inner.queue.push_back(url);
        EnqueueOutcome::Queued
    }

    /// Removes the oldest pending URL and marks it dispatched
    ///
    /// Never blocks. Returns `None` when the queue is currently empty. A URL is
    /// returned by this method at most once over the frontier's lifetime.
    pub fn dequeue_for_dispatch(&self) -> Option<String> {
        let mut inner = self.lock();

        while let Some(url) = inner.queue.pop_front() {
            inner.queued.remove(&url);
            if inner.dispatched.insert(url.clone()) {
                return Some(url);
            }
        }

        None
    }

    /// Returns the number of URLs waiting to be dispatched
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    /// Returns whether no URL is waiting to be dispatched
    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    /// Returns the number of URLs handed to workers so far
    pub fn dispatched_count(&self) -> usize {
        self.lock().dispatched.len()
    }

    /// Returns whether a URL has been handed to a worker
    pub fn was_dispatched(&self, url: &str) -> bool {
        self.lock().dispatched.contains(url)
    }
}
