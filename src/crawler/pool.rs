//! Bounded worker pool
//!
//! The pool admits at most `capacity` fetch tasks at once:
//! - A global semaphore holds one permit per running task
//! - Permits are acquired before a URL is taken off the frontier, so a
//!   dequeued URL always has a slot
//! - Finished tasks are reaped from a `JoinSet`, which is how the engine
//!   notices completions and panics

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};

/// How a worker task ended
#[derive(Debug)]
pub enum TaskExit {
    /// The task ran to completion for this URL
    Finished(String),

    /// The task panicked or was cancelled
    Aborted(JoinError),
}

impl From<Result<String, JoinError>> for TaskExit {
    fn from(result: Result<String, JoinError>) -> Self {
        match result {
            Ok(url) => Self::Finished(url),
            Err(e) => Self::Aborted(e),
        }
    }
}

/// Fixed-capacity pool of fetch tasks
pub struct WorkerPool {
    /// Global semaphore for limiting concurrent fetches
    semaphore: Arc<Semaphore>,

    /// Spawned tasks not yet reaped; each yields the URL it processed
    tasks: JoinSet<String>,

    capacity: usize,
}

impl WorkerPool {
    /// Creates a pool admitting at most `capacity` concurrent tasks
    ///
    /// A capacity of zero is raised to one so the crawl can make progress.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            tasks: JoinSet::new(),
            capacity,
        }
    }

    /// The configured concurrency bound
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of tasks currently holding a slot
    pub fn active(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }

    /// Returns true when no task is running and every finished task was reaped
    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Reserves a slot without waiting; `None` when the pool is full
    pub fn try_reserve(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.semaphore).try_acquire_owned().ok()
    }

    /// Spawns a task into a reserved slot
    ///
    /// The slot is released when the task finishes, panics, or is cancelled.
    pub fn spawn<Fut>(&mut self, permit: OwnedSemaphorePermit, task: Fut)
    where
        Fut: Future<Output = String> + Send + 'static,
    {
        self.tasks.spawn(async move {
            let _permit = permit;
            task.await
        });
    }

    /// Reaps every task that has already finished, without waiting
    pub fn reap_finished(&mut self) -> Vec<TaskExit> {
        let mut exits = Vec::new();
        while let Some(result) = self.tasks.try_join_next() {
            exits.push(result.into());
        }
        exits
    }

    /// Waits up to `timeout` for any task to finish
    ///
    /// Returns `None` on timeout. When no task is spawned it sleeps for the
    /// timeout instead of returning immediately, so callers never spin.
    pub async fn wait_any(&mut self, timeout: Duration) -> Option<TaskExit> {
        if self.tasks.is_empty() {
            tokio::time::sleep(timeout).await;
            return None;
        }

        match tokio::time::timeout(timeout, self.tasks.join_next()).await {
            Ok(Some(result)) => Some(result.into()),
            Ok(None) | Err(_) => None,
        }
    }
}
