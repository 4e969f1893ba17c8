//! Crawl engine - bounded-concurrency frontier crawl with a pull interface
//!
//! The engine owns the frontier, the result stream and the worker pool. The
//! consumer drives it by calling [`CrawlEngine::next_result`], which:
//! - returns a buffered record immediately when one is available
//! - otherwise reaps finished workers, dispatches new URLs up to the
//!   concurrency bound, and waits a short poll interval for progress
//! - signals completion once the frontier is empty, no worker is running and
//!   no record is buffered
//!
//! Workers run [`process_url`]: fetch, classify, enqueue links, offer the
//! record. Failures inside a worker are counted and never leave the task.

use crate::config::{CrawlerConfig, DEFAULT_CONCURRENCY, DEFAULT_POLL_INTERVAL_MS};
use crate::crawler::extractor::{PageExtractor, PageOutcome};
use crate::crawler::fetcher::{FetchOutcome, Fetcher};
use crate::crawler::frontier::{EnqueueOutcome, Frontier};
use crate::crawler::pool::{TaskExit, WorkerPool};
use crate::crawler::results::{PendingRecord, ResultStream};
use crate::crawler::stats::{bump, CrawlStats, StatsSnapshot};
use crate::state::CrawlPhase;
use crate::url::{normalize_url, resolve_link};
use crate::HarvestError;
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use url::Url;

/// Result of a single pull from the engine
#[derive(Debug)]
pub enum NextResult {
    /// The next extracted record, in completion order
    Record(PendingRecord),

    /// The crawl is finished; every further pull returns this again
    Completed,

    /// A worker task died outside the isolated fetch/extract path
    ///
    /// The crawl itself continues; pull again to resume.
    Failed(HarvestError),
}

impl NextResult {
    /// Returns true for [`NextResult::Completed`]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns the record, if this result carries one
    pub fn into_record(self) -> Option<PendingRecord> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }
}

/// Tuning knobs for a [`CrawlEngine`]
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Fixed base for resolving relative links; defaults to the seed's origin
    pub base_url: Option<String>,

    /// Maximum number of concurrently running fetch tasks
    pub concurrency: usize,

    /// Bounded wait between dispatch polls inside `next_result`
    pub poll_interval: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            concurrency: DEFAULT_CONCURRENCY,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl EngineOptions {
    /// Builds options from the `[crawler]` configuration section
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            base_url: Some(config.effective_base_url()),
            concurrency: config.concurrency,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }
}

/// State shared between the dispatch loop and every worker task
struct Shared<F, E> {
    frontier: Frontier,
    results: ResultStream,
    stats: CrawlStats,
    fetcher: F,
    extractor: E,
    base_url: Url,
}

impl<F, E> Shared<F, E> {
    /// Feeds a classified page back into the crawl
    fn absorb(&self, url: &str, outcome: PageOutcome) {
        if !outcome.of_interest {
            bump(&self.stats.pages_ignored);
            tracing::debug!("Ignoring {}", url);
            return;
        }

        bump(&self.stats.pages_of_interest);
        tracing::info!("{}", url);

        for link in &outcome.links {
            self.enqueue_link(link);
        }

        if let Some(e) = outcome.record_error {
            bump(&self.stats.extraction_failures);
            tracing::warn!("No record from {}: {}", url, e);
        }

        if let Some(record) = outcome.record {
            let entity_id = record.entity_id().to_string();
            if self.results.offer(record) {
                bump(&self.stats.records_emitted);
            } else {
                bump(&self.stats.duplicate_records);
                tracing::debug!("Dropping duplicate record {} from {}", entity_id, url);
            }
        }
    }

    fn enqueue_link(&self, link: &str) {
        let normalized = match resolve_link(link, &self.base_url).map(|l| normalize_url(&l)) {
            Some(Ok(url)) => url,
            Some(Err(e)) => {
                bump(&self.stats.invalid_links);
                tracing::trace!("Skipping link {}: {}", link, e);
                return;
            }
            None => {
                bump(&self.stats.invalid_links);
                tracing::trace!("Skipping unusable link {}", link);
                return;
            }
        };

        match self.frontier.enqueue(normalized.as_str()) {
            EnqueueOutcome::Queued => bump(&self.stats.links_enqueued),
            EnqueueOutcome::AlreadyQueued | EnqueueOutcome::AlreadyDispatched => {
                bump(&self.stats.links_rejected)
            }
        }
    }
}

/// Bounded-concurrency crawl over a dynamically discovered link graph
///
/// # Example
///
/// ```no_run
/// use market_harvest::config::Config;
/// use market_harvest::crawler::{HttpFetcher, MarketExtractor};
/// use market_harvest::{CrawlEngine, EngineOptions, NextResult};
///
/// # async fn run() -> market_harvest::Result<()> {
/// let config = Config::default();
/// let options = EngineOptions::from_config(&config.crawler);
/// let base = config.crawler.effective_base_url();
/// let mut engine = CrawlEngine::new(
///     &config.crawler.seed_url,
///     options,
///     HttpFetcher::new(&config)?,
///     MarketExtractor::new(&base)?,
/// )?;
///
/// while let NextResult::Record(record) = engine.next_result().await {
///     println!("{}", record.entity_id());
/// }
/// # Ok(())
/// # }
/// ```
pub struct CrawlEngine<F, E> {
    shared: Arc<Shared<F, E>>,
    pool: WorkerPool,
    poll_interval: Duration,
    phase: CrawlPhase,
    /// Worker failures reaped but not yet reported to the consumer
    failures: VecDeque<HarvestError>,
}

impl<F: Fetcher, E: PageExtractor> CrawlEngine<F, E> {
    /// Creates an engine whose frontier holds only the normalized seed URL
    ///
    /// # Errors
    ///
    /// Fails if the seed or the configured base URL is not an absolute
    /// HTTP(S) URL.
    pub fn new(
        seed_url: &str,
        options: EngineOptions,
        fetcher: F,
        extractor: E,
    ) -> Result<Self, HarvestError> {
        let seed = normalize_url(seed_url)?;

        let base_url = match &options.base_url {
            Some(base) => Url::parse(base)?,
            None => seed.join("/")?,
        };

        tracing::info!(
            "Crawl engine seeded with {} (base {}, concurrency {})",
            seed,
            base_url,
            options.concurrency
        );

        let shared = Shared {
            frontier: Frontier::with_seed(seed.as_str()),
            results: ResultStream::new(),
            stats: CrawlStats::new(),
            fetcher,
            extractor,
            base_url,
        };

        Ok(Self {
            shared: Arc::new(shared),
            pool: WorkerPool::new(options.concurrency),
            poll_interval: options.poll_interval,
            phase: CrawlPhase::DrainingAndDispatching,
            failures: VecDeque::new(),
        })
    }

    /// Returns the next record, a completion signal, or a worker failure
    ///
    /// Buffered records are returned without waiting. Otherwise the call keeps
    /// dispatching and waiting in steps of the poll interval until a record
    /// arrives or the crawl is exhausted. After `Completed` has been returned
    /// once, every later call returns `Completed` immediately.
    pub async fn next_result(&mut self) -> NextResult {
        loop {
            if self.phase.is_terminal() {
                return NextResult::Completed;
            }

            if let Some(record) = self.shared.results.pop() {
                self.refresh_phase();
                return NextResult::Record(record);
            }

            if let Some(error) = self.failures.pop_front() {
                self.refresh_phase();
                return NextResult::Failed(error);
            }

            for exit in self.pool.reap_finished() {
                self.record_exit(exit);
            }

            self.dispatch();

            match self.refresh_phase() {
                CrawlPhase::Delivering => continue,
                CrawlPhase::Done => return NextResult::Completed,
                CrawlPhase::DrainingAndDispatching => {
                    tracing::trace!(
                        "Waiting: {} queued, {} active",
                        self.shared.frontier.len(),
                        self.pool.active()
                    );
                    if let Some(exit) = self.pool.wait_any(self.poll_interval).await {
                        self.record_exit(exit);
                    }
                }
            }
        }
    }

    /// Moves the phase on from what is buffered and what is still in flight
    ///
    /// Logs the crawl summary on the transition into `Done`.
    fn refresh_phase(&mut self) -> CrawlPhase {
        let results_buffered = !self.shared.results.is_empty() || !self.failures.is_empty();
        let work_remaining = !self.shared.frontier.is_empty() || !self.pool.is_idle();

        let previous = self.phase;
        self.phase = previous.advance(results_buffered, work_remaining);

        if self.phase.is_terminal() && !previous.is_terminal() {
            let stats = self.stats();
            tracing::info!(
                "Crawl complete: {} dispatched, {} records, {} not found, {} failed",
                stats.dispatched,
                stats.records_emitted,
                stats.not_found,
                stats.fetch_failures
            );
        }

        self.phase
    }

    /// Starts workers for queued URLs until the pool is full or the frontier empty
    fn dispatch(&mut self) {
        // A slot is reserved before dequeuing so a dequeued URL is never parked
        while let Some(permit) = self.pool.try_reserve() {
            let url = match self.shared.frontier.dequeue_for_dispatch() {
                Some(url) => url,
                None => break,
            };

            if let Some(entity_id) = self.shared.extractor.entity_hint(&url) {
                if self.shared.results.has_seen(&entity_id) {
                    bump(&self.shared.stats.skipped_known_entity);
                    tracing::debug!("Skipping {}: entity {} already harvested", url, entity_id);
                    continue;
                }
            }

            bump(&self.shared.stats.dispatched);
            tracing::debug!("Dispatching {}", url);
            self.pool
                .spawn(permit, process_url(Arc::clone(&self.shared), url));
        }
    }

    fn record_exit(&mut self, exit: TaskExit) {
        if let TaskExit::Aborted(error) = exit {
            let failure = self.task_failure(error);
            self.failures.push_back(failure);
        }
    }

    fn task_failure(&self, error: JoinError) -> HarvestError {
        if error.is_panic() {
            bump(&self.shared.stats.worker_panics);
            let message = panic_message(&*error.into_panic());
            tracing::error!("Worker task panicked: {}", message);
            HarvestError::WorkerPanic(message)
        } else {
            tracing::warn!("Worker task was cancelled");
            HarvestError::TaskCancelled
        }
    }

    /// Current state of the pull state machine
    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Snapshot of the crawl counters
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Number of URLs waiting in the frontier
    pub fn frontier_len(&self) -> usize {
        self.shared.frontier.len()
    }

    /// Number of worker tasks currently holding a slot
    pub fn active_workers(&self) -> usize {
        self.pool.active()
    }

    /// Number of distinct entities harvested so far
    pub fn entities_seen(&self) -> usize {
        self.shared.results.seen_count()
    }
}

/// Fetches and classifies one URL, feeding links and records back into the crawl
///
/// Returns the URL so the pool can report which task finished.
async fn process_url<F: Fetcher, E: PageExtractor>(shared: Arc<Shared<F, E>>, url: String) -> String {
    let body = match shared.fetcher.fetch(&url).await {
        FetchOutcome::Ok(body) => body,
        FetchOutcome::NotFound => {
            bump(&shared.stats.not_found);
            tracing::debug!("Not found: {}", url);
            return url;
        }
        FetchOutcome::OtherFailure(reason) => {
            bump(&shared.stats.fetch_failures);
            tracing::warn!("Failed to fetch {}: {}", url, reason);
            return url;
        }
    };

    let extracted = panic::catch_unwind(AssertUnwindSafe(|| {
        shared.extractor.classify_and_extract(&url, &body)
    }));

    match extracted {
        Ok(Ok(outcome)) => shared.absorb(&url, outcome),
        Ok(Err(e)) => {
            bump(&shared.stats.extraction_failures);
            tracing::warn!("Extraction failed for {}: {}", url, e);
        }
        Err(payload) => {
            bump(&shared.stats.extraction_failures);
            tracing::warn!(
                "Extractor panicked on {}: {}",
                url,
                panic_message(&*payload)
            );
        }
    }

    url
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
