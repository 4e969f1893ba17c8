//! Crawler module for the bounded-concurrency harvest
//!
//! This module contains the core crawling logic, including:
//! - The frontier and result stream shared by all workers
//! - The worker pool bounding in-flight fetches
//! - The crawl engine and its pull interface
//! - The fetcher and page extractor boundaries, with their marketplace
//!   implementations

mod engine;
mod extractor;
mod fetcher;
mod frontier;
mod market;
mod pool;
mod results;
mod stats;

pub use engine::{CrawlEngine, EngineOptions, NextResult};
pub use extractor::{PageExtractor, PageOutcome};
pub use fetcher::{build_http_client, FetchOutcome, Fetcher, HttpFetcher};
pub use frontier::{EnqueueOutcome, Frontier};
pub use market::MarketExtractor;
pub use pool::{TaskExit, WorkerPool};
pub use results::{PendingRecord, ResultStream};
pub use stats::{CrawlStats, StatsSnapshot};
