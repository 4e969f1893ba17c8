//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: the delivering / draining-and-dispatching / done state machine
//!   behind the pull-based result stream

mod crawl_phase;

pub use crawl_phase::CrawlPhase;
