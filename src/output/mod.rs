//! Output module for harvested records and crawl reports
//!
//! This module handles:
//! - Writing records as line-delimited JSON
//! - Formatting the end-of-run statistics summary

mod jsonl;
pub mod stats;
mod traits;

pub use jsonl::JsonLinesWriter;
pub use stats::{format_statistics, print_statistics};
pub use traits::{OutputError, OutputResult, RecordSink};
