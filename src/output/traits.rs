//! Record sink trait and output errors

use crate::crawler::PendingRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize record {uid}: {source}")]
    Serialize {
        uid: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for harvested records
///
/// Records arrive one at a time in delivery order. A sink must make each
/// record durable before `write_record` returns, so an interrupted crawl keeps
/// everything delivered so far.
pub trait RecordSink {
    /// Writes a single record
    ///
    /// # Arguments
    ///
    /// * `record` - The record to persist
    fn write_record(&mut self, record: &PendingRecord) -> OutputResult<()>;

    /// Flushes anything still buffered at the end of the crawl
    fn finish(&mut self) -> OutputResult<()>;

    /// Number of records written so far
    fn records_written(&self) -> u64;
}
