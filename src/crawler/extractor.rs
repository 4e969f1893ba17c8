//! Page classification boundary
//!
//! The engine knows nothing about page markup. A [`PageExtractor`] decides
//! whether a fetched page is of interest, which links it contributes to the
//! crawl, and which record (if any) it yields.

use crate::crawler::results::PendingRecord;
use crate::ExtractError;

/// What an extractor learned from a single page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageOutcome {
    /// Whether the page belongs to the domain of interest
    pub of_interest: bool,

    /// Links to enqueue (absolute, or relative to the crawl's base URL)
    pub links: Vec<String>,

    /// The record extracted from the page, if any
    pub record: Option<PendingRecord>,

    /// Why the record could not be built, when the page itself was usable
    ///
    /// The links are still followed; the engine counts this as an extraction
    /// failure.
    pub record_error: Option<ExtractError>,
}

impl PageOutcome {
    /// A page outside the domain of interest: no links, no record
    pub fn not_of_interest() -> Self {
        Self::default()
    }

    /// A page of interest with its links and optional record
    pub fn of_interest(links: Vec<String>, record: Option<PendingRecord>) -> Self {
        Self {
            of_interest: true,
            links,
            record,
            record_error: None,
        }
    }

    /// A page of interest whose links are usable but whose record is broken
    pub fn with_record_error(links: Vec<String>, error: ExtractError) -> Self {
        Self {
            of_interest: true,
            links,
            record: None,
            record_error: Some(error),
        }
    }
}

/// Classifies fetched pages and extracts records from them
///
/// Called from worker tasks, so implementations must be shareable across
/// threads. Errors are counted by the engine and the page is discarded; they
/// never stop the crawl.
pub trait PageExtractor: Send + Sync + 'static {
    /// Classifies a page and extracts its links and record
    ///
    /// When the page is not of interest, the engine ignores any links or record
    /// in the returned outcome. `Err` discards the whole page; a record that
    /// fails on an otherwise usable page belongs in
    /// [`PageOutcome::record_error`] so its links are kept.
    fn classify_and_extract(&self, url: &str, body: &str) -> Result<PageOutcome, ExtractError>;

    /// Predicts the entity id a URL would yield, before fetching it
    ///
    /// URLs whose hint is already in the seen set are not dispatched. The
    /// default makes no prediction.
    fn entity_hint(&self, _url: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_of_interest_is_empty() {
        let outcome = PageOutcome::not_of_interest();
        assert!(!outcome.of_interest);
        assert!(outcome.links.is_empty());
        assert!(outcome.record.is_none());
    }

    #[test]
    fn test_of_interest_keeps_links_and_record() {
        let outcome = PageOutcome::of_interest(
            vec!["/details?id=a".to_string()],
            Some(PendingRecord::new("a")),
        );
        assert!(outcome.of_interest);
        assert_eq!(outcome.links.len(), 1);
        assert_eq!(outcome.record.unwrap().entity_id(), "a");
    }

    #[test]
    fn test_record_error_keeps_links() {
        let error = ExtractError::MissingParam {
            url: "https://market.example.com/details?id=a".to_string(),
            param: "id".to_string(),
        };
        let outcome =
            PageOutcome::with_record_error(vec!["/details?id=b".to_string()], error.clone());
        assert!(outcome.of_interest);
        assert_eq!(outcome.links, vec!["/details?id=b".to_string()]);
        assert!(outcome.record.is_none());
        assert_eq!(outcome.record_error, Some(error));
    }
}
