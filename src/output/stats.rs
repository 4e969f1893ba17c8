//! Crawl statistics summary
//!
//! Formats the engine's counters for the end-of-run report.

use crate::crawler::StatsSnapshot;
use std::fmt::Write;
use std::time::Duration;

/// Renders the statistics summary as text
pub fn format_statistics(stats: &StatsSnapshot, elapsed: Duration) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "=== Crawl Statistics ===\n");

    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  URLs dispatched: {}", stats.dispatched);
    let _ = writeln!(out, "  Pages of interest: {}", stats.pages_of_interest);
    let _ = writeln!(out, "  Pages ignored: {}", stats.pages_ignored);
    let _ = writeln!(out, "  Records written: {}", stats.records_emitted);
    let _ = writeln!(out, "  Elapsed: {:.1}s", elapsed.as_secs_f64());
    let _ = writeln!(out);

    let _ = writeln!(out, "Links:");
    let _ = writeln!(out, "  Enqueued: {}", stats.links_enqueued);
    let _ = writeln!(out, "  Already seen: {}", stats.links_rejected);
    let _ = writeln!(out, "  Unusable: {}", stats.invalid_links);
    let _ = writeln!(
        out,
        "  Skipped (entity already harvested): {}",
        stats.skipped_known_entity
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Failures:");
    let _ = writeln!(out, "  Not found: {}", stats.not_found);
    let _ = writeln!(out, "  Fetch failures: {}", stats.fetch_failures);
    let _ = writeln!(out, "  Extraction failures: {}", stats.extraction_failures);
    let _ = writeln!(out, "  Duplicate records dropped: {}", stats.duplicate_records);
    if stats.worker_panics > 0 {
        let _ = writeln!(out, "  Worker panics: {}", stats.worker_panics);
    }
    let _ = writeln!(out);

    let rate = if elapsed.as_secs_f64() > 0.0 {
        stats.dispatched as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };
    let _ = write!(out, "Throughput: {:.2} pages/sec", rate);

    out
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
/// * `elapsed` - Wall-clock duration of the crawl
pub fn print_statistics(stats: &StatsSnapshot, elapsed: Duration) {
    println!("{}", format_statistics(stats, elapsed));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_statistics() {
        let stats = StatsSnapshot {
            dispatched: 20,
            not_found: 3,
            records_emitted: 7,
            ..StatsSnapshot::default()
        };

        let text = format_statistics(&stats, Duration::from_secs(10));
        assert!(text.contains("URLs dispatched: 20"));
        assert!(text.contains("Not found: 3"));
        assert!(text.contains("Records written: 7"));
        assert!(text.contains("Throughput: 2.00 pages/sec"));
        assert!(!text.contains("Worker panics"));
    }

    #[test]
    fn test_zero_elapsed_has_zero_rate() {
        let text = format_statistics(&StatsSnapshot::default(), Duration::ZERO);
        assert!(text.ends_with("Throughput: 0.00 pages/sec"));
    }
}
