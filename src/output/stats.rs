//! Statistics derived from a crawl report
//!
//! This module summarizes how each part of the records resolved and
//! prints the summary once the crawl has finished.

use crate::crawler::{CrawlReport, FetchError, ImageError, TerminationKind};
use crate::records::{DetailOutcome, ImageOutcome};
use std::collections::HashMap;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Listing pages that produced records
    pub pages_crawled: u32,

    /// Records in the sink
    pub total_records: usize,

    /// Records whose detail page was parsed
    pub details_resolved: usize,

    /// Records whose detail page could not be fetched
    pub detail_failures: usize,

    /// Records for which no detail result came back
    pub details_missing: usize,

    /// Fetch failures by kind ("timeout", "non_success_status", "unreachable")
    pub failures_by_kind: HashMap<&'static str, usize>,

    pub images_stored: usize,
    pub image_failures: usize,

    /// Listing entries skipped because they had no usable link
    pub malformed_items: usize,

    pub duplicates_dropped: usize,

    pub duration_seconds: i64,

    pub termination: String,
    pub clean: bool,
}

impl CrawlStatistics {
    /// Tallies the outcomes recorded in `report`
    pub fn from_report(report: &CrawlReport) -> Self {
        let mut stats = Self {
            pages_crawled: report.pages_crawled,
            total_records: report.record_count(),
            details_resolved: 0,
            detail_failures: 0,
            details_missing: 0,
            failures_by_kind: HashMap::new(),
            images_stored: 0,
            image_failures: 0,
            malformed_items: report.malformed_items,
            duplicates_dropped: report.duplicates_dropped,
            duration_seconds: (report.finished_at - report.started_at).num_seconds(),
            termination: report.termination.to_string(),
            clean: report.termination.kind() == TerminationKind::Clean,
        };

        for record in &report.records {
            match &record.detail {
                DetailOutcome::Resolved(_) => stats.details_resolved += 1,
                DetailOutcome::Failed(error) => {
                    stats.detail_failures += 1;
                    stats.count_failure(error);
                }
                DetailOutcome::Missing => stats.details_missing += 1,
            }

            match &record.image {
                ImageOutcome::Stored(_) => stats.images_stored += 1,
                ImageOutcome::Failed(ImageError::Fetch(error)) => {
                    stats.image_failures += 1;
                    stats.count_failure(error);
                }
                ImageOutcome::Failed(_) => stats.image_failures += 1,
                ImageOutcome::Remote(_) | ImageOutcome::Missing => {}
            }
        }

        stats
    }

    fn count_failure(&mut self, error: &FetchError) {
        *self.failures_by_kind.entry(error.kind_label()).or_insert(0) += 1;
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Pages crawled: {}", stats.pages_crawled);
    println!("  Records: {}", stats.total_records);
    println!("  Duration: {}s", stats.duration_seconds);
    println!("  Termination: {}", stats.termination);
    println!();

    println!("Details:");
    println!("  Resolved: {}", stats.details_resolved);
    println!("  Failed: {}", stats.detail_failures);
    println!("  Missing: {}", stats.details_missing);
    println!();

    println!("Images:");
    println!("  Stored: {}", stats.images_stored);
    println!("  Failed: {}", stats.image_failures);

    if !stats.failures_by_kind.is_empty() {
        println!();
        println!("Fetch Failures by Kind:");
        let mut kinds: Vec<_> = stats.failures_by_kind.iter().collect();
        kinds.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
        for (kind, count) in kinds {
            println!("  {}: {}", kind, count);
        }
    }

    if stats.malformed_items > 0 || stats.duplicates_dropped > 0 {
        println!();
        println!("Skipped:");
        println!("  Malformed listing entries: {}", stats.malformed_items);
        println!("  Duplicate records: {}", stats.duplicates_dropped);
    }
}
