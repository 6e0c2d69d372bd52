//! Statistics generation from run results
//!
//! This module provides functionality for aggregating per-URL outcomes and
//! displaying them, plus a plain listing of the metadata store.

use crate::crawler::UrlOutcome;
use crate::storage::MetadataStore;
use std::collections::{HashMap, HashSet};

/// Run statistics summary
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// Number of distinct URLs processed
    pub total_urls: u64,

    /// URLs whose content was written this run
    pub fetched: u64,

    /// URLs the origin reported unchanged
    pub skipped: u64,

    /// URLs with no record this run
    pub failed: u64,

    /// Failure counts keyed by [`crate::crawler::FailureReason::kind`]
    pub failures_by_kind: HashMap<&'static str, u64>,
}

impl CrawlStatistics {
    /// Aggregates outcomes, counting each distinct URL once
    pub fn from_results(results: &[UrlOutcome]) -> Self {
        let mut stats = Self::default();
        let mut seen = HashSet::new();

        for outcome in results {
            if !seen.insert(outcome.url.as_str()) {
                continue;
            }
            stats.total_urls += 1;

            match &outcome.result {
                Ok(record) if record.status.is_fetched() => stats.fetched += 1,
                Ok(_) => stats.skipped += 1,
                Err(reason) => {
                    stats.failed += 1;
                    *stats.failures_by_kind.entry(reason.kind()).or_insert(0) += 1;
                }
            }
        }

        stats
    }

    /// Percentage of URLs that ended with a record (fetched or skipped)
    pub fn success_rate(&self) -> f64 {
        if self.total_urls == 0 {
            return 0.0;
        }
        ((self.fetched + self.skipped) as f64 / self.total_urls as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Run Statistics ===\n");

    println!("Overview:");
    println!("  URLs processed: {}", stats.total_urls);
    println!("  Fetched: {}", stats.fetched);
    println!("  Skipped (not modified): {}", stats.skipped);
    println!("  Failed: {}", stats.failed);
    println!();

    if !stats.failures_by_kind.is_empty() {
        println!("Failure Summary:");
        let mut failure_counts: Vec<_> = stats.failures_by_kind.iter().collect();
        failure_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (kind, count) in failure_counts {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} URLs have a current record)",
        stats.success_rate(),
        stats.fetched + stats.skipped,
        stats.total_urls
    );
}

/// Prints every record in the metadata store
pub fn print_store(store: &MetadataStore) {
    println!("=== Metadata Records ({}) ===\n", store.len());

    for record in store.iter() {
        println!("{}", record.url);
        println!("  path: {}", record.storage_path.display());
        println!("  sha256: {}", record.content_hash);
        println!("  etag: {}", record.etag().unwrap_or("-"));
        println!("  last-modified: {}", record.last_modified().unwrap_or("-"));
    }
}
