//! Run summary types

use crate::crawler::UrlOutcome;
use crate::output::stats::CrawlStatistics;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Everything the markdown report needs about one run
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config_hash: Option<String>,
    pub statistics: CrawlStatistics,
    /// One entry per distinct URL, in first-seen order
    pub entries: Vec<UrlOutcome>,
}

impl CrawlSummary {
    pub fn new(
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        results: &[UrlOutcome],
    ) -> Self {
        let mut seen = HashSet::new();
        let entries = results
            .iter()
            .filter(|outcome| seen.insert(outcome.url.as_str()))
            .cloned()
            .collect();

        Self {
            started_at,
            finished_at,
            config_hash: None,
            statistics: CrawlStatistics::from_results(results),
            entries,
        }
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}
