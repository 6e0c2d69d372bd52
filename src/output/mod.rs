//! Output module for run reports
//!
//! This module handles:
//! - Aggregating per-URL outcomes into run statistics
//! - Generating markdown summaries of a run
//! - Printing the contents of the metadata store

mod markdown;
pub mod stats;
mod summary;

pub use markdown::{format_markdown_summary, generate_markdown_summary, summary_path_for};
pub use stats::{print_statistics, print_store, CrawlStatistics};
pub use summary::{CrawlSummary, OutputError, OutputResult};
