//! Crawler module for conditional fetching
//!
//! This module contains the fetch-cache-persist core, including:
//! - HTTP fetching with cache validators
//! - Response classification into tagged outcomes
//! - Bounded-concurrency coordination across the URL set

mod coordinator;
mod fetcher;
mod outcome;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, fetch_url};
pub use outcome::{FailureReason, FetchOutcome, UrlOutcome};

