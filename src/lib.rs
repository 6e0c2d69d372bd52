//! Document Ingestor: a cache-aware document fetcher
//!
//! This crate fetches a set of seed URLs over HTTP, uses conditional requests
//! (`If-None-Match` / `If-Modified-Since`) to avoid re-downloading unchanged
//! content, persists fetched bytes under deterministic content paths, and keeps
//! a durable per-URL metadata record between runs.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod transform;

use thiserror::Error;

/// Main error type for run-fatal ingestor failures
///
/// Per-URL failures never surface here; they are carried in the result set as
/// [`crawler::FailureReason`] values.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Fetch task error: {0}")]
    Task(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("URL is empty")]
    Empty,
}

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

/// Parses a seed URL, accepting only absolute `http` and `https` URLs
///
/// # Example
///
/// ```
/// use document_ingestor::parse_seed_url;
///
/// assert!(parse_seed_url("https://example.com/doc").is_ok());
/// assert!(parse_seed_url("ftp://example.com/doc").is_err());
/// assert!(parse_seed_url("").is_err());
/// ```
pub fn parse_seed_url(raw: &str) -> UrlResult<::url::Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let parsed = ::url::Url::parse(trimmed).map_err(|e| UrlError::Parse(format!("{raw}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(UrlError::InvalidScheme(other.to_string())),
    }
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, FailureReason, FetchOutcome, UrlOutcome};
pub use state::{DocumentRecord, RecordStatus, Validators};
pub use storage::{ContentWriter, MetadataStore, StorageError};
