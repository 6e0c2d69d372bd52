//! Configuration module for the document ingestor
//!
//! This module handles loading, parsing, and validating configuration files.
//! TOML is the primary format; files ending in `.json` are read as JSON.
//!
//! # Example
//!
//! ```no_run
//! use document_ingestor::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("ingest.toml")).unwrap();
//! println!("Fetching {} seed URLs", config.crawler.seed_urls.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, TransformConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
