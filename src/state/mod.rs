//! State module for per-URL document records
//!
//! # Components
//!
//! - `DocumentRecord`: what the ingestor knows about one URL after a run
//! - `RecordStatus`: whether the content was written this run or reused
//! - `Validators`: the cache validators sent on the next conditional request

mod record;

// Re-export main types
pub use record::{DocumentRecord, RecordStatus, Validators};
