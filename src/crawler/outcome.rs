//! Fetch outcomes and per-URL results

use crate::state::{DocumentRecord, Validators};
use thiserror::Error;

/// Result of one conditional GET
#[derive(Debug)]
pub enum FetchOutcome {
    /// Origin returned 200 with a body
    Fresh {
        /// Response body
        bytes: Vec<u8>,
        /// Validators the response carried (empty if it sent none)
        validators: Validators,
    },

    /// Origin returned 304; no body was read
    NotModified,

    /// Anything else
    Failed(FailureReason),
}

/// Why a single URL produced no record this run
///
/// Per-URL failures are recorded in the result set and never abort a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected HTTP status {status}")]
    BadStatus { status: u16 },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("origin returned 304 with no prior record")]
    UnexpectedNotModified,

    #[error("failed to persist content: {0}")]
    WriteFailed(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("cancelled before completion")]
    Cancelled,

    #[error("fetch task aborted: {0}")]
    TaskAborted(String),
}

impl FailureReason {
    /// Short, stable label used for grouping in statistics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Timeout => "timeout",
            Self::BadStatus { .. } => "bad_status",
            Self::MalformedResponse(_) => "malformed_response",
            Self::UnexpectedNotModified => "unexpected_not_modified",
            Self::WriteFailed(_) => "write_failed",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Cancelled => "cancelled",
            Self::TaskAborted(_) => "task_aborted",
        }
    }
}

/// What happened to one input URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlOutcome {
    pub url: String,
    pub result: Result<DocumentRecord, FailureReason>,
}

impl UrlOutcome {
    pub fn record(&self) -> Option<&DocumentRecord> {
        self.result.as_ref().ok()
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        self.result.as_ref().err()
    }

    pub fn is_fetched(&self) -> bool {
        self.record().is_some_and(|r| r.status.is_fetched())
    }

    pub fn is_skipped(&self) -> bool {
        self.record().is_some_and(|r| r.status.is_skipped())
    }

    pub fn is_failed(&self) -> bool {
        self.result.is_err()
    }
}
