/// Document record definitions
///
/// A record is produced for every URL that has been fetched at least once and
/// is the in-memory counterpart of one entry in the durable metadata file.
use std::fmt;
use std::path::PathBuf;

/// How a record came to be in this run's results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordStatus {
    /// New or changed content was written during this run
    Fetched,

    /// The origin confirmed no change; the prior record was reused verbatim
    Skipped,
}

impl RecordStatus {
    pub fn is_fetched(&self) -> bool {
        matches!(self, Self::Fetched)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetched => "fetched",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache validators attached to a conditional request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validators {
    /// Opaque entity tag, sent as `If-None-Match`
    pub etag: Option<String>,

    /// HTTP-date, sent as `If-Modified-Since`
    pub last_modified: Option<String>,
}

impl Validators {
    pub fn new(etag: Option<String>, last_modified: Option<String>) -> Self {
        Self {
            etag: non_empty(etag),
            last_modified: non_empty(last_modified),
        }
    }

    /// Returns true when no conditional header would be sent
    pub fn is_empty(&self) -> bool {
        self.etag.is_none() && self.last_modified.is_none()
    }
}

/// The known state of one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    /// The URL this record describes (unique key)
    pub url: String,

    /// Where the persisted bytes live
    pub storage_path: PathBuf,

    /// Validators returned by the origin on the last successful fetch
    pub validators: Validators,

    /// Hex-encoded SHA-256 of the bytes at `storage_path`
    pub content_hash: String,

    /// Outcome of this run for the URL
    pub status: RecordStatus,
}

impl DocumentRecord {
    /// Creates a record for content written during this run
    pub fn fetched(
        url: impl Into<String>,
        storage_path: PathBuf,
        content_hash: String,
        validators: Validators,
    ) -> Self {
        Self {
            url: url.into(),
            storage_path,
            validators,
            content_hash,
            status: RecordStatus::Fetched,
        }
    }

    /// Copies this record unchanged except for `status = skipped`
    pub fn to_skipped(&self) -> Self {
        Self {
            status: RecordStatus::Skipped,
            ..self.clone()
        }
    }

    pub fn etag(&self) -> Option<&str> {
        self.validators.etag.as_deref()
    }

    pub fn last_modified(&self) -> Option<&str> {
        self.validators.last_modified.as_deref()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
