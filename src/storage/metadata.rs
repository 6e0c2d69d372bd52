//! Durable URL → record mapping
//!
//! On disk the mapping is a pretty-printed JSON object keyed by URL:
//!
//! ```text
//! {
//!   "https://example.com/doc": {
//!     "path": "data/raw/6f1e...",
//!     "etag": "\"abc\"",
//!     "last_modified": "",
//!     "sha256": "2cf2..."
//!   }
//! }
//! ```
//!
//! Absent validators are written as empty strings. Keys are written in sorted
//! order so flushing an unchanged mapping produces identical bytes.

use crate::state::{DocumentRecord, RecordStatus, Validators};
use crate::storage::content::{verify_content, ContentIntegrity};
use crate::storage::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// One entry of the durable metadata file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub path: PathBuf,
    #[serde(default)]
    pub etag: String,
    #[serde(default)]
    pub last_modified: String,
    pub sha256: String,
}

impl From<&DocumentRecord> for MetadataEntry {
    fn from(record: &DocumentRecord) -> Self {
        Self {
            path: record.storage_path.clone(),
            etag: record.validators.etag.clone().unwrap_or_default(),
            last_modified: record.validators.last_modified.clone().unwrap_or_default(),
            sha256: record.content_hash.clone(),
        }
    }
}

impl MetadataEntry {
    fn into_record(self, url: String) -> DocumentRecord {
        DocumentRecord {
            url,
            storage_path: self.path,
            validators: Validators::new(Some(self.etag), Some(self.last_modified)),
            content_hash: self.sha256,
            status: RecordStatus::Fetched,
        }
    }
}

/// In-memory metadata mapping for one run
///
/// Owned by the coordinator for the duration of a run; `put` takes `&mut self`
/// so there is only ever one writer.
#[derive(Debug, Default, Clone)]
pub struct MetadataStore {
    records: BTreeMap<String, DocumentRecord>,
}

impl MetadataStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the durable mapping from `path`
    ///
    /// # Returns
    ///
    /// * `Ok(MetadataStore)` - The loaded mapping, or an empty one if `path`
    ///   does not exist (first run)
    /// * `Err(StorageError::CorruptMetadata)` - The file exists but cannot be parsed
    /// * `Err(StorageError::Io)` - The file exists but cannot be read
    pub async fn load(path: &Path) -> StorageResult<Self> {
        let content = match tokio::fs::read(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No metadata at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(e) => return Err(StorageError::Io(e)),
        };

        let entries: BTreeMap<String, MetadataEntry> =
            serde_json::from_slice(&content).map_err(|e| StorageError::CorruptMetadata {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let records = entries
            .into_iter()
            .map(|(url, entry)| (url.clone(), entry.into_record(url)))
            .collect::<BTreeMap<_, _>>();

        tracing::info!(
            "Loaded {} metadata records from {}",
            records.len(),
            path.display()
        );

        Ok(Self { records })
    }

    /// Looks up the record for `url`
    pub fn get(&self, url: &str) -> Option<&DocumentRecord> {
        self.records.get(url)
    }

    /// Inserts or replaces the record for its URL, returning the previous one
    pub fn put(&mut self, record: DocumentRecord) -> Option<DocumentRecord> {
        self.records.insert(record.url.clone(), record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over records in URL order
    pub fn iter(&self) -> impl Iterator<Item = &DocumentRecord> {
        self.records.values()
    }

    /// Checks that the file behind `url`'s record still matches its hash
    ///
    /// Returns `None` if there is no record for `url`.
    pub async fn verify(&self, url: &str) -> Option<ContentIntegrity> {
        match self.get(url) {
            Some(record) => Some(verify_content(record).await),
            None => None,
        }
    }

    /// Serializes the full mapping to `path`
    ///
    /// The mapping is written to a temporary file in the destination directory
    /// and then renamed over `path`, so `path` holds either the previous or the
    /// new complete mapping. The file work runs on the blocking pool.
    pub async fn flush(&self, path: &Path) -> StorageResult<()> {
        let entries: BTreeMap<&str, MetadataEntry> = self
            .records
            .iter()
            .map(|(url, record)| (url.as_str(), MetadataEntry::from(record)))
            .collect();
        let json = serde_json::to_vec_pretty(&entries)?;

        let target = path.to_path_buf();
        tokio::task::spawn_blocking(move || replace_file(&target, &json))
            .await
            .map_err(|e| std::io::Error::new(ErrorKind::Other, e.to_string()))
            .and_then(|written| written)
            .map_err(|source| StorageError::FlushFailed {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!(
            "Flushed {} metadata records to {}",
            self.records.len(),
            path.display()
        );

        Ok(())
    }
}

/// Atomically replaces `path` with `bytes` via a synced temp file in the same directory
fn replace_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
