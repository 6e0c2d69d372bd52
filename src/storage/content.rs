//! Content-addressed persistence of fetched bytes
//!
//! ## Storage Layout
//!
//! ```text
//! {output_dir}/
//! └── {sha256(url)}        # one file per URL, overwritten in place
//! ```

use crate::state::DocumentRecord;
use crate::storage::{sha256_hex, StorageError, StorageResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Result of persisting one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredContent {
    pub storage_path: PathBuf,
    pub content_hash: String,
    pub len: usize,
}

/// Whether a record's file still backs the record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentIntegrity {
    /// File exists and hashes to the recorded digest
    Intact,

    /// No file at the recorded path
    Missing,

    /// File exists but its digest differs
    HashMismatch { actual: String },

    /// File could not be read
    Unreadable(String),
}

impl ContentIntegrity {
    pub fn is_intact(&self) -> bool {
        matches!(self, Self::Intact)
    }
}

/// Writes fetched bytes under a path derived from the URL alone
#[derive(Debug, Clone)]
pub struct ContentWriter {
    root: PathBuf,
}

impl ContentWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Deterministic storage path for `url`, independent of content
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.root.join(sha256_hex(url.as_bytes()))
    }

    /// Persists `bytes` for `url`
    ///
    /// The bytes go to a sibling temporary file first and are renamed into
    /// place, so the final path never holds a partial write.
    ///
    /// # Returns
    ///
    /// * `Ok(StoredContent)` - Path and SHA-256 of exactly `bytes`
    /// * `Err(StorageError::WriteFailed)` - Any I/O error along the way
    pub async fn write(&self, url: &str, bytes: &[u8]) -> StorageResult<StoredContent> {
        let storage_path = self.path_for(url);
        let content_hash = sha256_hex(bytes);

        write_atomic(&storage_path, bytes)
            .await
            .map_err(|source| StorageError::WriteFailed {
                path: storage_path.clone(),
                source,
            })?;

        tracing::debug!(
            "Wrote {} bytes for {} to {}",
            bytes.len(),
            url,
            storage_path.display()
        );

        Ok(StoredContent {
            storage_path,
            content_hash,
            len: bytes.len(),
        })
    }
}

/// Write bytes atomically (write to temp, then rename).
async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = path.with_extension("tmp");
    let written = async {
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await
    }
    .await;

    let result = match written {
        Ok(()) => tokio::fs::rename(&tmp, path).await,
        Err(e) => Err(e),
    };

    if result.is_err() {
        let _ = tokio::fs::remove_file(&tmp).await;
    }
    result
}

/// Re-hashes the file behind `record` and compares it to the recorded digest
pub async fn verify_content(record: &DocumentRecord) -> ContentIntegrity {
    match tokio::fs::read(&record.storage_path).await {
        Ok(bytes) => {
            let actual = sha256_hex(&bytes);
            if actual == record.content_hash {
                ContentIntegrity::Intact
            } else {
                ContentIntegrity::HashMismatch { actual }
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => ContentIntegrity::Missing,
        Err(e) => ContentIntegrity::Unreadable(e.to_string()),
    }
}
