//! Storage module for persisting fetched documents and their metadata
//!
//! This module handles:
//! - The durable URL → record mapping (`MetadataStore`), loaded once per run
//!   and flushed atomically at the end
//! - Content-addressed persistence of fetched bytes (`ContentWriter`)
//! - Verification that a stored record is still backed by the filesystem

mod content;
mod error;
mod metadata;

pub use content::{verify_content, ContentIntegrity, ContentWriter, StoredContent};
pub use error::{StorageError, StorageResult};
pub use metadata::{MetadataEntry, MetadataStore};

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of `bytes`
///
/// # Example
///
/// ```
/// use document_ingestor::storage::sha256_hex;
///
/// assert_eq!(
///     sha256_hex(b"hello"),
///     "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
/// );
/// ```
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
