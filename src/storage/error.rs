use std::path::PathBuf;
use thiserror::Error;

/// Storage-specific errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// The metadata file exists but cannot be trusted
    #[error("Corrupt metadata at {}: {message}", .path.display())]
    CorruptMetadata { path: PathBuf, message: String },

    /// Fetched content could not be persisted
    #[error("Failed to write content to {}: {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The metadata mapping could not be replaced on disk
    #[error("Failed to flush metadata to {}: {source}", .path.display())]
    FlushFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
