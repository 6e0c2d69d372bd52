//! Writes extracted text next to the raw document store

use crate::state::DocumentRecord;
use crate::transform::{ContentTransform, DocumentTransform, TransformError};
use std::path::PathBuf;
use std::sync::Arc;

const MAX_NAME_LEN: usize = 50;

/// Runs a transform over freshly persisted bytes and stores the text
#[derive(Clone)]
pub struct TextSink {
    dir: PathBuf,
    transform: Arc<dyn ContentTransform>,
}

impl TextSink {
    pub fn new(dir: impl Into<PathBuf>, transform: Arc<dyn ContentTransform>) -> Self {
        Self {
            dir: dir.into(),
            transform,
        }
    }

    /// Creates a sink using [`DocumentTransform`]
    pub fn with_default_transform(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, Arc::new(DocumentTransform))
    }

    /// Extracts text from `bytes` and writes it to `dir/<title>_<hash8>.txt`
    ///
    /// The suffix comes from the record's content hash, so re-fetching
    /// unchanged content overwrites the same text file.
    pub async fn process(
        &self,
        record: &DocumentRecord,
        bytes: Vec<u8>,
    ) -> Result<PathBuf, TransformError> {
        let transform = Arc::clone(&self.transform);
        let url = record.url.clone();
        let extracted = tokio::task::spawn_blocking(move || transform.extract(&url, &bytes))
            .await
            .map_err(|e| TransformError::Task(e.to_string()))??;

        let title = extracted.title.as_deref().unwrap_or(&record.url);
        let suffix: String = record.content_hash.chars().take(8).collect();
        let path = self
            .dir
            .join(format!("{}_{}.txt", sanitize_filename(title), suffix));

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, extracted.text.trim()).await?;

        tracing::debug!("Extracted text for {} to {}", record.url, path.display());
        Ok(path)
    }
}

/// Reduces a title to a short, filesystem-safe name
///
/// # Example
///
/// ```
/// use document_ingestor::transform::sanitize_filename;
///
/// assert_eq!(sanitize_filename("The Scrum Guide: 2020"), "The_Scrum_Guide__2020");
/// assert_eq!(sanitize_filename("///"), "___");
/// assert_eq!(sanitize_filename("   "), "document");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe = safe.trim().replace(' ', "_");

    if safe.is_empty() {
        "document".to_string()
    } else {
        safe.chars().take(MAX_NAME_LEN).collect()
    }
}
