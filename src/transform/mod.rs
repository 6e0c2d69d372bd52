//! Content transformation for fetched documents
//!
//! This module turns the raw bytes persisted for a URL into readable text:
//! - PDF documents go through structured text extraction
//! - Everything else is treated as HTML and tag-stripped
//!
//! The transform runs only after the bytes have been persisted, and consumes
//! the same bytes that were written.

mod html;
mod pdf;
mod sink;

pub use html::strip_tags;
pub use pdf::{extract_pdf_text, looks_like_pdf};
pub use sink::{sanitize_filename, TextSink};

use thiserror::Error;

/// Errors from text extraction
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("Extraction task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text extracted from a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    /// Document title, when the format carries one
    pub title: Option<String>,

    /// Readable body text
    pub text: String,
}

/// Broad input format of a fetched document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Pdf,
    Html,
}

impl ContentKind {
    /// Classifies a document by URL path suffix and leading magic bytes
    pub fn detect(url: &str, bytes: &[u8]) -> Self {
        let path_is_pdf = match ::url::Url::parse(url) {
            Ok(parsed) => parsed.path().to_ascii_lowercase().ends_with(".pdf"),
            Err(_) => url.to_ascii_lowercase().ends_with(".pdf"),
        };

        if path_is_pdf || looks_like_pdf(bytes) {
            Self::Pdf
        } else {
            Self::Html
        }
    }
}

/// Converts raw document bytes into text
pub trait ContentTransform: Send + Sync {
    fn extract(&self, url: &str, bytes: &[u8]) -> Result<ExtractedText, TransformError>;
}

/// Default transform: PDF extraction or HTML tag stripping
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentTransform;

impl ContentTransform for DocumentTransform {
    fn extract(&self, url: &str, bytes: &[u8]) -> Result<ExtractedText, TransformError> {
        match ContentKind::detect(url, bytes) {
            ContentKind::Pdf => match extract_pdf_text(bytes) {
                Ok(text) => Ok(ExtractedText {
                    title: None,
                    text: text.trim().to_string(),
                }),
                Err(e) => {
                    tracing::warn!("Failed to extract PDF from {}: {}", url, e);
                    Ok(ExtractedText::default())
                }
            },
            ContentKind::Html => Ok(strip_tags(&String::from_utf8_lossy(bytes))),
        }
    }
}
