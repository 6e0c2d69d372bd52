use crate::transform::TransformError;

const PDF_MAGIC: &[u8] = b"%PDF";

/// Returns true if `bytes` start with the PDF header
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// Extracts text from an in-memory PDF
///
/// The extractor can panic on malformed input; a panic is reported as a
/// `TransformError::Pdf` instead of unwinding into the caller.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, TransformError> {
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(TransformError::Pdf(e.to_string())),
        Err(_) => Err(TransformError::Pdf(
            "extractor panicked on malformed input".to_string(),
        )),
    }
}
