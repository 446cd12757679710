//! Text Extractor — turns an uploaded PDF into plain text, entirely in memory.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("uploaded document is empty")]
    EmptyDocument,

    #[error("failed to extract text from PDF: {0}")]
    Pdf(#[from] pdf_extract::OutputError),
}

/// Extracts the text layer from a PDF byte buffer.
///
/// An empty string is a valid result: a scanned PDF with no text layer
/// extracts to nothing, and whether that is useful is the caller's call.
/// Corrupt, truncated, or non-PDF bytes fail with `ExtractionError`.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    if bytes.is_empty() {
        return Err(ExtractionError::EmptyDocument);
    }
    Ok(pdf_extract::extract_text_from_mem(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer_is_rejected() {
        let result = extract_text(&[]);
        assert!(matches!(result, Err(ExtractionError::EmptyDocument)));
    }

    #[test]
    fn test_non_pdf_bytes_are_rejected() {
        let result = extract_text(b"this is plain text, not a PDF");
        assert!(matches!(result, Err(ExtractionError::Pdf(_))));
    }

    #[test]
    fn test_truncated_pdf_header_is_rejected() {
        // A valid magic number with no document body behind it.
        let result = extract_text(b"%PDF-1.7\n");
        assert!(result.is_err());
    }
}
