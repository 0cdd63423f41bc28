use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for PDF text extraction backends.
///
/// Implementors provide the raw per-page text; joining pages and whitespace
/// normalization live in [`crate::text::extract_document_text`] so every
/// backend produces text in the same shape.
pub trait PdfBackend: Send + Sync {
    /// Extract the text content of each page of a PDF file, in page order.
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, BackendError>;
}
