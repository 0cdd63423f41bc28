//! Document text extraction and normalization.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::backend::{BackendError, PdfBackend};

/// Expand common typographic ligatures found in PDFs.
pub fn expand_ligatures(text: &str) -> String {
    text.replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace(['\u{FB05}', '\u{FB06}'], "st")
}

/// Collapse every whitespace run (spaces, tabs, newlines, form feeds) into a
/// single space and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
    RE.replace_all(text, " ").trim().to_string()
}

/// Extract the full text of a document through `backend`.
///
/// Pages are joined with a single space, ligatures are expanded, and the
/// result is whitespace-normalized. The text is extracted once per document
/// and reused for every criterion.
pub fn extract_document_text(path: &Path, backend: &dyn PdfBackend) -> Result<String, BackendError> {
    tracing::info!(path = %path.display(), "extracting text");

    let pages = backend.extract_pages(path)?;
    let page_count = pages.len();
    let text = normalize_whitespace(&expand_ligatures(&pages.join(" ")));

    tracing::info!(
        path = %path.display(),
        pages = page_count,
        chars = text.chars().count(),
        "text extraction complete"
    );
    Ok(text)
}
