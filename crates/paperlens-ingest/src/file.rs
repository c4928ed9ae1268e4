//! Input validation and local page-by-page PDF text extraction.

use lopdf::Document as PdfDocument;
use paperlens_core::{Error, Result};
use std::path::Path;
use tracing::debug;

/// Extensions accepted for processing.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf"];

fn has_supported_extension(name: &Path) -> bool {
    name.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Check that a path points at a readable, non-empty file of a supported
/// type. Returns the file size in bytes.
pub fn validate_document_path(path: &Path) -> Result<u64> {
    if !has_supported_extension(path) {
        return Err(Error::Validation(format!(
            "Unsupported file type: {}",
            path.display()
        )));
    }
    let metadata = std::fs::metadata(path).map_err(|e| {
        Error::Validation(format!("Cannot read {}: {}", path.display(), e))
    })?;
    if !metadata.is_file() {
        return Err(Error::Validation(format!(
            "Not a file: {}",
            path.display()
        )));
    }
    if metadata.len() == 0 {
        return Err(Error::Validation(format!(
            "Empty file: {}",
            path.display()
        )));
    }
    Ok(metadata.len())
}

/// Check an uploaded file's name and size before anything is stored.
pub fn validate_upload(filename: &str, size: u64, max_bytes: u64) -> Result<()> {
    if !has_supported_extension(Path::new(filename)) {
        return Err(Error::Validation(format!(
            "Only PDF files are supported, got '{}'",
            filename
        )));
    }
    if size == 0 {
        return Err(Error::Validation("Uploaded file is empty".into()));
    }
    if size > max_bytes {
        return Err(Error::Validation(format!(
            "File too large: {} bytes (limit {} bytes)",
            size, max_bytes
        )));
    }
    Ok(())
}

/// Source of raw page text for the local fallback.
pub trait PageTextExtractor: Send + Sync {
    /// Text of every page, in page order.
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>>;
}

/// Page text via `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfExtractor;

impl PageTextExtractor for LopdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>> {
        let document = PdfDocument::load(path).map_err(|e| {
            Error::Extraction(format!("lopdf failed to open {}: {}", path.display(), e))
        })?;
        let pages = document.get_pages();
        debug!("{} has {} pages", path.display(), pages.len());

        let mut texts = Vec::with_capacity(pages.len());
        for page_number in pages.keys() {
            let text = document.extract_text(&[*page_number]).map_err(|e| {
                Error::Extraction(format!(
                    "lopdf failed to extract page {} of {}: {}",
                    page_number,
                    path.display(),
                    e
                ))
            })?;
            texts.push(text);
        }
        Ok(texts)
    }
}
