//! PDF text extraction
//!
//! Loads a PDF with lopdf and extracts text one page at a time, so chunks
//! downstream can carry their source page number.

use crate::errors::AppError;
use std::path::Path;
use tracing::{debug, warn};

/// Text content of a single page
#[derive(Debug, Clone)]
pub struct PageText {
    /// 1-based page number
    pub page: u32,
    pub text: String,
}

/// Extract page-level text from a PDF file.
///
/// Pages that fail to decode are skipped with a warning; the whole document
/// fails only when it cannot be loaded or no page yields any text.
pub fn extract_pages(path: &Path) -> Result<Vec<PageText>, AppError> {
    let doc = lopdf::Document::load(path)
        .map_err(|e| AppError::PdfLoad(format!("{}: {}", path.display(), e)))?;

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    debug!(page_count = page_numbers.len(), "Extracting text from PDF");

    let mut pages = Vec::with_capacity(page_numbers.len());
    for page in page_numbers {
        match doc.extract_text(&[page]) {
            Ok(raw) => {
                let text = clean_text(&raw);
                if !text.is_empty() {
                    pages.push(PageText { page, text });
                }
            }
            Err(e) => {
                warn!(page, error = %e, "Failed to extract text from page, skipping");
            }
        }
    }

    if pages.is_empty() {
        return Err(AppError::PdfLoad(format!(
            "{}: no text content extracted",
            path.display()
        )));
    }

    debug!(pages_with_text = pages.len(), "Text extraction complete");
    Ok(pages)
}

/// Normalize extracted text: collapse whitespace runs and strip BOM artifacts.
fn clean_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('\u{FEFF}', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_collapses_whitespace() {
        let input = "Hello   World\n\nTest";
        assert_eq!(clean_text(input), "Hello World Test");
    }

    #[test]
    fn clean_text_strips_bom() {
        assert_eq!(clean_text("\u{FEFF}Hello"), "Hello");
    }

    #[test]
    fn missing_file_is_load_error() {
        let err = extract_pages(Path::new("does/not/exist.pdf")).unwrap_err();
        assert!(matches!(err, AppError::PdfLoad(_)));
    }
}
