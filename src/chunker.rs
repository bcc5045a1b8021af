//! Text chunking
//!
//! Splits page text into overlapping chunks for embedding. The splitter is
//! boundary-aware: it prefers paragraph, then sentence, then word breaks
//! before falling back to a hard character cut.

use crate::config::ChunkingConfig;
use crate::errors::AppError;
use crate::pdf::PageText;
use text_splitter::{ChunkConfig, TextSplitter};
use tracing::debug;

/// A contiguous slice of document text tagged with its source page
#[derive(Debug, Clone)]
pub struct DocChunk {
    pub content: String,
    /// 1-based source page number
    pub page: u32,
    /// Position in the flat chunk sequence across the whole document
    pub index: usize,
}

/// Split page-level text into overlapping chunks.
///
/// Each page is split independently so every chunk keeps an unambiguous
/// page number; the index runs across the whole document.
pub fn chunk_pages(pages: &[PageText], config: &ChunkingConfig) -> Result<Vec<DocChunk>, AppError> {
    let chunk_config = ChunkConfig::new(config.chunk_size)
        .with_overlap(config.chunk_overlap)
        .map_err(|e| AppError::ValidationError(format!("Invalid chunking config: {}", e)))?;
    let splitter = TextSplitter::new(chunk_config);

    let mut chunks = Vec::new();
    for page in pages {
        for piece in splitter.chunks(&page.text) {
            chunks.push(DocChunk {
                content: piece.to_string(),
                page: page.page,
                index: chunks.len(),
            });
        }
    }

    debug!(
        page_count = pages.len(),
        chunk_count = chunks.len(),
        chunk_size = config.chunk_size,
        chunk_overlap = config.chunk_overlap,
        "Document chunked"
    );

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: size,
            chunk_overlap: overlap,
        }
    }

    fn page(n: u32, text: &str) -> PageText {
        PageText {
            page: n,
            text: text.to_string(),
        }
    }

    #[test]
    fn chunks_respect_size_limit() {
        let pages = [page(1, &"This is a sentence. ".repeat(200))];
        let chunks = chunk_pages(&pages, &config(100, 20)).unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.content.len() <= 100);
        }
    }

    #[test]
    fn consecutive_chunks_overlap() {
        let pages = [page(1, &"word ".repeat(400))];
        let chunks = chunk_pages(&pages, &config(100, 40)).unwrap();
        assert!(chunks.len() > 1);
        // The tail of each chunk reappears at the head of the next one
        for pair in chunks.windows(2) {
            let tail: String = pair[0]
                .content
                .chars()
                .skip(pair[0].content.len().saturating_sub(10))
                .collect();
            assert!(pair[1].content.contains(tail.trim()));
        }
    }

    #[test]
    fn chunks_keep_page_numbers() {
        let pages = [
            page(1, &"alpha ".repeat(100)),
            page(2, &"beta ".repeat(100)),
        ];
        let chunks = chunk_pages(&pages, &config(120, 20)).unwrap();
        assert!(chunks.iter().any(|c| c.page == 1));
        assert!(chunks.iter().any(|c| c.page == 2));
        // Index is global and strictly increasing
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let chunks = chunk_pages(&[], &config(1000, 200)).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn overlap_larger_than_size_is_rejected() {
        let pages = [page(1, "short text")];
        let err = chunk_pages(&pages, &config(100, 150)).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
