//! Document ingestion service
//!
//! The load → split → embed → store pipeline:
//! 1. Extract page-level text from the persisted PDF
//! 2. Split pages into overlapping chunks
//! 3. Generate one embedding per chunk
//! 4. Recreate the remote collection and upsert every point
//!
//! Any failing step aborts the whole run; the caller only marks the session
//! processed after this returns Ok.

use crate::chunker;
use crate::config::ChunkingConfig;
use crate::errors::AppError;
use crate::pdf;
use crate::session::SessionBackend;
use crate::vector_store::ChunkPoint;
use std::path::Path;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

pub struct IngestService {
    chunking: ChunkingConfig,
}

impl IngestService {
    pub fn new(chunking: ChunkingConfig) -> Self {
        Self { chunking }
    }

    /// Run the full pipeline against one document.
    ///
    /// Re-running is destructive by contract: the collection is recreated,
    /// wiping whatever a previous run stored. Returns the number of chunks
    /// indexed.
    pub async fn ingest(&self, backend: &SessionBackend, path: &Path) -> Result<usize, AppError> {
        let start = Instant::now();

        let pages = pdf::extract_pages(path)?;
        let chunks = chunker::chunk_pages(&pages, &self.chunking)?;
        if chunks.is_empty() {
            return Err(AppError::PdfLoad(format!(
                "{}: document produced no chunks",
                path.display()
            )));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = backend.embedder.embed_documents(texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(AppError::EmbeddingError(format!(
                "Got {} embeddings for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let dimension = embeddings[0].len();
        backend.vectors.recreate_collection(dimension).await?;

        let points: Vec<ChunkPoint> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, vector)| ChunkPoint {
                id: Uuid::new_v4(),
                content: chunk.content,
                page: chunk.page,
                chunk_index: chunk.index,
                vector,
            })
            .collect();
        let point_count = points.len();
        backend.vectors.upsert(points).await?;

        metrics::counter!("chatpdf_ingest_total").increment(1);
        info!(
            path = %path.display(),
            pages = pages.len(),
            chunks = point_count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Document ingested"
        );

        Ok(point_count)
    }
}
