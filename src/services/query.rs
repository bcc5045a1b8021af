//! Question answering service
//!
//! Retrieval-augmented generation over the session's collection: embed the
//! question, fetch a candidate pool, re-rank it for diversity with MMR,
//! assemble the grounding prompt and submit it to the generation model.

use crate::config::RetrievalConfig;
use crate::errors::AppError;
use crate::generation;
use crate::retrieval::maximal_marginal_relevance;
use crate::session::SessionBackend;
use tracing::{debug, info};

pub struct QueryService {
    retrieval: RetrievalConfig,
}

impl QueryService {
    pub fn new(retrieval: RetrievalConfig) -> Self {
        Self { retrieval }
    }

    /// Answer a question against the ingested document.
    ///
    /// The caller gates this on the session's Ready phase; this method only
    /// assumes a populated collection. Returns the model's text verbatim.
    pub async fn answer(
        &self,
        backend: &SessionBackend,
        question: &str,
    ) -> Result<String, AppError> {
        let query_embedding = backend.embedder.embed_query(question).await?;

        let candidates = backend
            .vectors
            .search(&query_embedding, self.retrieval.fetch_k)
            .await?;
        debug!(candidates = candidates.len(), "Fetched candidate pool");

        let selected = maximal_marginal_relevance(
            &query_embedding,
            candidates,
            self.retrieval.mmr_lambda,
            self.retrieval.top_k,
        );

        let prompt = generation::build_prompt(&selected, question);
        let answer = backend.generator.generate(&prompt).await?;

        metrics::counter!("chatpdf_queries_total").increment(1);
        info!(
            chunks_used = selected.len(),
            answer_len = answer.len(),
            "Question answered"
        );

        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChunkingConfig;
    use crate::embeddings::MockEmbedder;
    use crate::generation::MockGenerator;
    use crate::services::IngestService;
    use crate::session::SessionBackend;
    use crate::test_support::write_sample_pdf;
    use crate::vector_store::MemoryStore;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn backend() -> SessionBackend {
        SessionBackend {
            embedder: Arc::new(MockEmbedder::new(32)),
            generator: Arc::new(MockGenerator),
            vectors: Arc::new(MemoryStore::new()),
        }
    }

    fn service() -> QueryService {
        QueryService::new(RetrievalConfig {
            top_k: 5,
            fetch_k: 20,
            mmr_lambda: 0.7,
        })
    }

    #[tokio::test]
    async fn answer_requires_an_existing_collection() {
        let backend = backend();
        let err = service().answer(&backend, "anything?").await.unwrap_err();
        assert!(matches!(err, AppError::VectorStoreError(_)));
    }

    #[tokio::test]
    async fn ingested_document_yields_nonempty_answer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        write_sample_pdf(&path, 3);

        let backend = backend();
        let ingest = IngestService::new(ChunkingConfig {
            chunk_size: 200,
            chunk_overlap: 40,
        });
        ingest.ingest(&backend, &path).await.unwrap();

        let answer = service()
            .answer(&backend, "What is the summary?")
            .await
            .unwrap();
        assert!(!answer.is_empty());
    }
}
