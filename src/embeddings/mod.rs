//! Embedding clients
//!
//! `Embedder` is the seam between the pipelines and the hosted embedding
//! model. `GeminiEmbedder` talks to the generative-language REST API;
//! `MockEmbedder` is a deterministic in-process stand-in used by tests and
//! the `mock` credential mode.

use crate::errors::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// Texts per batch request against the hosted API
const EMBED_BATCH_SIZE: usize = 100;

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, AppError>;
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, AppError>;
}

/// Hosted embedding model client (Gemini-style REST API)
pub struct GeminiEmbedder {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ContentPayload {
    parts: Vec<TextPart>,
}

#[derive(Serialize)]
struct TextPart {
    text: String,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    content: ContentPayload,
}

#[derive(Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedRequest>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

impl GeminiEmbedder {
    pub fn new(api_base: String, api_key: String, model: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::EmbeddingError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_base,
            api_key,
            model,
        })
    }

    fn model_path(&self) -> String {
        format!("models/{}", self.model)
    }

    fn request_for(&self, text: &str) -> EmbedRequest {
        EmbedRequest {
            model: self.model_path(),
            content: ContentPayload {
                parts: vec![TextPart {
                    text: text.to_string(),
                }],
            },
        }
    }

    async fn post_json<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<R, AppError> {
        let url = format!(
            "{}/{}:{}?key={}",
            self.api_base,
            self.model_path(),
            endpoint,
            self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::EmbeddingError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::EmbeddingError(format!(
                "API error {}: {}",
                status, detail
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::EmbeddingError(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let body = self.request_for(text);
        let response: EmbedResponse = self.post_json("embedContent", &body).await?;
        Ok(response.embedding.values)
    }

    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, AppError> {
        let mut all = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBED_BATCH_SIZE) {
            let body = BatchEmbedRequest {
                requests: batch.iter().map(|t| self.request_for(t)).collect(),
            };
            let response: BatchEmbedResponse = self.post_json("batchEmbedContents", &body).await?;
            if response.embeddings.len() != batch.len() {
                return Err(AppError::EmbeddingError(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    response.embeddings.len()
                )));
            }
            all.extend(response.embeddings.into_iter().map(|e| e.values));
        }
        Ok(all)
    }
}

/// Deterministic offline embedder.
///
/// Hashes each word into a dimension bucket so texts sharing vocabulary get
/// similar vectors, which keeps similarity search meaningful in tests.
pub struct MockEmbedder {
    dim: usize,
}

impl MockEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dim];
        for word in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() as usize) % self.dim;
            vector[bucket] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, AppError> {
        Ok(self.embed_sync(text))
    }

    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, AppError> {
        Ok(texts.iter().map(|t| self.embed_sync(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::cosine_similarity;

    #[tokio::test]
    async fn mock_embeddings_are_deterministic() {
        let embedder = MockEmbedder::new(64);
        let a = embedder.embed_query("the quick brown fox").await.unwrap();
        let b = embedder.embed_query("the quick brown fox").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn shared_vocabulary_scores_higher() {
        let embedder = MockEmbedder::new(64);
        let query = embedder.embed_query("storage engine design").await.unwrap();
        let close = embedder
            .embed_query("the storage engine design notes")
            .await
            .unwrap();
        let far = embedder
            .embed_query("completely unrelated cooking recipe")
            .await
            .unwrap();
        assert!(cosine_similarity(&query, &close) > cosine_similarity(&query, &far));
    }

    #[tokio::test]
    async fn batch_matches_single() {
        let embedder = MockEmbedder::new(32);
        let single = embedder.embed_query("hello world").await.unwrap();
        let batch = embedder
            .embed_documents(vec!["hello world".to_string()])
            .await
            .unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0], single);
    }
}
