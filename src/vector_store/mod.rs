//! Vector collection clients
//!
//! `VectorStore` covers the four operations the pipelines need: recreate the
//! fixed-name collection, upsert a batch of points, similarity search that
//! returns stored vectors (the query pipeline re-ranks them), and best-effort
//! deletion at teardown. `QdrantStore` speaks the remote REST API;
//! `MemoryStore` is the in-process implementation for tests and mock mode.

use crate::errors::AppError;
use crate::retrieval::cosine_similarity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A chunk plus its embedding, ready for upsert
#[derive(Debug, Clone)]
pub struct ChunkPoint {
    pub id: Uuid,
    pub content: String,
    pub page: u32,
    pub chunk_index: usize,
    pub vector: Vec<f32>,
}

/// A search hit: stored payload plus the stored vector and similarity score
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub content: String,
    pub page: u32,
    pub score: f32,
    pub vector: Vec<f32>,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Drop and re-create the collection. Destructive by contract:
    /// re-running ingestion wipes prior contents.
    async fn recreate_collection(&self, dimension: usize) -> Result<(), AppError>;

    async fn upsert(&self, points: Vec<ChunkPoint>) -> Result<(), AppError>;

    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>, AppError>;

    async fn count(&self) -> Result<usize, AppError>;

    /// Teardown. Failures are surfaced so the caller can log them, but the
    /// caller treats them as non-fatal.
    async fn delete_collection(&self) -> Result<(), AppError>;
}

/// Remote vector store client (Qdrant REST API)
pub struct QdrantStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    collection: String,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
    with_vector: bool,
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    score: f32,
    #[serde(default)]
    payload: PointPayload,
    #[serde(default)]
    vector: Vec<f32>,
}

#[derive(Deserialize, Default)]
struct PointPayload {
    #[serde(default)]
    content: String,
    #[serde(default)]
    page: u32,
}

#[derive(Deserialize)]
struct CountResponse {
    result: CountResult,
}

#[derive(Deserialize)]
struct CountResult {
    count: usize,
}

impl QdrantStore {
    pub fn new(
        base_url: String,
        api_key: String,
        collection: String,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::VectorStoreError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            collection,
        })
    }

    fn collection_url(&self, suffix: &str) -> String {
        format!("{}/collections/{}{}", self.base_url, self.collection, suffix)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<reqwest::Response, AppError> {
        let response = request
            .header("api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::VectorStoreError(format!("{}: {}", context, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::VectorStoreError(format!(
                "{}: API error {}: {}",
                context, status, detail
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn recreate_collection(&self, dimension: usize) -> Result<(), AppError> {
        // Delete is idempotent on the remote side; a missing collection is fine.
        let delete = self.client.delete(self.collection_url(""));
        if let Err(e) = self.send(delete, "delete collection").await {
            tracing::debug!(error = %e, "Collection delete before recreate failed, continuing");
        }

        let body = json!({
            "vectors": { "size": dimension, "distance": "Cosine" }
        });
        let create = self.client.put(self.collection_url("")).json(&body);
        self.send(create, "create collection").await?;
        Ok(())
    }

    async fn upsert(&self, points: Vec<ChunkPoint>) -> Result<(), AppError> {
        let payload_points: Vec<_> = points
            .iter()
            .map(|p| {
                json!({
                    "id": p.id,
                    "vector": p.vector,
                    "payload": {
                        "content": p.content,
                        "page": p.page,
                        "chunk_index": p.chunk_index,
                    }
                })
            })
            .collect();

        let body = json!({ "points": payload_points });
        let request = self
            .client
            .put(self.collection_url("/points?wait=true"))
            .json(&body);
        self.send(request, "upsert points").await?;
        Ok(())
    }

    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>, AppError> {
        let body = SearchRequest {
            vector,
            limit,
            with_payload: true,
            with_vector: true,
        };
        let request = self
            .client
            .post(self.collection_url("/points/search"))
            .json(&body);
        let response = self.send(request, "search points").await?;

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::VectorStoreError(format!("Failed to parse search: {}", e)))?;

        Ok(parsed
            .result
            .into_iter()
            .map(|hit| ScoredPoint {
                content: hit.payload.content,
                page: hit.payload.page,
                score: hit.score,
                vector: hit.vector,
            })
            .collect())
    }

    async fn count(&self) -> Result<usize, AppError> {
        let request = self
            .client
            .post(self.collection_url("/points/count"))
            .json(&json!({ "exact": true }));
        let response = self.send(request, "count points").await?;

        let parsed: CountResponse = response
            .json()
            .await
            .map_err(|e| AppError::VectorStoreError(format!("Failed to parse count: {}", e)))?;
        Ok(parsed.result.count)
    }

    async fn delete_collection(&self) -> Result<(), AppError> {
        let request = self.client.delete(self.collection_url(""));
        self.send(request, "delete collection")
            .await
            .map_err(|e| AppError::CollectionDeleteError(e.to_string()))?;
        Ok(())
    }
}

/// In-process vector store with an exact cosine scan
#[derive(Default)]
pub struct MemoryStore {
    // None means the collection does not exist yet
    points: RwLock<Option<Vec<ChunkPoint>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn recreate_collection(&self, _dimension: usize) -> Result<(), AppError> {
        *self.points.write().await = Some(Vec::new());
        Ok(())
    }

    async fn upsert(&self, points: Vec<ChunkPoint>) -> Result<(), AppError> {
        let mut guard = self.points.write().await;
        let existing = guard
            .as_mut()
            .ok_or_else(|| AppError::VectorStoreError("Collection does not exist".to_string()))?;
        existing.extend(points);
        Ok(())
    }

    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>, AppError> {
        let guard = self.points.read().await;
        let points = guard
            .as_ref()
            .ok_or_else(|| AppError::VectorStoreError("Collection does not exist".to_string()))?;

        let mut scored: Vec<ScoredPoint> = points
            .iter()
            .map(|p| ScoredPoint {
                content: p.content.clone(),
                page: p.page,
                score: cosine_similarity(vector, &p.vector),
                vector: p.vector.clone(),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn count(&self) -> Result<usize, AppError> {
        let guard = self.points.read().await;
        guard
            .as_ref()
            .map(|p| p.len())
            .ok_or_else(|| AppError::VectorStoreError("Collection does not exist".to_string()))
    }

    async fn delete_collection(&self) -> Result<(), AppError> {
        *self.points.write().await = None;
        Ok(())
    }
}
