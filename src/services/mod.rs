use crate::config::AppConfig;
use crate::embeddings::{GeminiEmbedder, MockEmbedder};
use crate::errors::AppError;
use crate::generation::{GeminiGenerator, MockGenerator};
use crate::session::{Credentials, SessionBackend, SessionStore};
use crate::vector_store::{MemoryStore, QdrantStore};
use std::sync::Arc;
use std::time::Duration;

pub mod ingest;
pub mod query;

pub use ingest::IngestService;
pub use query::QueryService;

/// Builds the external clients for one session from its credentials.
///
/// Credentials are threaded explicitly instead of exported to process-wide
/// environment state, so concurrent sessions cannot race on each other's
/// keys.
pub trait BackendFactory: Send + Sync {
    fn build(&self, credentials: &Credentials) -> Result<SessionBackend, AppError>;
}

/// Default factory: hosted embedding/generation API plus the remote vector
/// store. The literal API key `mock` selects in-process stand-ins, the same
/// switch used for offline development.
pub struct CloudBackendFactory {
    config: Arc<AppConfig>,
}

impl CloudBackendFactory {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }
}

impl BackendFactory for CloudBackendFactory {
    fn build(&self, credentials: &Credentials) -> Result<SessionBackend, AppError> {
        if credentials.model_api_key == "mock" {
            return Ok(SessionBackend {
                embedder: Arc::new(MockEmbedder::new(64)),
                generator: Arc::new(MockGenerator),
                vectors: Arc::new(MemoryStore::new()),
            });
        }

        let models = &self.config.models;
        Ok(SessionBackend {
            embedder: Arc::new(GeminiEmbedder::new(
                models.api_base.clone(),
                credentials.model_api_key.clone(),
                models.embedding_model.clone(),
            )?),
            generator: Arc::new(GeminiGenerator::new(
                models.api_base.clone(),
                credentials.model_api_key.clone(),
                models.generation_model.clone(),
                models.temperature,
            )?),
            vectors: Arc::new(QdrantStore::new(
                credentials.vector_url.clone(),
                credentials.vector_api_key.clone(),
                self.config.vector_store.collection_name.clone(),
                Duration::from_secs(self.config.vector_store.timeout_secs),
            )?),
        })
    }
}

/// A container for all services to be injected into routes
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: SessionStore,
    pub backends: Arc<dyn BackendFactory>,
    pub ingest_service: Arc<IngestService>,
    pub query_service: Arc<QueryService>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, backends: Arc<dyn BackendFactory>) -> Self {
        Self {
            sessions: SessionStore::new(),
            backends,
            ingest_service: Arc::new(IngestService::new(config.chunking.clone())),
            query_service: Arc::new(QueryService::new(config.retrieval.clone())),
            config,
        }
    }
}
