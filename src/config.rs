use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub models: ModelsConfig,
    pub vector_store: VectorStoreConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory uploaded PDFs are persisted to, keyed by filename
    pub upload_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Number of chunks returned to the prompt
    pub top_k: usize,
    /// Candidate pool size fetched before diversity re-ranking
    pub fetch_k: usize,
    /// MMR relevance/diversity mixing parameter
    pub mmr_lambda: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelsConfig {
    pub embedding_model: String,
    pub generation_model: String,
    /// Generation temperature; low favors determinism
    pub temperature: f32,
    pub api_base: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VectorStoreConfig {
    /// Fixed collection name; recreated on every ingest
    pub collection_name: String,
    /// Connection timeout for the remote store
    pub timeout_secs: u64,
}

impl AppConfig {
    pub fn build() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.rust_log", "info,chatpdf=debug")?
            .set_default("storage.upload_dir", "uploaded_pdfs")?
            .set_default("chunking.chunk_size", 1000)?
            .set_default("chunking.chunk_overlap", 200)?
            .set_default("retrieval.top_k", 5)?
            .set_default("retrieval.fetch_k", 20)?
            .set_default("retrieval.mmr_lambda", 0.7)?
            .set_default("models.embedding_model", "text-embedding-004")?
            .set_default("models.generation_model", "gemini-1.5-flash")?
            .set_default("models.temperature", 0.2)?
            .set_default(
                "models.api_base",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("vector_store.collection_name", "chat_pdf")?
            .set_default("vector_store.timeout_secs", 10)?
            // Environment overrides, e.g. `APP_SERVER__PORT=8080`
            .add_source(Environment::default().separator("__").prefix("APP"));

        let config: AppConfig = builder.build()?.try_deserialize()?;

        if config.chunking.chunk_overlap >= config.chunking.chunk_size {
            return Err(ConfigError::Message(
                "chunking.chunk_overlap must be smaller than chunking.chunk_size".to_string(),
            ));
        }

        Ok(config)
    }
}
