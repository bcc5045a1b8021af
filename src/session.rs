//! Session state
//!
//! One session per browser connection, holding credentials, the active
//! document, the processed flag and the chat transcript. State moves through
//! an explicit finite-state machine; transition methods reject anything the
//! current phase does not allow, so pipelines never observe half-built state.
//!
//! Invariant: at most one file, one vector collection and one processed
//! pipeline per session.

use crate::embeddings::Embedder;
use crate::errors::AppError;
use crate::generation::Generator;
use crate::vector_store::VectorStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Per-session credentials, validated and threaded explicitly into the
/// pipeline clients. Never exported to process-wide environment state.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub model_api_key: String,
    pub vector_url: String,
    pub vector_api_key: String,
}

impl Credentials {
    /// Connect requires all three values non-empty.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.model_api_key.trim().is_empty() {
            return Err(AppError::CredentialMissing("model_api_key"));
        }
        if self.vector_url.trim().is_empty() {
            return Err(AppError::CredentialMissing("vector_url"));
        }
        if self.vector_api_key.trim().is_empty() {
            return Err(AppError::CredentialMissing("vector_api_key"));
        }
        Ok(())
    }
}

/// External clients built from one session's credentials
#[derive(Clone)]
pub struct SessionBackend {
    pub embedder: Arc<dyn Embedder>,
    pub generator: Arc<dyn Generator>,
    pub vectors: Arc<dyn VectorStore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Disconnected,
    /// Connected, no document uploaded
    NoFile,
    /// Connected with a document that has not been ingested
    Unprocessed,
    /// Connected, document ingested, chat available
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Append-only ordered chat log, replayed in full on every render
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn append(&mut self, role: Role, text: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            role,
            text: text.into(),
            at: Utc::now(),
        });
    }

    pub fn all(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

pub struct Session {
    pub id: Uuid,
    credentials: Option<Credentials>,
    backend: Option<SessionBackend>,
    active_file: Option<PathBuf>,
    processed: bool,
    transcript: Transcript,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

impl Session {
    fn new(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            credentials: None,
            backend: None,
            active_file: None,
            processed: false,
            transcript: Transcript::default(),
            created_at: now,
            last_active_at: now,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match (&self.credentials, &self.active_file, self.processed) {
            (None, _, _) => SessionPhase::Disconnected,
            (Some(_), None, _) => SessionPhase::NoFile,
            (Some(_), Some(_), false) => SessionPhase::Unprocessed,
            (Some(_), Some(_), true) => SessionPhase::Ready,
        }
    }

    pub fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }

    pub fn is_connected(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn active_file(&self) -> Option<&PathBuf> {
        self.active_file.as_ref()
    }

    pub fn is_processed(&self) -> bool {
        self.processed
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    /// Store validated credentials and their backend clients.
    pub fn connect(
        &mut self,
        credentials: Credentials,
        backend: SessionBackend,
    ) -> Result<(), AppError> {
        if self.credentials.is_some() {
            return Err(AppError::AlreadyConnected);
        }
        credentials.validate()?;
        self.credentials = Some(credentials);
        self.backend = Some(backend);
        Ok(())
    }

    /// Clear credentials and all derived state.
    ///
    /// Returns the discarded backend and file path so the caller can attempt
    /// best-effort remote collection deletion and local file removal.
    pub fn disconnect(&mut self) -> Result<(Option<SessionBackend>, Option<PathBuf>), AppError> {
        if self.credentials.is_none() {
            return Err(AppError::NotConnected);
        }
        self.credentials = None;
        self.processed = false;
        self.transcript.clear();
        Ok((self.backend.take(), self.active_file.take()))
    }

    pub fn attach_file(&mut self, path: PathBuf) -> Result<(), AppError> {
        if self.active_file.is_some() {
            return Err(AppError::DocumentAlreadyActive);
        }
        self.active_file = Some(path);
        self.processed = false;
        Ok(())
    }

    /// Remove the active file reference; invalidates everything downstream.
    ///
    /// Returns the removed path and the backend so the caller can delete the
    /// on-disk file and attempt collection deletion.
    pub fn remove_file(&mut self) -> Result<(PathBuf, Option<SessionBackend>), AppError> {
        let path = self.active_file.take().ok_or(AppError::NoDocument)?;
        self.processed = false;
        self.transcript.clear();
        Ok((path, self.backend.clone()))
    }

    /// Promote to Ready. Only called after ingestion fully succeeded.
    pub fn mark_processed(&mut self) -> Result<(), AppError> {
        if self.credentials.is_none() {
            return Err(AppError::NotConnected);
        }
        if self.active_file.is_none() {
            return Err(AppError::NoDocument);
        }
        self.processed = true;
        Ok(())
    }

    /// Backend handle; requires a connected session.
    pub fn backend(&self) -> Result<&SessionBackend, AppError> {
        self.backend.as_ref().ok_or(AppError::NotConnected)
    }

    /// Gate for the query pipeline: ingestion must have completed.
    pub fn require_ready(&self) -> Result<(), AppError> {
        match self.phase() {
            SessionPhase::Ready => Ok(()),
            SessionPhase::Disconnected => Err(AppError::NotConnected),
            SessionPhase::NoFile => Err(AppError::NoDocument),
            SessionPhase::Unprocessed => Err(AppError::NotProcessed),
        }
    }
}

/// In-memory session registry.
///
/// Each session sits behind its own mutex; holding it across a whole
/// interaction serialises mutation the way the original single-threaded
/// execution model did.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(Session::new(id)));
        self.inner.write().await.insert(id, session);
        id
    }

    pub async fn get(&self, id: Uuid) -> Result<Arc<Mutex<Session>>, AppError> {
        self.inner
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(AppError::SessionNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockEmbedder;
    use crate::generation::MockGenerator;
    use crate::vector_store::MemoryStore;

    fn creds() -> Credentials {
        Credentials {
            model_api_key: "key".into(),
            vector_url: "http://localhost:6333".into(),
            vector_api_key: "secret".into(),
        }
    }

    fn backend() -> SessionBackend {
        SessionBackend {
            embedder: Arc::new(MockEmbedder::new(16)),
            generator: Arc::new(MockGenerator),
            vectors: Arc::new(MemoryStore::new()),
        }
    }

    #[test]
    fn connect_requires_all_credentials() {
        let mut session = Session::new(Uuid::new_v4());

        let mut missing = creds();
        missing.vector_url = String::new();
        let err = session.connect(missing, backend()).unwrap_err();
        assert!(matches!(err, AppError::CredentialMissing("vector_url")));
        assert_eq!(session.phase(), SessionPhase::Disconnected);

        session.connect(creds(), backend()).unwrap();
        assert_eq!(session.phase(), SessionPhase::NoFile);
    }

    #[test]
    fn double_connect_is_rejected() {
        let mut session = Session::new(Uuid::new_v4());
        session.connect(creds(), backend()).unwrap();
        let err = session.connect(creds(), backend()).unwrap_err();
        assert!(matches!(err, AppError::AlreadyConnected));
    }

    #[test]
    fn full_lifecycle_reaches_ready() {
        let mut session = Session::new(Uuid::new_v4());
        session.connect(creds(), backend()).unwrap();
        session.attach_file(PathBuf::from("uploaded_pdfs/doc.pdf")).unwrap();
        assert_eq!(session.phase(), SessionPhase::Unprocessed);
        assert!(session.require_ready().is_err());

        session.mark_processed().unwrap();
        assert_eq!(session.phase(), SessionPhase::Ready);
        assert!(session.require_ready().is_ok());
    }

    #[test]
    fn second_upload_requires_removal_first() {
        let mut session = Session::new(Uuid::new_v4());
        session.attach_file(PathBuf::from("a.pdf")).unwrap();
        let err = session.attach_file(PathBuf::from("b.pdf")).unwrap_err();
        assert!(matches!(err, AppError::DocumentAlreadyActive));
    }

    #[test]
    fn remove_file_invalidates_downstream_state() {
        let mut session = Session::new(Uuid::new_v4());
        session.connect(creds(), backend()).unwrap();
        session.attach_file(PathBuf::from("doc.pdf")).unwrap();
        session.mark_processed().unwrap();
        session.transcript_mut().append(Role::User, "hi");

        let (path, teardown) = session.remove_file().unwrap();
        assert_eq!(path, PathBuf::from("doc.pdf"));
        assert!(teardown.is_some());
        assert!(!session.is_processed());
        assert!(session.transcript().is_empty());
        assert_eq!(session.phase(), SessionPhase::NoFile);
        assert!(matches!(session.require_ready(), Err(AppError::NoDocument)));
    }

    #[test]
    fn disconnect_clears_everything() {
        let mut session = Session::new(Uuid::new_v4());
        session.connect(creds(), backend()).unwrap();
        session.attach_file(PathBuf::from("doc.pdf")).unwrap();
        session.mark_processed().unwrap();
        session.transcript_mut().append(Role::User, "question");
        session.transcript_mut().append(Role::Assistant, "answer");

        let (teardown, file) = session.disconnect().unwrap();
        assert!(teardown.is_some());
        assert_eq!(file, Some(PathBuf::from("doc.pdf")));
        assert_eq!(session.phase(), SessionPhase::Disconnected);
        assert!(!session.is_processed());
        assert!(session.transcript().is_empty());
        assert!(session.backend().is_err());
        // Re-connecting starts from scratch: no file, not processed
        session.connect(creds(), backend()).unwrap();
        assert_eq!(session.phase(), SessionPhase::NoFile);
    }

    #[test]
    fn disconnect_when_disconnected_is_rejected() {
        let mut session = Session::new(Uuid::new_v4());
        assert!(matches!(
            session.disconnect(),
            Err(AppError::NotConnected)
        ));
    }

    #[test]
    fn transcript_is_append_only_and_ordered() {
        let mut transcript = Transcript::default();
        transcript.append(Role::User, "E1");
        transcript.append(Role::Assistant, "E2");
        transcript.append(Role::User, "E3");

        let texts: Vec<&str> = transcript.all().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["E1", "E2", "E3"]);
        assert_eq!(transcript.len(), 3);
        for pair in transcript.all().windows(2) {
            assert!(pair[0].at <= pair[1].at);
        }
    }

    #[tokio::test]
    async fn store_creates_and_finds_sessions() {
        let store = SessionStore::new();
        let id = store.create().await;
        assert!(store.get(id).await.is_ok());

        let missing = Uuid::new_v4();
        assert!(matches!(
            store.get(missing).await,
            Err(AppError::SessionNotFound(_))
        ));
    }
}
