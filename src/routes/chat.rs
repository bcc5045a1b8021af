//! Ingestion and chat handlers.
//!
//! `process_document` runs the load → split → embed → store pipeline on the
//! active file and promotes the session to Ready only when every step
//! succeeded. `ask` is gated on Ready, appends to the transcript and returns
//! the generated answer.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::services::AppState;
use crate::session::{Role, TranscriptEntry};

#[derive(Serialize)]
pub struct ProcessResponse {
    pub chunks_indexed: usize,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 1000))]
    pub question: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub answer: String,
}

#[derive(Serialize)]
pub struct TranscriptResponse {
    pub entries: Vec<TranscriptEntry>,
}

#[instrument(skip(state))]
pub async fn process_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProcessResponse>, AppError> {
    let session = state.sessions.get(id).await?;
    // Held for the whole run: processing blocks other interactions with
    // this session until it completes or errors.
    let mut session = session.lock().await;

    let backend = session.backend()?.clone();
    let path = session.active_file().ok_or(AppError::NoDocument)?.clone();

    let chunks_indexed = state.ingest_service.ingest(&backend, &path).await?;
    session.mark_processed()?;
    session.touch();

    info!(session_id = %id, chunks_indexed, "Document processed");
    Ok(Json(ProcessResponse { chunks_indexed }))
}

#[instrument(skip(state, request))]
pub async fn ask(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    request
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    session.require_ready()?;
    let backend = session.backend()?.clone();

    session
        .transcript_mut()
        .append(Role::User, request.question.clone());

    let answer = state
        .query_service
        .answer(&backend, &request.question)
        .await?;

    session
        .transcript_mut()
        .append(Role::Assistant, answer.clone());
    session.touch();

    Ok(Json(ChatResponse { answer }))
}

#[instrument(skip(state))]
pub async fn transcript(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TranscriptResponse>, AppError> {
    let session = state.sessions.get(id).await?;
    let session = session.lock().await;
    Ok(Json(TranscriptResponse {
        entries: session.transcript().all().to_vec(),
    }))
}
