//! Session lifecycle handlers: create, inspect, connect, disconnect.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::intake;
use crate::services::AppState;
use crate::session::{Credentials, SessionBackend, SessionPhase};

#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub phase: SessionPhase,
    pub connected: bool,
    pub file: Option<String>,
    pub processed: bool,
    pub transcript_len: usize,
    pub created_at: String,
}

#[instrument(skip(state))]
pub async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let session_id = state.sessions.create().await;
    info!(session_id = %session_id, "Session created");
    (
        StatusCode::CREATED,
        Json(CreateSessionResponse { session_id }),
    )
}

#[instrument(skip(state))]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state.sessions.get(id).await?;
    let session = session.lock().await;
    Ok(Json(SessionResponse {
        session_id: session.id,
        phase: session.phase(),
        connected: session.is_connected(),
        file: session
            .active_file()
            .map(|p| p.display().to_string()),
        processed: session.is_processed(),
        transcript_len: session.transcript().len(),
        created_at: session.created_at.to_rfc3339(),
    }))
}

#[instrument(skip(state, credentials))]
pub async fn connect(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SessionResponse>, AppError> {
    credentials.validate()?;
    let backend = state.backends.build(&credentials)?;

    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    session.connect(credentials, backend)?;
    session.touch();
    info!(session_id = %id, "Session connected");

    Ok(Json(SessionResponse {
        session_id: session.id,
        phase: session.phase(),
        connected: true,
        file: session.active_file().map(|p| p.display().to_string()),
        processed: session.is_processed(),
        transcript_len: session.transcript().len(),
        created_at: session.created_at.to_rfc3339(),
    }))
}

#[instrument(skip(state))]
pub async fn disconnect(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    let (backend, file) = session.disconnect()?;
    session.touch();
    drop(session);

    if let Some(backend) = backend {
        teardown_collection(&backend, id).await;
    }
    if let Some(path) = file {
        if let Err(e) = intake::delete_upload(&path) {
            warn!(session_id = %id, error = %e, "Failed to remove uploaded file on disconnect");
        }
    }

    info!(session_id = %id, "Session disconnected");
    Ok(StatusCode::NO_CONTENT)
}

/// Best-effort remote collection deletion at teardown.
///
/// An orphaned remote collection is an operational cost, so failures are
/// logged rather than silently swallowed, but they never fail the request.
pub(crate) async fn teardown_collection(backend: &SessionBackend, session_id: Uuid) {
    if let Err(e) = backend.vectors.delete_collection().await {
        warn!(
            session_id = %session_id,
            error = %e,
            "Failed to delete remote collection; it may be orphaned"
        );
    }
}
