//! Upload handlers: persist a PDF under the working directory, or remove
//! the active one and invalidate everything downstream.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::path::Path as FsPath;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::intake;
use crate::services::AppState;

#[derive(Serialize)]
pub struct UploadResponse {
    pub path: String,
    pub size: usize,
}

#[instrument(skip(state, multipart))]
pub async fn upload_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("Invalid multipart body: {}", e)))?
    {
        if let Some(filename) = field.file_name().map(str::to_string) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::ValidationError(format!("Failed to read upload: {}", e)))?;
            upload = Some((filename, bytes.to_vec()));
            break;
        }
    }
    let (filename, bytes) =
        upload.ok_or_else(|| AppError::ValidationError("No file in upload".to_string()))?;
    if bytes.is_empty() {
        return Err(AppError::ValidationError("Uploaded file is empty".to_string()));
    }

    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    if session.active_file().is_some() {
        return Err(AppError::DocumentAlreadyActive);
    }

    let upload_dir = FsPath::new(&state.config.storage.upload_dir);
    let path = intake::save_upload(upload_dir, &filename, &bytes)?;
    session.attach_file(path.clone())?;
    session.touch();

    info!(session_id = %id, path = %path.display(), "Document uploaded");
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            path: path.display().to_string(),
            size: bytes.len(),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn remove_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    let (path, backend) = session.remove_file()?;
    session.touch();
    drop(session);

    intake::delete_upload(&path)?;
    if let Some(backend) = backend {
        super::session::teardown_collection(&backend, id).await;
    } else {
        warn!(session_id = %id, "No backend at file removal; remote collection untouched");
    }

    info!(session_id = %id, path = %path.display(), "Document removed");
    Ok(StatusCode::NO_CONTENT)
}
