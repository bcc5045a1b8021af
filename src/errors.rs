use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Unique error codes for client identification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationFailed = 1001,
    CredentialMissing = 1002,
    InvalidFilename = 1003,

    // Session/state errors (2xxx)
    SessionNotFound = 2001,
    NotConnected = 2002,
    AlreadyConnected = 2003,
    NoDocument = 2004,
    DocumentAlreadyActive = 2005,
    NotProcessed = 2006,

    // Local I/O errors (3xxx)
    FileIo = 3001,
    PdfLoad = 3002,

    // External service errors (5xxx)
    EmbeddingService = 5001,
    VectorStoreService = 5002,
    GenerationService = 5003,
    CollectionDelete = 5004,

    // Internal errors (9xxx)
    InternalError = 9001,
    ConfigurationError = 9002,
}

impl ErrorCode {
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }
}

/// Application error types covering every failure mode of the
/// connect / upload / ingest / query lifecycle.
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Missing credential: {0}")]
    CredentialMissing(&'static str),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    // Session/state errors
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Session is not connected")]
    NotConnected,

    #[error("Session is already connected")]
    AlreadyConnected,

    #[error("No document uploaded for this session")]
    NoDocument,

    #[error("A document is already active; remove it before uploading another")]
    DocumentAlreadyActive,

    #[error("Document has not been processed yet")]
    NotProcessed,

    // Local I/O errors
    #[error("File I/O error: {0}")]
    FileIo(String),

    #[error("Failed to load PDF: {0}")]
    PdfLoad(String),

    // External service errors
    #[error("Embedding service error: {0}")]
    EmbeddingError(String),

    #[error("Vector store error: {0}")]
    VectorStoreError(String),

    #[error("Generation service error: {0}")]
    GenerationError(String),

    // Non-fatal: raised by collection teardown, logged by the caller
    #[error("Failed to delete remote collection: {0}")]
    CollectionDeleteError(String),

    // Internal errors
    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
}

impl AppError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::ValidationError(_) => ErrorCode::ValidationFailed,
            Self::CredentialMissing(_) => ErrorCode::CredentialMissing,
            Self::InvalidFilename(_) => ErrorCode::InvalidFilename,
            Self::SessionNotFound(_) => ErrorCode::SessionNotFound,
            Self::NotConnected => ErrorCode::NotConnected,
            Self::AlreadyConnected => ErrorCode::AlreadyConnected,
            Self::NoDocument => ErrorCode::NoDocument,
            Self::DocumentAlreadyActive => ErrorCode::DocumentAlreadyActive,
            Self::NotProcessed => ErrorCode::NotProcessed,
            Self::FileIo(_) => ErrorCode::FileIo,
            Self::PdfLoad(_) => ErrorCode::PdfLoad,
            Self::EmbeddingError(_) => ErrorCode::EmbeddingService,
            Self::VectorStoreError(_) => ErrorCode::VectorStoreService,
            Self::GenerationError(_) => ErrorCode::GenerationService,
            Self::CollectionDeleteError(_) => ErrorCode::CollectionDelete,
            Self::InternalError(_) => ErrorCode::InternalError,
            Self::ConfigError(_) => ErrorCode::ConfigurationError,
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::CredentialMissing(_) => StatusCode::BAD_REQUEST,
            Self::InvalidFilename(_) => StatusCode::BAD_REQUEST,
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::NotConnected => StatusCode::CONFLICT,
            Self::AlreadyConnected => StatusCode::CONFLICT,
            Self::NoDocument => StatusCode::CONFLICT,
            Self::DocumentAlreadyActive => StatusCode::CONFLICT,
            Self::NotProcessed => StatusCode::CONFLICT,
            Self::FileIo(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PdfLoad(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::EmbeddingError(_) => StatusCode::BAD_GATEWAY,
            Self::VectorStoreError(_) => StatusCode::BAD_GATEWAY,
            Self::GenerationError(_) => StatusCode::BAD_GATEWAY,
            Self::CollectionDeleteError(_) => StatusCode::BAD_GATEWAY,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileIo(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        // Log based on severity
        match &self {
            AppError::ValidationError(_)
            | AppError::CredentialMissing(_)
            | AppError::InvalidFilename(_)
            | AppError::SessionNotFound(_) => {
                tracing::debug!(error_code = error_code.as_u16(), %message, "Client error");
            }
            AppError::NotConnected
            | AppError::AlreadyConnected
            | AppError::NoDocument
            | AppError::DocumentAlreadyActive
            | AppError::NotProcessed => {
                tracing::info!(error_code = error_code.as_u16(), %message, "Session state error");
            }
            _ => {
                tracing::error!(error_code = error_code.as_u16(), %message, error = ?self, "Server error");
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code.as_u16(),
                "status": status.as_u16(),
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_mapping() {
        let err = AppError::CredentialMissing("model_api_key");
        assert_eq!(err.error_code(), ErrorCode::CredentialMissing);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn phase_errors_are_conflicts() {
        assert_eq!(AppError::NotProcessed.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::NoDocument.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::NotConnected.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn upstream_errors_are_bad_gateway() {
        let err = AppError::EmbeddingError("timeout".into());
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        let err = AppError::GenerationError("auth".into());
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AppError = io.into();
        assert_eq!(err.error_code(), ErrorCode::FileIo);
    }
}
