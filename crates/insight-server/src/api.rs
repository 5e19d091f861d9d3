//! Shared pieces of the HTTP API: the error type and blocking DB access.

use crate::AppState;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use insight_db::StoreError;
use insight_interview::InterviewError;
use insight_types::ProfileError;
use insight_voice::VoiceError;
use std::sync::Arc;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
///
/// The body is always `{"error": message, "retryable": bool}`. A retryable
/// error means the same request may succeed if sent again unchanged.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    /// The previous turn is unanswered; `POST /api/interviews/{id}/reply`
    /// resolves it.
    #[error("reply pending: {0}")]
    ReplyPending(String),
    /// Audio could not be understood; nothing was recorded.
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),
    /// A downstream service (LLM, synthesizer) failed.
    #[error("upstream failure: {message}")]
    BadGateway { message: String, retryable: bool },
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl ApiError {
    fn retryable(&self) -> bool {
        match self {
            ApiError::TranscriptionFailed(_) | ApiError::ReplyPending(_) => true,
            ApiError::BadGateway { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let retryable = self.retryable();
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) | ApiError::ReplyPending(msg) => (StatusCode::CONFLICT, msg),
            ApiError::TranscriptionFailed(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::BadGateway { message, .. } => (StatusCode::BAD_GATEWAY, message),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
            "retryable": retryable,
        }));

        (status, body).into_response()
    }
}

impl From<InterviewError> for ApiError {
    fn from(e: InterviewError) -> Self {
        match e {
            InterviewError::SessionClosed | InterviewError::NothingToReply => {
                ApiError::Conflict(e.to_string())
            }
            InterviewError::ReplyPending => ApiError::ReplyPending(e.to_string()),
            InterviewError::EmptyTurn => ApiError::BadRequest(e.to_string()),
            InterviewError::GenerationFailed(_) => ApiError::BadGateway {
                message: e.to_string(),
                retryable: true,
            },
            InterviewError::PhaseMismatch(_) | InterviewError::InvalidTemplate(_) => {
                ApiError::InternalServerError(e.to_string())
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => ApiError::NotFound(what),
            other => ApiError::InternalServerError(other.to_string()),
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(e: ProfileError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<VoiceError> for ApiError {
    fn from(e: VoiceError) -> Self {
        match e {
            VoiceError::ProfileNotFound(_) => ApiError::BadRequest(e.to_string()),
            VoiceError::Stt(msg) => ApiError::TranscriptionFailed(msg),
            VoiceError::Tts(_) | VoiceError::Config(_) => ApiError::BadGateway {
                message: e.to_string(),
                retryable: false,
            },
        }
    }
}

/// Runs `f` with a pooled connection on the blocking thread pool.
pub async fn with_conn<T, F>(state: &Arc<AppState>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Connection) -> Result<T, ApiError> + Send + 'static,
{
    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;
        f(&conn)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))?
}
