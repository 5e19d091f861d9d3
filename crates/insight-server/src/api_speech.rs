//! Speech synthesis endpoint.

use crate::api::ApiError;
use crate::AppState;
use axum::{
    extract::{Extension, Json},
    http::header,
    response::{IntoResponse, Response},
};
use insight_voice::MAX_TTS_INPUT_BYTES;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    /// Defaults to the server's interview language.
    pub language: Option<String>,
}

/// Handler for `POST /api/speech`.
///
/// Returns the raw audio with a `Content-Type` naming its encoding.
pub async fn synthesize_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<SpeechRequest>,
) -> Result<Response, ApiError> {
    let language = payload
        .language
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| state.language.clone());

    let text = payload.text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".to_string()));
    }
    if text.len() > MAX_TTS_INPUT_BYTES {
        return Err(ApiError::BadRequest(format!(
            "text exceeds {} bytes",
            MAX_TTS_INPUT_BYTES
        )));
    }

    let audio = state.tts.synthesize(text, &language).await?;

    Ok((
        [(header::CONTENT_TYPE, audio.encoding.content_type())],
        audio.bytes,
    )
        .into_response())
}
