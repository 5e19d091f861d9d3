//! Insight server library logic.
//!
//! Exposes the interview engine over HTTP: participants register a profile,
//! start an interview, answer by text or recorded audio, and fetch the final
//! report. Agent questions can be spoken back through `/api/speech`.

pub mod api;
pub mod api_interviews;
pub mod api_participants;
pub mod api_speech;
pub mod config;
pub mod sessions;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Extension, Json, Router,
};
use insight_db::DbPool;
use insight_interview::{Interviewer, SessionRegistry};
use insight_voice::{SpeechSynthesizer, SpeechToText, MAX_STT_INPUT_BYTES};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Interviews active in this process.
    pub registry: SessionRegistry,
    pub interviewer: Interviewer,
    pub stt: Arc<dyn SpeechToText>,
    pub tts: Arc<dyn SpeechSynthesizer>,
    /// Theme for interviews created without one.
    pub default_theme: String,
    /// Default language for transcription and synthesis.
    pub language: String,
    /// Allowed CORS origins. Empty allows any origin.
    pub cors_origins: Vec<String>,
}

const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Room for the audio payload plus multipart or framing overhead.
const MAX_AUDIO_BODY_BYTES: usize = MAX_STT_INPUT_BYTES + 64 * 1024;

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    if parsed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(parsed)
    }
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.cors_origins);

    let audio_routes = Router::new()
        .route(
            "/api/interviews/{id}/audio",
            post(api_interviews::post_audio_handler),
        )
        .layer(DefaultBodyLimit::max(MAX_AUDIO_BODY_BYTES));

    Router::new()
        .route("/health", get(health))
        .route(
            "/api/participants",
            post(api_participants::create_participant_handler),
        )
        .route(
            "/api/participants/{id}/interviews",
            get(api_participants::list_interviews_handler),
        )
        .route(
            "/api/interviews",
            post(api_interviews::create_interview_handler),
        )
        .route(
            "/api/interviews/{id}",
            get(api_interviews::get_interview_handler),
        )
        .route(
            "/api/interviews/{id}/turns",
            post(api_interviews::post_turn_handler),
        )
        .route(
            "/api/interviews/{id}/reply",
            post(api_interviews::post_reply_handler),
        )
        .route(
            "/api/interviews/{id}/report",
            get(api_interviews::get_report_handler),
        )
        .route("/api/speech", post(api_speech::synthesize_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .merge(audio_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
