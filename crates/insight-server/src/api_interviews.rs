//! Interview endpoints.

use crate::api::{with_conn, ApiError};
use crate::sessions::{evict_finished, load_session, persist_new, persist_progress, persist_report};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Extension, Json, Path, Query},
};
use insight_db::{get_participant, get_report};
use insight_interview::{InterviewError, InterviewSession, Phase, Reply, TurnOutcome};
use insight_types::{InterviewReport, Transcript};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInterviewRequest {
    pub theme: Option<String>,
    pub participant_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInterviewResponse {
    pub id: Uuid,
    pub theme: String,
    pub phase: Phase,
    pub phase_title: &'static str,
    pub introduction: String,
    /// Absent when the opening question could not be generated; call
    /// `POST /api/interviews/{id}/reply` to try again.
    pub question: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewSnapshot {
    pub id: Uuid,
    pub theme: String,
    pub phase: Phase,
    pub phase_title: &'static str,
    pub turn_count: u32,
    pub terminated: bool,
    pub awaiting_reply: bool,
    pub transcript: Transcript,
}

#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AudioQuery {
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplyBody {
    Question {
        text: String,
    },
    Summary {
        summary: String,
        closing: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        artifact: Option<String>,
        #[serde(rename = "exportError", skip_serializing_if = "Option::is_none")]
        export_error: Option<String>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    pub phase: Phase,
    pub phase_title: &'static str,
    pub phase_changed: bool,
    pub turn_count: u32,
    /// Set when the request carried audio.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_text: Option<String>,
    pub reply: ReplyBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    #[serde(flatten)]
    pub report: InterviewReport,
    pub artifact_path: Option<String>,
}

fn snapshot(session: &InterviewSession) -> InterviewSnapshot {
    InterviewSnapshot {
        id: session.id(),
        theme: session.theme().to_string(),
        phase: session.phase(),
        phase_title: session.phase().title(),
        turn_count: session.turn_count(),
        terminated: session.is_terminated(),
        awaiting_reply: session.awaits_reply(),
        transcript: session.transcript().clone(),
    }
}

/// Handler for `POST /api/interviews`.
pub async fn create_interview_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Option<Json<CreateInterviewRequest>>,
) -> Result<Json<CreateInterviewResponse>, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let theme = match request.theme.as_deref().map(str::trim) {
        Some("") => return Err(ApiError::BadRequest("theme must not be blank".to_string())),
        Some(theme) => theme.to_string(),
        None => state.default_theme.clone(),
    };

    let participant = match request.participant_id {
        Some(participant_id) => Some(
            with_conn(&state, move |conn| Ok(get_participant(conn, &participant_id)?.profile))
                .await?,
        ),
        None => None,
    };

    let session = InterviewSession::new(theme, participant);
    persist_new(&state, &session, request.participant_id).await;
    let handle = state.registry.insert(session);

    let mut session = handle.lock().await;
    let question = match state.interviewer.start(&mut session).await {
        Ok(question) => question,
        Err(e) => {
            tracing::warn!(session_id = %session.id(), error = %e, "opening question failed");
            None
        }
    };
    persist_progress(&state, &session).await;

    Ok(Json(CreateInterviewResponse {
        id: session.id(),
        theme: session.theme().to_string(),
        phase: session.phase(),
        phase_title: session.phase().title(),
        introduction: state.interviewer.introduction().to_string(),
        question,
    }))
}

/// Handler for `GET /api/interviews/{id}`.
pub async fn get_interview_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewSnapshot>, ApiError> {
    let handle = load_session(&state, id).await?;
    let session = handle.lock().await;
    Ok(Json(snapshot(&session)))
}

/// Handler for `POST /api/interviews/{id}/turns`.
pub async fn post_turn_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    take_turn(&state, id, &payload.text, None).await.map(Json)
}

/// Handler for `POST /api/interviews/{id}/audio`.
///
/// The body is the recorded answer. A failed transcription records nothing
/// and is reported as a retryable 422.
pub async fn post_audio_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<AudioQuery>,
    body: Bytes,
) -> Result<Json<TurnResponse>, ApiError> {
    // Refuse anything take_turn would refuse before spending time on STT.
    let handle = load_session(&state, id).await?;
    {
        let session = handle.lock().await;
        if session.is_terminated() || session.is_terminal() {
            return Err(InterviewError::SessionClosed.into());
        }
        if session.awaits_reply() {
            return Err(InterviewError::ReplyPending.into());
        }
    }

    let language = query.language.unwrap_or_else(|| state.language.clone());
    let text = state
        .stt
        .transcribe(&body, &language)
        .await
        .map_err(|e| {
            tracing::warn!(session_id = %id, error = %e, "transcription failed");
            ApiError::TranscriptionFailed(e.to_string())
        })?;

    take_turn(&state, id, &text, Some(text.clone())).await.map(Json)
}

/// Handler for `POST /api/interviews/{id}/reply`.
///
/// Retries generation for a user turn whose reply failed, or the opening
/// question of an interview that has none yet.
pub async fn post_reply_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TurnResponse>, ApiError> {
    let handle = load_session(&state, id).await?;
    let mut session = handle.lock().await;

    if session.transcript().is_empty() {
        let question = state
            .interviewer
            .start(&mut session)
            .await?
            .ok_or_else(|| ApiError::Conflict("interview already started".to_string()))?;
        persist_progress(&state, &session).await;
        return Ok(Json(TurnResponse {
            phase: session.phase(),
            phase_title: session.phase().title(),
            phase_changed: false,
            turn_count: session.turn_count(),
            transcript_text: None,
            reply: ReplyBody::Question { text: question },
        }));
    }

    let phase = session.phase();
    let outcome = TurnOutcome {
        previous_phase: phase,
        phase,
        turn_count: session.turn_count(),
    };
    respond(&state, &mut session, outcome, None).await.map(Json)
}

/// Handler for `GET /api/interviews/{id}/report`.
pub async fn get_report_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReportResponse>, ApiError> {
    let stored = with_conn(&state, move |conn| Ok(get_report(conn, &id)?)).await?;
    Ok(Json(ReportResponse {
        report: stored.report,
        artifact_path: stored.artifact_path,
    }))
}

async fn take_turn(
    state: &Arc<AppState>,
    id: Uuid,
    text: &str,
    transcript_text: Option<String>,
) -> Result<TurnResponse, ApiError> {
    let handle = load_session(state, id).await?;
    let mut session = handle.lock().await;

    let outcome = session.record_user_turn(text)?;
    if outcome.phase_changed() {
        tracing::info!(
            session_id = %id,
            from = %outcome.previous_phase,
            to = %outcome.phase,
            "interview phase changed"
        );
    }
    // The user turn is durable before the model is called.
    persist_progress(state, &session).await;

    respond(state, &mut session, outcome, transcript_text).await
}

async fn respond(
    state: &Arc<AppState>,
    session: &mut InterviewSession,
    outcome: TurnOutcome,
    transcript_text: Option<String>,
) -> Result<TurnResponse, ApiError> {
    let reply = state.interviewer.respond(session).await.map_err(|e| {
        tracing::warn!(session_id = %session.id(), error = %e, "reply generation failed");
        ApiError::from(e)
    })?;
    let progress_stored = persist_progress(state, session).await;

    let reply = match reply {
        Reply::Question { text, .. } => ReplyBody::Question { text },
        Reply::Completed(completion) => {
            let artifact = completion
                .artifact
                .map(|a| a.path.display().to_string());
            let report_stored = persist_report(state, &completion.report, artifact.clone()).await;
            // Keep the session in memory if the database cannot stand in for it.
            if progress_stored && report_stored {
                evict_finished(state, session.id());
            }
            ReplyBody::Summary {
                summary: completion.report.summary_text,
                closing: completion.closing,
                artifact,
                export_error: completion.export_error,
            }
        }
    };

    Ok(TurnResponse {
        phase: outcome.phase,
        phase_title: outcome.phase.title(),
        phase_changed: outcome.phase_changed(),
        turn_count: outcome.turn_count,
        transcript_text,
        reply,
    })
}
