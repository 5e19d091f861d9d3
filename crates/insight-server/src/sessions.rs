//! Bridges the in-memory session registry and the database.
//!
//! The registry is the source of truth while the process runs. The database
//! is written after every step so a restarted server can pick an interview
//! up again; those writes are best-effort and only ever logged on failure.

use crate::api::{with_conn, ApiError};
use crate::AppState;
use insight_db::{
    create_interview, get_participant, load_interview, save_report, sync_transcript,
    update_progress,
};
use insight_interview::{InterviewSession, SharedSession};
use insight_types::{InterviewReport, Transcript};
use std::sync::Arc;
use uuid::Uuid;

/// Returns the active session, restoring it from the database if this
/// process has not seen it yet.
pub async fn load_session(state: &Arc<AppState>, id: Uuid) -> Result<SharedSession, ApiError> {
    if let Some(session) = state.registry.get(&id) {
        return Ok(session);
    }

    let session = with_conn(state, move |conn| {
        let stored = load_interview(conn, &id)?;
        let participant = match stored.record.participant_id {
            Some(participant_id) => Some(get_participant(conn, &participant_id)?.profile),
            None => None,
        };
        Ok(InterviewSession::restore(
            stored.record.id,
            stored.record.theme,
            participant,
            stored.transcript,
            stored.record.terminated,
            stored.record.created_at,
        ))
    })
    .await?;

    tracing::info!(
        session_id = %id,
        turn_count = session.turn_count(),
        phase = %session.phase(),
        "restored interview from database"
    );
    Ok(state.registry.insert(session))
}

/// Stores a newly created interview row.
pub async fn persist_new(state: &Arc<AppState>, session: &InterviewSession, participant_id: Option<Uuid>) {
    let id = session.id();
    let theme = session.theme().to_string();
    let created_at = session.created_at();
    let result = with_conn(state, move |conn| {
        create_interview(conn, &id, participant_id.as_ref(), &theme, created_at)?;
        Ok(())
    })
    .await;
    if let Err(e) = result {
        tracing::warn!(session_id = %id, error = %e, "failed to persist new interview");
    }
}

/// Writes turns not yet stored plus the current counter and flag. Returns
/// whether the write went through.
pub async fn persist_progress(state: &Arc<AppState>, session: &InterviewSession) -> bool {
    let id = session.id();
    let transcript: Transcript = session.transcript().clone();
    let turn_count = session.turn_count();
    let terminated = session.is_terminated();
    let result = with_conn(state, move |conn| {
        let added = sync_transcript(conn, &id, &transcript)?;
        update_progress(conn, &id, turn_count, terminated)?;
        Ok(added)
    })
    .await;
    match result {
        Ok(added) => {
            tracing::debug!(session_id = %id, added, "persisted interview progress");
            true
        }
        Err(e) => {
            tracing::warn!(session_id = %id, error = %e, "failed to persist interview progress");
            false
        }
    }
}

pub async fn persist_report(
    state: &Arc<AppState>,
    report: &InterviewReport,
    artifact_path: Option<String>,
) -> bool {
    let id = report.session_id;
    let report = report.clone();
    let result = with_conn(state, move |conn| {
        save_report(conn, &report, artifact_path.as_deref())?;
        Ok(())
    })
    .await;
    if let Err(e) = &result {
        tracing::warn!(session_id = %id, error = %e, "failed to persist interview report");
    }
    result.is_ok()
}

/// Drops a finished interview from memory once its final state is stored.
/// Later requests restore it from the database and see it closed.
pub fn evict_finished(state: &AppState, id: Uuid) {
    if state.registry.remove(&id).is_some() {
        tracing::debug!(session_id = %id, active = state.registry.len(), "evicted finished interview");
    }
}
