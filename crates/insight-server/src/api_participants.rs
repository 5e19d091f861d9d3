//! Participant endpoints.

use crate::api::{with_conn, ApiError};
use crate::AppState;
use axum::extract::{Extension, Json, Path};
use insight_db::{create_participant, get_participant, list_interviews, InterviewRecord};
use insight_types::ParticipantProfile;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateParticipantResponse {
    pub participant_id: Uuid,
}

/// Handler for `POST /api/participants`.
pub async fn create_participant_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(profile): Json<ParticipantProfile>,
) -> Result<Json<CreateParticipantResponse>, ApiError> {
    profile.validate()?;

    let participant_id = with_conn(&state, move |conn| Ok(create_participant(conn, &profile)?)).await?;
    tracing::info!(%participant_id, "registered participant");

    Ok(Json(CreateParticipantResponse { participant_id }))
}

/// Handler for `GET /api/participants/{id}/interviews`, newest first.
pub async fn list_interviews_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<InterviewRecord>>, ApiError> {
    let records = with_conn(&state, move |conn| {
        // Distinguishes an unknown participant from one with no interviews.
        get_participant(conn, &id)?;
        Ok(list_interviews(conn, Some(&id))?)
    })
    .await?;
    Ok(Json(records))
}
