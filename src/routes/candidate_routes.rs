use axum::{
    extract::{Path, State},
    Json,
};

use crate::dto::triage_dto::{AcceptResponse, RejectResponse};
use crate::error::Result;
use crate::AppState;

pub async fn accept_candidate(
    State(state): State<AppState>,
    Path(candidate_id): Path<i64>,
) -> Result<Json<AcceptResponse>> {
    tracing::info!(candidate_id, "accepting candidate");
    let outcome = state.outreach_service.accept(candidate_id).await?;

    Ok(Json(AcceptResponse {
        status: if outcome.delivered {
            "success".to_string()
        } else {
            "failed".to_string()
        },
        pitch: outcome.pitch,
        delivery_message: outcome.delivery_message,
    }))
}

pub async fn reject_candidate(
    State(state): State<AppState>,
    Path(candidate_id): Path<i64>,
) -> Result<Json<RejectResponse>> {
    tracing::info!(candidate_id, "rejecting candidate");
    let next = state.triage_service.reject(candidate_id).await?;

    let message = if next.is_none() {
        Some("No more candidates available".to_string())
    } else {
        None
    };
    Ok(Json(RejectResponse {
        status: "success".to_string(),
        next_candidate: next,
        message,
    }))
}
