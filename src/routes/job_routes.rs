use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::dto::job_dto::{CreateJobPayload, JobCreatedResponse, SourcingResponse};
use crate::dto::triage_dto::NextCandidateResponse;
use crate::error::Result;
use crate::AppState;

/// Creates the job and fires the sourcing pipeline without awaiting it; the
/// caller gets an acknowledgement while candidates generate in the background.
pub async fn create_job(
    State(state): State<AppState>,
    Json(payload): Json<CreateJobPayload>,
) -> Result<(StatusCode, Json<JobCreatedResponse>)> {
    payload.validate()?;

    let job = state.job_service.create_job(payload).await?;

    spawn_pipeline(&state, job.id, state.initial_batch_size);

    Ok((
        StatusCode::CREATED,
        Json(JobCreatedResponse {
            job_id: job.id,
            status: "processing".to_string(),
            message: "Job created. Generating candidates...".to_string(),
        }),
    ))
}

pub async fn source_more(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
) -> Result<Json<SourcingResponse>> {
    state
        .job_service
        .get_job(job_id)
        .await?
        .ok_or_else(|| crate::error::Error::NotFound("Job not found".to_string()))?;

    spawn_pipeline(&state, job_id, state.source_more_batch_size);

    Ok(Json(SourcingResponse {
        status: "sourcing".to_string(),
        message: "Generating new candidates...".to_string(),
    }))
}

pub async fn next_candidate(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
) -> Result<Json<NextCandidateResponse>> {
    let Some(served) = state.triage_service.next(job_id).await? else {
        return Ok(Json(NextCandidateResponse {
            candidate: None,
            match_record: None,
            stats: None,
            message: Some("No more candidates available".to_string()),
        }));
    };

    let stats = state.triage_service.stats(job_id).await?;

    Ok(Json(NextCandidateResponse {
        candidate: Some(served.candidate),
        match_record: Some(served.match_record),
        stats: Some(stats),
        message: None,
    }))
}

pub async fn job_stats(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
) -> Result<Json<crate::dto::job_dto::StatsResponse>> {
    let stats = state.triage_service.stats(job_id).await?;
    Ok(Json(stats))
}

fn spawn_pipeline(state: &AppState, job_id: i64, batch_size: u32) {
    let pipeline = state.pipeline_service.clone();
    tokio::spawn(async move {
        if let Err(e) = pipeline.run(job_id, batch_size).await {
            tracing::error!(job_id, error = ?e, "pipeline run failed");
        }
    });
}
