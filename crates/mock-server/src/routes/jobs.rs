//! `POST /generate` and `GET /status/{job_id}`.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::MockError;
use crate::flow;
use crate::state::MockState;

/// Request body accepted by `POST /generate`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, message = "script must not be empty"))]
    pub script: String,
    #[validate(length(min = 1, message = "style must not be empty"))]
    pub style: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
    job_id: String,
    status: String,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: String,
    progress: &'static str,
    video_url: Option<&'static str>,
    request: GenerateRequest,
}

async fn create_job(
    State(state): State<MockState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<SubmitResponse>, MockError> {
    request
        .validate()
        .map_err(|e| MockError::Validation(e.to_string()))?;

    let (job_id, job) = state.create_job(request).await;
    let (status, _, _) = flow::snapshot(job.step);
    tracing::info!(job_id = %job_id, human_id = job.human_id, "Mock job created");

    Ok(Json(SubmitResponse {
        job_id,
        status: status.to_string(),
    }))
}

async fn get_status(
    State(state): State<MockState>,
    Path(job_id): Path<String>,
) -> Result<Json<StatusResponse>, MockError> {
    let job = state
        .advance_job(&job_id)
        .await
        .ok_or(MockError::JobNotFound)?;
    let (status, progress, video_url) = flow::snapshot(job.step);
    tracing::debug!(job_id = %job_id, status = %status, "Mock job advanced");

    Ok(Json(StatusResponse {
        status: status.to_string(),
        progress,
        video_url,
        request: job.request,
    }))
}

pub fn router(state: MockState) -> Router {
    Router::new()
        .route("/generate", post(create_job))
        .route("/status/{job_id}", get(get_status))
        .with_state(state)
}
