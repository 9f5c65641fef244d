use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{error_response, ApiState};
use crate::scheduler::job::{Algorithm, Job, JobSpec, JobStatus};

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub priority: i32,
    pub execution_time_ms: u64,
    pub remaining_time_ms: u64,
    pub algorithm: Algorithm,
    pub status: JobStatus,
    pub status_seq: u64,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<String>,
    pub error: Option<String>,
}

impl From<&Job> for JobResponse {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id,
            name: job.name.clone(),
            description: job.description.clone(),
            priority: job.priority,
            execution_time_ms: job.execution_time.as_millis() as u64,
            remaining_time_ms: job.remaining_time.as_millis() as u64,
            algorithm: job.algorithm,
            status: job.status,
            status_seq: job.status_seq,
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
            result: job.result.clone(),
            error: job.error.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<JobStatus>,
}

#[derive(Serialize)]
pub struct ClearFinishedResponse {
    pub removed: usize,
}

/// `POST /jobs` — validate, submit and return the created job.
pub async fn create_job(
    State(state): State<ApiState>,
    Json(spec): Json<JobSpec>,
) -> impl IntoResponse {
    let id = match state.engine.submit(spec).await {
        Ok(id) => id,
        Err(e) => return error_response(e).into_response(),
    };
    match state.engine.job(id).await {
        Ok(job) => (StatusCode::CREATED, Json(JobResponse::from(&job))).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// `GET /jobs` — all jobs in admission order, optionally filtered by status.
pub async fn list_jobs(
    State(state): State<ApiState>,
    Query(params): Query<ListParams>,
) -> Json<Vec<JobResponse>> {
    let jobs = match params.status {
        Some(status) => state.engine.jobs_with_status(status).await,
        None => state.engine.jobs().await,
    };
    Json(jobs.iter().map(JobResponse::from).collect())
}

/// `GET /jobs/:id`
pub async fn get_job(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.engine.job(id).await {
        Ok(job) => Json(JobResponse::from(&job)).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// `DELETE /jobs/:id` — refuse while the job is running.
pub async fn delete_job(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.engine.remove_job(id).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// `POST /jobs/:id/cancel` — cooperative cancellation.
pub async fn cancel_job(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(e) = state.engine.cancel(id).await {
        return error_response(e).into_response();
    }
    match state.engine.job(id).await {
        Ok(job) => Json(JobResponse::from(&job)).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// `POST /jobs/clear-finished` — drop terminal records.
pub async fn clear_finished(State(state): State<ApiState>) -> Json<ClearFinishedResponse> {
    let removed = state.engine.clear_finished().await;
    Json(ClearFinishedResponse { removed })
}
