use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::ApiState;
use crate::scheduler::job::Algorithm;

#[derive(Debug, Serialize, Deserialize)]
pub struct SchedulerStatusResponse {
    pub is_running: bool,
    pub current_algorithm: Algorithm,
    pub workers: usize,
    pub pending_jobs: usize,
    pub active_jobs: usize,
    pub completed_jobs: usize,
    pub failed_jobs: usize,
    pub cancelled_jobs: usize,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SwitchRequest {
    pub algorithm: Algorithm,
}

/// `GET /scheduler/status`
pub async fn status_handler(State(state): State<ApiState>) -> Json<SchedulerStatusResponse> {
    let status = state.engine.status().await;
    Json(SchedulerStatusResponse {
        is_running: status.running,
        current_algorithm: status.algorithm,
        workers: status.workers,
        pending_jobs: status.counts.pending,
        active_jobs: status.counts.running,
        completed_jobs: status.counts.completed,
        failed_jobs: status.counts.failed,
        cancelled_jobs: status.counts.cancelled,
    })
}

/// `POST /scheduler/start`
pub async fn start_handler(State(state): State<ApiState>) -> Json<MessageResponse> {
    state.engine.start().await;
    Json(MessageResponse {
        message: "Scheduler started".to_string(),
    })
}

/// `POST /scheduler/stop`
pub async fn stop_handler(State(state): State<ApiState>) -> Json<MessageResponse> {
    state.engine.stop().await;
    Json(MessageResponse {
        message: "Scheduler stopped".to_string(),
    })
}

/// `POST /scheduler/algorithm` — switch the active policy at runtime.
pub async fn switch_handler(
    State(state): State<ApiState>,
    Json(req): Json<SwitchRequest>,
) -> Json<MessageResponse> {
    state.engine.switch_algorithm(req.algorithm).await;
    Json(MessageResponse {
        message: format!("Scheduling policy set to {}", req.algorithm),
    })
}
