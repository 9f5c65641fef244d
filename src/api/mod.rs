//! HTTP request/response layer.
//!
//! A thin adapter around [`SchedulerEngine`](crate::scheduler::SchedulerEngine):
//! every handler translates one request into one engine operation and maps
//! the result onto a status code. No scheduling logic lives here.

pub mod jobs;
pub mod scheduler;

use std::net::SocketAddr;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

use crate::error::SchedulerError;
use crate::scheduler::SchedulerEngine;

#[derive(Clone)]
pub struct ApiState {
    pub engine: SchedulerEngine,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Build the API router.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/jobs", post(jobs::create_job).get(jobs::list_jobs))
        .route("/jobs/clear-finished", post(jobs::clear_finished))
        .route("/jobs/:id", get(jobs::get_job).delete(jobs::delete_job))
        .route("/jobs/:id/cancel", post(jobs::cancel_job))
        .route("/scheduler/status", get(scheduler::status_handler))
        .route("/scheduler/start", post(scheduler::start_handler))
        .route("/scheduler/stop", post(scheduler::stop_handler))
        .route("/scheduler/algorithm", post(scheduler::switch_handler))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve the API until the shutdown token fires or the listener
/// fails.
pub async fn serve(
    addr: SocketAddr,
    state: ApiState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let app = router(state);

    tracing::info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

/// Map an engine error onto an HTTP status code.
pub(crate) fn error_response(err: SchedulerError) -> (StatusCode, Json<ErrorBody>) {
    let code = match &err {
        SchedulerError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SchedulerError::NotFound(_) => StatusCode::NOT_FOUND,
        SchedulerError::AlreadyTerminal { .. }
        | SchedulerError::InvalidTransition { .. }
        | SchedulerError::JobRunning(_) => StatusCode::CONFLICT,
        SchedulerError::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
        SchedulerError::ExecutionFailure(_)
        | SchedulerError::PersistenceWrite(_)
        | SchedulerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        code,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}
