use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use taskmill::api::{router, ApiState};
use taskmill::config::EngineConfig;
use taskmill::scheduler::job::Algorithm;
use taskmill::scheduler::SchedulerEngine;
use taskmill::store::MemoryStore;

/// App around a stopped engine: submissions stay `Pending`, so responses are
/// deterministic without a dispatcher.
fn test_app() -> Router {
    let config = EngineConfig::default().stopped();
    let engine = SchedulerEngine::new(config, Arc::new(MemoryStore::new()));
    router(ApiState { engine })
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn job_payload(name: &str) -> Value {
    json!({
        "name": name,
        "priority": 1,
        "execution_time_ms": 100,
        "algorithm": "fifo",
    })
}

async fn create_job(app: &Router, name: &str) -> Value {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/jobs", job_payload(name)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = test_app();
    let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn create_job_returns_the_record() {
    let app = test_app();
    let body = create_job(&app, "hello").await;

    assert_eq!(body["name"], "hello");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["execution_time_ms"], 100);
    assert_eq!(body["remaining_time_ms"], 100);
    assert_eq!(body["algorithm"], "fifo");
    assert!(body["id"].as_str().is_some());
}

#[tokio::test]
async fn create_job_rejects_zero_execution_time() {
    let app = test_app();
    let payload = json!({
        "name": "no-work",
        "execution_time_ms": 0,
        "algorithm": "fifo",
    });
    let response = app
        .oneshot(json_request("POST", "/jobs", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("execution_time must be positive"));
}

#[tokio::test]
async fn create_job_rejects_unknown_algorithm() {
    let app = test_app();
    let payload = json!({
        "name": "mystery",
        "execution_time_ms": 100,
        "algorithm": "lifo",
    });
    let response = app
        .oneshot(json_request("POST", "/jobs", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_job_unknown_id_is_404() {
    let app = test_app();
    let response = app
        .oneshot(empty_request(
            "GET",
            "/jobs/00000000-0000-0000-0000-000000000000",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_jobs_filters_by_status() {
    let app = test_app();
    create_job(&app, "keeps-pending").await;
    let cancelled = create_job(&app, "cancelled").await;
    let id = cancelled["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(empty_request("POST", &format!("/jobs/{}/cancel", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/jobs?status=pending"))
        .await
        .unwrap();
    let body = body_json(response).await;
    let jobs = body.as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["name"], "keeps-pending");

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/jobs"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn cancel_twice_returns_conflict() {
    let app = test_app();
    let created = create_job(&app, "doomed").await;
    let id = created["id"].as_str().unwrap();
    let uri = format!("/jobs/{}/cancel", id);

    let response = app
        .clone()
        .oneshot(empty_request("POST", &uri))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "cancelled");

    let response = app
        .clone()
        .oneshot(empty_request("POST", &uri))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn delete_job_removes_the_record() {
    let app = test_app();
    let created = create_job(&app, "short-lived").await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", &format!("/jobs/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(empty_request("GET", &format!("/jobs/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn clear_finished_reports_removed_count() {
    let app = test_app();
    let kept = create_job(&app, "kept").await;
    let finished = create_job(&app, "finished").await;
    let id = finished["id"].as_str().unwrap();

    app.clone()
        .oneshot(empty_request("POST", &format!("/jobs/{}/cancel", id)))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(empty_request("POST", "/jobs/clear-finished"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["removed"], 1);

    let response = app
        .clone()
        .oneshot(empty_request(
            "GET",
            &format!("/jobs/{}", kept["id"].as_str().unwrap()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn scheduler_status_reflects_the_engine() {
    let app = test_app();
    create_job(&app, "queued").await;

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/scheduler/status"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["is_running"], false);
    assert_eq!(body["current_algorithm"], "fifo");
    assert_eq!(body["pending_jobs"], 1);
    assert_eq!(body["active_jobs"], 0);
}

#[tokio::test]
async fn start_and_stop_toggle_the_scheduler() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(empty_request("POST", "/scheduler/start"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let status = body_json(
        app.clone()
            .oneshot(empty_request("GET", "/scheduler/status"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status["is_running"], true);

    app.clone()
        .oneshot(empty_request("POST", "/scheduler/stop"))
        .await
        .unwrap();

    let status = body_json(
        app.clone()
            .oneshot(empty_request("GET", "/scheduler/status"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status["is_running"], false);
}

#[tokio::test]
async fn switch_algorithm_updates_the_active_policy() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/scheduler/algorithm",
            json!({ "algorithm": Algorithm::Sjf }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let status = body_json(
        app.clone()
            .oneshot(empty_request("GET", "/scheduler/status"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status["current_algorithm"], "sjf");
}
