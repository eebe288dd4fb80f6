//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use progression_api::state::AppState;
use progression_coordinator::dispatch::CommandDispatcher;
use progression_coordinator::retry::RetryPolicy;
use progression_event_store::memory_event_repository::InMemoryEventRepository;
use progression_test_support::{FixedClock, SequentialIdGenerator};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

/// Build the full app router over an in-memory store with a fixed clock and
/// sequential ids. Uses the same route structure as `main.rs`.
pub fn build_test_app() -> Router {
    let dispatcher = CommandDispatcher::new(
        Arc::new(InMemoryEventRepository::new()),
        Arc::new(FixedClock::default()),
        Arc::new(SequentialIdGenerator::default()),
    )
    .with_retry_policy(RetryPolicy::new(3, Duration::ZERO));
    progression_api::app(AppState::new(dispatcher))
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: &Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, json)
}

/// Submit a command to `POST /api/v1/commands`.
pub async fn submit(app: &Router, command: &serde_json::Value) -> (StatusCode, serde_json::Value) {
    post_json(app, "/api/v1/commands", command).await
}

pub fn add_case_to_group(group_id: Uuid, case_id: Uuid) -> serde_json::Value {
    json!({
        "command_type": "group.add_case_to_group",
        "correlation_id": Uuid::new_v4(),
        "group_id": group_id,
        "case_id": case_id,
        "urn": format!("URN-{case_id}"),
        "defendant_ids": [Uuid::new_v4()],
    })
}

pub fn remove_case_from_group(group_id: Uuid, case_id: Uuid) -> serde_json::Value {
    json!({
        "command_type": "group.remove_case_from_group",
        "correlation_id": Uuid::new_v4(),
        "group_id": group_id,
        "case_id": case_id,
    })
}

pub fn add_civil_fee(case_id: Uuid, fee_id: Uuid) -> serde_json::Value {
    json!({
        "command_type": "fee.add_civil_fee",
        "correlation_id": Uuid::new_v4(),
        "fee_id": fee_id,
        "case_id": case_id,
        "fee_type": "initial_fee",
        "amount": 30800,
    })
}

pub fn event_types(response: &serde_json::Value) -> Vec<String> {
    response["events"]
        .as_array()
        .map(|events| {
            events
                .iter()
                .filter_map(|e| e["event_type"].as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}
