//! Common test helpers for integration tests.
//!
//! This module provides shared utilities for creating `AppState` instances,
//! owner-scoped requests and seeded tasks.
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::{create_test_app_state, send};
//! ```
//!
//! # Note
//!
//! The `#![allow(dead_code)]` attribute is necessary because Rust compiles each
//! integration test file as a separate crate. Helpers used only by one test
//! file would otherwise generate dead code warnings in the others.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use todo_ai_api::api::{AppState, router};
use todo_ai_api::domain::{NewTask, OwnerId, Priority, Task};
use todo_ai_api::infrastructure::{
    CompletionClient, CompletionConfig, Repositories, StubCompletionClient,
};

// =============================================================================
// AppState Creation Helpers
// =============================================================================

/// Creates a test `AppState` with in-memory stores and no completion client.
pub fn create_test_app_state() -> AppState {
    AppState::from_repositories(Repositories::in_memory(), &CompletionConfig::default())
}

/// Creates a test `AppState` whose engines call `client`.
pub fn create_test_app_state_with_client(client: Arc<StubCompletionClient>) -> AppState {
    AppState::with_completion_client(
        Repositories::in_memory(),
        Some(client as Arc<dyn CompletionClient>),
        &CompletionConfig::default(),
    )
}

/// Builds the full router over `state`.
pub fn create_test_router(state: AppState) -> Router {
    router(state)
}

// =============================================================================
// Request Helpers
// =============================================================================

/// Builds a request carrying `X-Owner-Id` for `owner`.
pub fn owner_request(
    method: Method,
    uri: &str,
    owner: Option<&OwnerId>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(owner) = owner {
        builder = builder.header("X-Owner-Id", owner.to_string());
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Sends `request` through `app` and decodes the JSON body.
///
/// Empty bodies decode as `Value::Null`.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

// =============================================================================
// Task Helpers
// =============================================================================

/// Inserts a task directly through the task store.
pub async fn create_and_save_task(
    state: &AppState,
    owner: OwnerId,
    title: &str,
    priority: Priority,
) -> Task {
    state
        .task_repository
        .insert(NewTask::new(owner, title).with_priority(priority))
        .await
        .unwrap()
}

/// Extracts the `title` field of every element of a JSON array.
pub fn titles(json: &Value) -> Vec<String> {
    json.as_array()
        .unwrap()
        .iter()
        .map(|item| item["title"].as_str().unwrap().to_string())
        .collect()
}
