//! AI-assisted endpoints.
//!
//! Completion problems never surface as HTTP errors here; the engines fall
//! back instead. Only store failures produce an error response.

use axum::{Json, extract::State};

use super::auth::AuthenticatedOwner;
use super::dto::{DeletedResponse, SuggestionResponse, TodoResponse};
use super::error::ApiErrorResponse;
use super::handlers::AppState;

/// `POST /api/ai/prioritize`: the caller's todos, most important first.
///
/// # Errors
///
/// Returns 500 if the task store fails.
pub async fn prioritize_todos(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
) -> Result<Json<Vec<TodoResponse>>, ApiErrorResponse> {
    let tasks = state.task_repository.list_by_owner(&owner).await?;
    let prioritized = state.prioritization_engine.prioritize(tasks).await;

    Ok(Json(prioritized.iter().map(TodoResponse::from).collect()))
}

/// `POST /api/ai/suggest`: generates, stores and returns new suggestions.
///
/// # Errors
///
/// Returns 500 if the task store fails.
pub async fn generate_suggestions(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
) -> Result<Json<Vec<SuggestionResponse>>, ApiErrorResponse> {
    let tasks = state.task_repository.list_by_owner(&owner).await?;
    let suggestions = state
        .suggestion_engine
        .generate_suggestions(&owner, &tasks)
        .await;

    Ok(Json(
        suggestions.iter().map(SuggestionResponse::from).collect(),
    ))
}

/// `GET /api/ai/suggestions`: stored suggestions, newest first.
///
/// # Errors
///
/// Returns 500 if the suggestion store fails.
pub async fn list_suggestions(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
) -> Result<Json<Vec<SuggestionResponse>>, ApiErrorResponse> {
    let suggestions = state.suggestion_engine.user_suggestions(&owner).await?;

    Ok(Json(
        suggestions.iter().map(SuggestionResponse::from).collect(),
    ))
}

/// `DELETE /api/ai/suggestions`: removes every stored suggestion.
///
/// # Errors
///
/// Returns 500 if the suggestion store fails.
pub async fn clear_suggestions(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
) -> Result<Json<DeletedResponse>, ApiErrorResponse> {
    let deleted = state.suggestion_engine.clear_suggestions(&owner).await?;

    Ok(Json(DeletedResponse { deleted }))
}
