//! API module for HTTP handlers.
//!
//! This module contains route definitions and request/response handlers.

pub mod ai;
pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod todos;

use axum::Router;
use axum::routing::{get, patch, post, put};

pub use ai::{clear_suggestions, generate_suggestions, list_suggestions, prioritize_todos};
pub use auth::{AuthenticatedOwner, OWNER_ID_HEADER};
pub use dto::{
    DeletedResponse, ListTodosQuery, SuggestionResponse, TodoRequest, TodoResponse, ValidatedTodo,
};
pub use error::{ApiError, ApiErrorResponse, FieldError, ValidationError};
pub use handlers::{AppState, HealthResponse, health_check};
pub use todos::{complete_todo, create_todo, delete_todo, list_todos, toggle_todo, update_todo};

/// Builds the application router.
///
/// Cross-cutting layers (tracing, CORS) are added by the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/health", get(health_check))
        .route("/actuator/health", get(health_check))
        .route("/api/todos", get(list_todos).post(create_todo))
        .route("/api/todos/{id}", put(update_todo).delete(delete_todo))
        .route("/api/todos/{id}/complete", patch(complete_todo))
        .route("/api/todos/{id}/toggle", patch(toggle_todo))
        .route("/api/ai/prioritize", post(prioritize_todos))
        .route("/api/ai/suggest", post(generate_suggestions))
        .route(
            "/api/ai/suggestions",
            get(list_suggestions).delete(clear_suggestions),
        )
        .with_state(state)
}
