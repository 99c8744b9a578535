//! Todo CRUD handlers.
//!
//! Every handler is scoped to the `AuthenticatedOwner`. A task that does not
//! exist and a task owned by someone else are indistinguishable: both yield
//! 404 with the same message.
//!
//! # Endpoints
//!
//! - `GET /api/todos` - List todos, optionally filtered and sorted
//! - `POST /api/todos` - Create a todo
//! - `PUT /api/todos/{id}` - Replace the editable fields of a todo
//! - `PATCH /api/todos/{id}/complete` - Mark a todo completed
//! - `PATCH /api/todos/{id}/toggle` - Flip the completion flag
//! - `DELETE /api/todos/{id}` - Delete a todo

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::auth::AuthenticatedOwner;
use super::dto::{ListTodosQuery, TodoRequest, TodoResponse, validate_todo_request};
use super::error::ApiErrorResponse;
use super::handlers::AppState;
use crate::domain::{OwnerId, Task, TaskId, sort_by_rank_then_due};

// =============================================================================
// Path Extractors
// =============================================================================

/// Path parameter for todo ID.
#[derive(Debug, serde::Deserialize)]
pub struct TodoPath {
    /// The todo ID.
    pub id: Uuid,
}

// =============================================================================
// GET /api/todos
// =============================================================================

/// Lists the caller's todos, newest first.
///
/// # Query Parameters
///
/// - `completed`: only todos with this completion flag
/// - `sort=priority`: rank, then due date (missing last), then newest
///
/// # Errors
///
/// Returns 500 if the store fails.
pub async fn list_todos(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    Query(query): Query<ListTodosQuery>,
) -> Result<Json<Vec<TodoResponse>>, ApiErrorResponse> {
    let tasks = match query.completed {
        Some(completed) => {
            state
                .task_repository
                .list_by_owner_and_completion(&owner, completed)
                .await?
        }
        None => state.task_repository.list_by_owner(&owner).await?,
    };

    let tasks = if query.sort_by_priority() {
        sort_by_rank_then_due(tasks)
    } else {
        tasks
    };

    tracing::debug!(owner_id = %owner, count = tasks.len(), "Listed todos");
    Ok(Json(tasks.iter().map(TodoResponse::from).collect()))
}

// =============================================================================
// POST /api/todos
// =============================================================================

/// Creates a todo.
///
/// # Request Body
///
/// ```json
/// {
///   "title": "Write report",
///   "description": "Optional description",
///   "priority": "LOW|MEDIUM|HIGH|URGENT",
///   "due_date": "2026-01-15T09:00:00Z"
/// }
/// ```
///
/// # Response
///
/// - **201 Created**: Todo created
/// - **400 Bad Request**: Validation error
///
/// # Errors
///
/// Returns 400 on validation failure and 500 if the store fails.
pub async fn create_todo(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    Json(request): Json<TodoRequest>,
) -> Result<(StatusCode, Json<TodoResponse>), ApiErrorResponse> {
    let validated = validate_todo_request(&request)?;

    let task = state
        .task_repository
        .insert(validated.into_new_task(owner))
        .await?;

    tracing::info!(owner_id = %owner, task_id = %task.task_id, "Created todo");
    Ok((StatusCode::CREATED, Json(TodoResponse::from(&task))))
}

// =============================================================================
// PUT /api/todos/{id}
// =============================================================================

/// Replaces title, description, priority and due date of a todo.
///
/// Fields omitted from the body are cleared (priority falls back to MEDIUM).
///
/// # Errors
///
/// Returns 400 on validation failure, 404 if the todo is missing or not
/// owned by the caller, and 500 if the store fails.
pub async fn update_todo(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    Path(path): Path<TodoPath>,
    Json(request): Json<TodoRequest>,
) -> Result<Json<TodoResponse>, ApiErrorResponse> {
    let validated = validate_todo_request(&request)?;
    let task_id = TaskId::from_uuid(path.id);

    let existing = find_owned_task(&state, &task_id, &owner).await?;
    let updated = state
        .task_repository
        .update(&existing.apply(validated.into_changes()))
        .await?;

    tracing::info!(owner_id = %owner, %task_id, "Updated todo");
    Ok(Json(TodoResponse::from(&updated)))
}

// =============================================================================
// PATCH /api/todos/{id}/complete and /toggle
// =============================================================================

/// Marks a todo completed. Completing an already completed todo is a no-op.
///
/// # Errors
///
/// Returns 404 if the todo is missing or not owned by the caller.
pub async fn complete_todo(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    Path(path): Path<TodoPath>,
) -> Result<Json<TodoResponse>, ApiErrorResponse> {
    let task_id = TaskId::from_uuid(path.id);

    let existing = find_owned_task(&state, &task_id, &owner).await?;
    let updated = state.task_repository.update(&existing.complete()).await?;

    tracing::info!(owner_id = %owner, %task_id, "Completed todo");
    Ok(Json(TodoResponse::from(&updated)))
}

/// Flips the completion flag of a todo.
///
/// # Errors
///
/// Returns 404 if the todo is missing or not owned by the caller.
pub async fn toggle_todo(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    Path(path): Path<TodoPath>,
) -> Result<Json<TodoResponse>, ApiErrorResponse> {
    let task_id = TaskId::from_uuid(path.id);

    let existing = find_owned_task(&state, &task_id, &owner).await?;
    let updated = state.task_repository.update(&existing.toggle()).await?;

    tracing::info!(
        owner_id = %owner,
        %task_id,
        completed = updated.completed,
        "Toggled todo"
    );
    Ok(Json(TodoResponse::from(&updated)))
}

// =============================================================================
// DELETE /api/todos/{id}
// =============================================================================

/// Deletes a todo.
///
/// # Response
///
/// - **204 No Content**: Todo deleted
/// - **404 Not Found**: Todo missing or not owned by the caller
///
/// # Errors
///
/// Returns 404 if nothing was deleted and 500 if the store fails.
pub async fn delete_todo(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    Path(path): Path<TodoPath>,
) -> Result<StatusCode, ApiErrorResponse> {
    let task_id = TaskId::from_uuid(path.id);

    if state.task_repository.delete(&task_id, &owner).await? {
        tracing::info!(owner_id = %owner, %task_id, "Deleted todo");
        Ok(StatusCode::NO_CONTENT)
    } else {
        tracing::debug!(owner_id = %owner, %task_id, "Delete target not found");
        Err(ApiErrorResponse::todo_not_found())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

async fn find_owned_task(
    state: &AppState,
    task_id: &TaskId,
    owner: &OwnerId,
) -> Result<Task, ApiErrorResponse> {
    state
        .task_repository
        .find_by_id_and_owner(task_id, owner)
        .await?
        .ok_or_else(|| {
            tracing::debug!(owner_id = %owner, %task_id, "Todo not found for owner");
            ApiErrorResponse::todo_not_found()
        })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Priority;
    use crate::infrastructure::{CompletionConfig, Repositories};
    use rstest::{fixture, rstest};

    #[fixture]
    fn state() -> AppState {
        AppState::from_repositories(Repositories::in_memory(), &CompletionConfig::default())
    }

    fn request(title: &str, priority: Option<&str>) -> TodoRequest {
        TodoRequest {
            title: title.to_string(),
            description: None,
            priority: priority.map(str::to_string),
            due_date: None,
        }
    }

    async fn create(state: &AppState, owner: OwnerId, title: &str) -> TodoResponse {
        let (_, Json(response)) = create_todo(
            State(state.clone()),
            AuthenticatedOwner(owner),
            Json(request(title, None)),
        )
        .await
        .unwrap();
        response
    }

    fn todo_path(response: &TodoResponse) -> Path<TodoPath> {
        Path(TodoPath {
            id: Uuid::parse_str(&response.id).unwrap(),
        })
    }

    // -------------------------------------------------------------------------
    // Create
    // -------------------------------------------------------------------------

    #[rstest]
    #[tokio::test]
    async fn test_create_todo_defaults_priority(state: AppState) {
        let (status, Json(response)) = create_todo(
            State(state),
            AuthenticatedOwner(OwnerId::generate()),
            Json(request("  Buy milk ", None)),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(response.title, "Buy milk");
        assert_eq!(response.priority, Priority::Medium);
        assert!(!response.completed);
    }

    #[rstest]
    #[tokio::test]
    async fn test_create_todo_rejects_blank_title(state: AppState) {
        let error = create_todo(
            State(state),
            AuthenticatedOwner(OwnerId::generate()),
            Json(request("   ", None)),
        )
        .await
        .unwrap_err();

        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.error.code, "VALIDATION_ERROR");
    }

    // -------------------------------------------------------------------------
    // List
    // -------------------------------------------------------------------------

    #[rstest]
    #[tokio::test]
    async fn test_list_todos_filters_and_sorts(state: AppState) {
        let owner = OwnerId::generate();
        for (title, priority) in [("low", "LOW"), ("urgent", "URGENT"), ("high", "HIGH")] {
            let (status, _) = create_todo(
                State(state.clone()),
                AuthenticatedOwner(owner),
                Json(request(title, Some(priority))),
            )
            .await
            .unwrap();
            assert_eq!(status, StatusCode::CREATED);
        }
        let high = state.task_repository.list_by_owner(&owner).await.unwrap()[0].clone();
        state.task_repository.update(&high.complete()).await.unwrap();

        let Json(sorted) = list_todos(
            State(state.clone()),
            AuthenticatedOwner(owner),
            Query(ListTodosQuery {
                completed: None,
                sort: Some("priority".to_string()),
            }),
        )
        .await
        .unwrap();
        let Json(open) = list_todos(
            State(state),
            AuthenticatedOwner(owner),
            Query(ListTodosQuery {
                completed: Some(false),
                sort: None,
            }),
        )
        .await
        .unwrap();

        let sorted: Vec<&str> = sorted.iter().map(|todo| todo.title.as_str()).collect();
        let open: Vec<&str> = open.iter().map(|todo| todo.title.as_str()).collect();
        assert_eq!(sorted, vec!["urgent", "high", "low"]);
        assert_eq!(open, vec!["urgent", "low"]);
    }

    // -------------------------------------------------------------------------
    // Update / Complete / Toggle
    // -------------------------------------------------------------------------

    #[rstest]
    #[tokio::test]
    async fn test_update_todo_replaces_fields(state: AppState) {
        let owner = OwnerId::generate();
        let created = create(&state, owner, "Draft").await;

        let Json(updated) = update_todo(
            State(state),
            AuthenticatedOwner(owner),
            todo_path(&created),
            Json(TodoRequest {
                title: "Final".to_string(),
                description: Some("Polished".to_string()),
                priority: Some("high".to_string()),
                due_date: None,
            }),
        )
        .await
        .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.title, "Final");
        assert_eq!(updated.description.as_deref(), Some("Polished"));
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[rstest]
    #[tokio::test]
    async fn test_complete_and_toggle(state: AppState) {
        let owner = OwnerId::generate();
        let created = create(&state, owner, "Flip me").await;

        let Json(completed) = complete_todo(
            State(state.clone()),
            AuthenticatedOwner(owner),
            todo_path(&created),
        )
        .await
        .unwrap();
        let Json(toggled) = toggle_todo(
            State(state),
            AuthenticatedOwner(owner),
            todo_path(&created),
        )
        .await
        .unwrap();

        assert!(completed.completed);
        assert!(!toggled.completed);
    }

    #[rstest]
    #[tokio::test]
    async fn test_foreign_todo_is_not_found(state: AppState) {
        let created = create(&state, OwnerId::generate(), "Private").await;
        let intruder = AuthenticatedOwner(OwnerId::generate());

        let toggle_error = toggle_todo(State(state.clone()), intruder, todo_path(&created))
            .await
            .unwrap_err();
        let delete_error = delete_todo(State(state), intruder, todo_path(&created))
            .await
            .unwrap_err();

        assert_eq!(toggle_error.status, StatusCode::NOT_FOUND);
        assert_eq!(toggle_error.error.message, "Todo not found or access denied");
        assert_eq!(delete_error.status, StatusCode::NOT_FOUND);
    }

    // -------------------------------------------------------------------------
    // Delete
    // -------------------------------------------------------------------------

    #[rstest]
    #[tokio::test]
    async fn test_delete_todo(state: AppState) {
        let owner = OwnerId::generate();
        let created = create(&state, owner, "Temporary").await;

        let status = delete_todo(
            State(state.clone()),
            AuthenticatedOwner(owner),
            todo_path(&created),
        )
        .await
        .unwrap();
        let second = delete_todo(State(state), AuthenticatedOwner(owner), todo_path(&created)).await;

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(second.is_err());
    }
}
