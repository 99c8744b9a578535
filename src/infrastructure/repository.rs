//! Repository traits for domain entities.
//!
//! Every read and write is scoped by [`OwnerId`]: a task or suggestion is
//! only visible through the owner that created it. Implementations assign
//! identifiers and timestamps on insert.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{NewSuggestion, NewTask, OwnerId, Suggestion, Task, TaskId};

// =============================================================================
// Repository Error
// =============================================================================

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Entity was not found (or is owned by someone else).
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// A stored value violates a column constraint.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A stored row could not be mapped back to a domain value.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// =============================================================================
// Task Repository
// =============================================================================

/// Repository trait for Task entities.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Lists every task of `owner`, newest first.
    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<Task>, RepositoryError>;

    /// Lists the tasks of `owner` with the given completion flag, newest first.
    async fn list_by_owner_and_completion(
        &self,
        owner: &OwnerId,
        completed: bool,
    ) -> Result<Vec<Task>, RepositoryError>;

    /// Finds a task by id, only if it belongs to `owner`.
    async fn find_by_id_and_owner(
        &self,
        id: &TaskId,
        owner: &OwnerId,
    ) -> Result<Option<Task>, RepositoryError>;

    /// Inserts a new task, assigning its id and timestamps.
    async fn insert(&self, task: NewTask) -> Result<Task, RepositoryError>;

    /// Persists the editable fields and completion flag of an existing task.
    ///
    /// The store refreshes `updated_at`. Returns `RepositoryError::NotFound`
    /// if no task with that id exists for the task's owner.
    async fn update(&self, task: &Task) -> Result<Task, RepositoryError>;

    /// Deletes a task of `owner`.
    ///
    /// Returns `Ok(true)` if the task was deleted, `Ok(false)` if it didn't exist.
    async fn delete(&self, id: &TaskId, owner: &OwnerId) -> Result<bool, RepositoryError>;
}

// =============================================================================
// Suggestion Repository
// =============================================================================

/// Repository trait for AI suggestions.
#[async_trait]
pub trait SuggestionRepository: Send + Sync {
    /// Inserts a suggestion, assigning its id and creation time.
    async fn insert(&self, suggestion: NewSuggestion) -> Result<Suggestion, RepositoryError>;

    /// Lists every suggestion of `owner`, newest first.
    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<Suggestion>, RepositoryError>;

    /// Deletes every suggestion of `owner` and returns how many were removed.
    async fn delete_by_owner(&self, owner: &OwnerId) -> Result<u64, RepositoryError>;
}

// =============================================================================
// Tests
// =============================================================================
