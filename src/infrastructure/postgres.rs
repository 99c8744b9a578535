//! `PostgreSQL` repository implementations.
//!
//! This module provides `PostgreSQL`-based implementations of the repository traits
//! using `sqlx` for database operations.
//!
//! # Features
//!
//! - Connection pooling with `sqlx::PgPool`
//! - Explicit columns with length checks mirrored by the in-memory stores
//! - Owner scoping in every `WHERE` clause
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS tasks (
//!     id UUID PRIMARY KEY,
//!     owner_id UUID NOT NULL,
//!     title VARCHAR(255) NOT NULL CHECK (length(btrim(title)) > 0),
//!     description VARCHAR(1000),
//!     priority VARCHAR(10) NOT NULL DEFAULT 'MEDIUM',
//!     completed BOOLEAN NOT NULL DEFAULT FALSE,
//!     due_at TIMESTAMPTZ,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! CREATE INDEX IF NOT EXISTS idx_tasks_owner_id ON tasks(owner_id);
//!
//! CREATE TABLE IF NOT EXISTS ai_suggestions (
//!     id UUID PRIMARY KEY,
//!     owner_id UUID NOT NULL,
//!     suggested_task VARCHAR(500) NOT NULL CHECK (length(btrim(suggested_task)) > 0),
//!     priority VARCHAR(10) NOT NULL DEFAULT 'MEDIUM',
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! CREATE INDEX IF NOT EXISTS idx_ai_suggestions_owner_id ON ai_suggestions(owner_id);
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    NewSuggestion, NewTask, OwnerId, Priority, Suggestion, SuggestionId, Task, TaskId, Timestamp,
};
use crate::infrastructure::{RepositoryError, SuggestionRepository, TaskRepository};

// =============================================================================
// Schema
// =============================================================================

const SCHEMA_STATEMENTS: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS tasks (
        id UUID PRIMARY KEY,
        owner_id UUID NOT NULL,
        title VARCHAR(255) NOT NULL CHECK (length(btrim(title)) > 0),
        description VARCHAR(1000),
        priority VARCHAR(10) NOT NULL DEFAULT 'MEDIUM',
        completed BOOLEAN NOT NULL DEFAULT FALSE,
        due_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE INDEX IF NOT EXISTS idx_tasks_owner_id ON tasks(owner_id)",
    "CREATE TABLE IF NOT EXISTS ai_suggestions (
        id UUID PRIMARY KEY,
        owner_id UUID NOT NULL,
        suggested_task VARCHAR(500) NOT NULL CHECK (length(btrim(suggested_task)) > 0),
        priority VARCHAR(10) NOT NULL DEFAULT 'MEDIUM',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE INDEX IF NOT EXISTS idx_ai_suggestions_owner_id ON ai_suggestions(owner_id)",
];

/// Creates the `tasks` and `ai_suggestions` tables if they do not exist.
///
/// # Errors
///
/// Returns `RepositoryError::DatabaseError` if any statement fails.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), RepositoryError> {
    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|error| RepositoryError::DatabaseError(error.to_string()))?;
    }
    Ok(())
}

// =============================================================================
// Row Mapping
// =============================================================================

const TASK_COLUMNS: &str =
    "id, owner_id, title, description, priority, completed, due_at, created_at, updated_at";

const SUGGESTION_COLUMNS: &str = "id, owner_id, suggested_task, priority, created_at";

type TaskRow = (
    Uuid,
    Uuid,
    String,
    Option<String>,
    String,
    bool,
    Option<DateTime<Utc>>,
    DateTime<Utc>,
    DateTime<Utc>,
);

type SuggestionRow = (Uuid, Uuid, String, String, DateTime<Utc>);

fn parse_priority(value: &str) -> Result<Priority, RepositoryError> {
    value
        .parse()
        .map_err(|error: crate::domain::UnknownPriority| {
            RepositoryError::SerializationError(error.to_string())
        })
}

fn task_from_row(row: TaskRow) -> Result<Task, RepositoryError> {
    let (id, owner_id, title, description, priority, completed, due_at, created_at, updated_at) =
        row;
    Ok(Task {
        task_id: TaskId::from_uuid(id),
        owner_id: OwnerId::from_uuid(owner_id),
        title,
        description,
        priority: parse_priority(&priority)?,
        completed,
        due_at: due_at.map(Timestamp::from_datetime),
        created_at: Timestamp::from_datetime(created_at),
        updated_at: Timestamp::from_datetime(updated_at),
    })
}

fn suggestion_from_row(row: SuggestionRow) -> Result<Suggestion, RepositoryError> {
    let (id, owner_id, suggested_task, priority, created_at) = row;
    Ok(Suggestion {
        suggestion_id: SuggestionId::from_uuid(id),
        owner_id: OwnerId::from_uuid(owner_id),
        suggested_task,
        priority: parse_priority(&priority)?,
        created_at: Timestamp::from_datetime(created_at),
    })
}

/// Maps a write error, separating column constraint failures from the rest.
///
/// `22001` is `string_data_right_truncation` and `23514` is `check_violation`.
fn map_write_error(error: sqlx::Error) -> RepositoryError {
    let is_constraint = error
        .as_database_error()
        .and_then(|database_error| database_error.code())
        .is_some_and(|code| code == "22001" || code == "23514");

    if is_constraint {
        RepositoryError::ConstraintViolation(error.to_string())
    } else {
        RepositoryError::DatabaseError(error.to_string())
    }
}

// =============================================================================
// PostgreSQL Task Repository
// =============================================================================

/// `PostgreSQL` implementation of `TaskRepository`.
///
/// # Example
///
/// ```ignore
/// use infrastructure::postgres::PostgresTaskRepository;
///
/// let pool = PgPool::connect("postgres://localhost/mydb").await?;
/// let repository = PostgresTaskRepository::new(pool);
///
/// let task = repository.insert(NewTask::new(owner, "My Task")).await?;
/// let found = repository.find_by_id_and_owner(&task.task_id, &owner).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    /// Connection pool for `PostgreSQL`.
    pool: PgPool,
}

impl PostgresTaskRepository {
    /// Creates a new `PostgreSQL` task repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<Task>, RepositoryError> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        let rows: Vec<TaskRow> = sqlx::query_as(&sql)
            .bind(owner.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| RepositoryError::DatabaseError(error.to_string()))?;

        rows.into_iter().map(task_from_row).collect()
    }

    async fn list_by_owner_and_completion(
        &self,
        owner: &OwnerId,
        completed: bool,
    ) -> Result<Vec<Task>, RepositoryError> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id = $1 AND completed = $2 \
             ORDER BY created_at DESC, id DESC"
        );
        let rows: Vec<TaskRow> = sqlx::query_as(&sql)
            .bind(owner.as_uuid())
            .bind(completed)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| RepositoryError::DatabaseError(error.to_string()))?;

        rows.into_iter().map(task_from_row).collect()
    }

    async fn find_by_id_and_owner(
        &self,
        id: &TaskId,
        owner: &OwnerId,
    ) -> Result<Option<Task>, RepositoryError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND owner_id = $2");
        let row: Option<TaskRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .bind(owner.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| RepositoryError::DatabaseError(error.to_string()))?;

        row.map(task_from_row).transpose()
    }

    async fn insert(&self, task: NewTask) -> Result<Task, RepositoryError> {
        let sql = format!(
            "INSERT INTO tasks (id, owner_id, title, description, priority, due_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {TASK_COLUMNS}"
        );
        let row: TaskRow = sqlx::query_as(&sql)
            .bind(TaskId::generate_v7().as_uuid())
            .bind(task.owner_id.as_uuid())
            .bind(&task.title)
            .bind(task.description.as_deref())
            .bind(task.priority.as_str())
            .bind(task.due_at.map(|due_at| *due_at.as_datetime()))
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;

        task_from_row(row)
    }

    async fn update(&self, task: &Task) -> Result<Task, RepositoryError> {
        let sql = format!(
            "UPDATE tasks SET title = $3, description = $4, priority = $5, completed = $6, \
             due_at = $7, updated_at = NOW() WHERE id = $1 AND owner_id = $2 \
             RETURNING {TASK_COLUMNS}"
        );
        let row: Option<TaskRow> = sqlx::query_as(&sql)
            .bind(task.task_id.as_uuid())
            .bind(task.owner_id.as_uuid())
            .bind(&task.title)
            .bind(task.description.as_deref())
            .bind(task.priority.as_str())
            .bind(task.completed)
            .bind(task.due_at.map(|due_at| *due_at.as_datetime()))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;

        row.map_or_else(
            || Err(RepositoryError::NotFound(format!("Task {}", task.task_id))),
            task_from_row,
        )
    }

    async fn delete(&self, id: &TaskId, owner: &OwnerId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND owner_id = $2")
            .bind(id.as_uuid())
            .bind(owner.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| RepositoryError::DatabaseError(error.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// PostgreSQL Suggestion Repository
// =============================================================================

/// `PostgreSQL` implementation of `SuggestionRepository`.
#[derive(Debug, Clone)]
pub struct PostgresSuggestionRepository {
    pool: PgPool,
}

impl PostgresSuggestionRepository {
    /// Creates a new `PostgreSQL` suggestion repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SuggestionRepository for PostgresSuggestionRepository {
    async fn insert(&self, suggestion: NewSuggestion) -> Result<Suggestion, RepositoryError> {
        let sql = format!(
            "INSERT INTO ai_suggestions (id, owner_id, suggested_task, priority) \
             VALUES ($1, $2, $3, $4) RETURNING {SUGGESTION_COLUMNS}"
        );
        let row: SuggestionRow = sqlx::query_as(&sql)
            .bind(SuggestionId::generate_v7().as_uuid())
            .bind(suggestion.owner_id.as_uuid())
            .bind(&suggestion.suggested_task)
            .bind(suggestion.priority.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;

        suggestion_from_row(row)
    }

    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<Suggestion>, RepositoryError> {
        let sql = format!(
            "SELECT {SUGGESTION_COLUMNS} FROM ai_suggestions WHERE owner_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        let rows: Vec<SuggestionRow> = sqlx::query_as(&sql)
            .bind(owner.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| RepositoryError::DatabaseError(error.to_string()))?;

        rows.into_iter().map(suggestion_from_row).collect()
    }

    async fn delete_by_owner(&self, owner: &OwnerId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM ai_suggestions WHERE owner_id = $1")
            .bind(owner.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| RepositoryError::DatabaseError(error.to_string()))?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Tests
// =============================================================================
