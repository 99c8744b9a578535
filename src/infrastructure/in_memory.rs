//! In-memory repository implementations.
//!
//! These implementations are suitable for development and testing. They
//! enforce the same length constraints as the `PostgreSQL` schema so that
//! persistence failures behave alike in both backends.
//!
//! # Features
//!
//! - Thread-safe with `Arc<RwLock<...>>`
//! - Rows grouped per owner, kept in insertion (creation) order
//! - Listing returns newest first by walking insertion order backwards

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    MAX_DESCRIPTION_LENGTH, MAX_SUGGESTION_LENGTH, MAX_TITLE_LENGTH, NewSuggestion, NewTask,
    OwnerId, Suggestion, SuggestionId, Task, TaskId, Timestamp,
};
use crate::infrastructure::{RepositoryError, SuggestionRepository, TaskRepository};

// =============================================================================
// Constraint Checks
// =============================================================================

/// Rejects text that is blank or longer than `max` characters.
fn check_text(column: &str, value: &str, max: usize) -> Result<(), RepositoryError> {
    if value.trim().is_empty() {
        return Err(RepositoryError::ConstraintViolation(format!(
            "{column} must not be blank"
        )));
    }
    check_length(column, value, max)
}

fn check_length(column: &str, value: &str, max: usize) -> Result<(), RepositoryError> {
    if value.chars().count() > max {
        return Err(RepositoryError::ConstraintViolation(format!(
            "{column} exceeds {max} characters"
        )));
    }
    Ok(())
}

fn check_task_columns(
    title: &str,
    description: Option<&str>,
) -> Result<(), RepositoryError> {
    check_text("title", title, MAX_TITLE_LENGTH)?;
    if let Some(description) = description {
        check_length("description", description, MAX_DESCRIPTION_LENGTH)?;
    }
    Ok(())
}

// =============================================================================
// In-Memory Task Repository
// =============================================================================

/// In-memory implementation of `TaskRepository`.
///
/// # Example
///
/// ```ignore
/// use infrastructure::in_memory::InMemoryTaskRepository;
///
/// let repository = InMemoryTaskRepository::new();
/// let task = repository.insert(NewTask::new(owner, "My Task")).await?;
/// let found = repository.find_by_id_and_owner(&task.task_id, &owner).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    tasks: Arc<RwLock<HashMap<OwnerId, Vec<Task>>>>,
}

impl InMemoryTaskRepository {
    /// Creates a new empty in-memory task repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[allow(clippy::significant_drop_tightening)]
#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<Task>, RepositoryError> {
        let guard = self.tasks.read().await;
        Ok(guard
            .get(owner)
            .map(|tasks| tasks.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    async fn list_by_owner_and_completion(
        &self,
        owner: &OwnerId,
        completed: bool,
    ) -> Result<Vec<Task>, RepositoryError> {
        let guard = self.tasks.read().await;
        Ok(guard
            .get(owner)
            .map(|tasks| {
                tasks
                    .iter()
                    .rev()
                    .filter(|task| task.completed == completed)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_by_id_and_owner(
        &self,
        id: &TaskId,
        owner: &OwnerId,
    ) -> Result<Option<Task>, RepositoryError> {
        let guard = self.tasks.read().await;
        Ok(guard
            .get(owner)
            .and_then(|tasks| tasks.iter().find(|task| task.task_id == *id))
            .cloned())
    }

    async fn insert(&self, task: NewTask) -> Result<Task, RepositoryError> {
        check_task_columns(&task.title, task.description.as_deref())?;

        let task = Task::from_new(TaskId::generate_v7(), task, Timestamp::now());
        let mut guard = self.tasks.write().await;
        guard.entry(task.owner_id).or_default().push(task.clone());
        Ok(task)
    }

    async fn update(&self, task: &Task) -> Result<Task, RepositoryError> {
        check_task_columns(&task.title, task.description.as_deref())?;

        let mut guard = self.tasks.write().await;
        let stored = guard
            .get_mut(&task.owner_id)
            .and_then(|tasks| tasks.iter_mut().find(|stored| stored.task_id == task.task_id))
            .ok_or_else(|| RepositoryError::NotFound(format!("Task {}", task.task_id)))?;

        let updated = Task {
            created_at: stored.created_at,
            ..task.clone().touched(Timestamp::now())
        };
        *stored = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: &TaskId, owner: &OwnerId) -> Result<bool, RepositoryError> {
        let mut guard = self.tasks.write().await;
        let Some(tasks) = guard.get_mut(owner) else {
            return Ok(false);
        };
        let before = tasks.len();
        tasks.retain(|task| task.task_id != *id);
        Ok(tasks.len() < before)
    }
}

// =============================================================================
// In-Memory Suggestion Repository
// =============================================================================

/// In-memory implementation of `SuggestionRepository`.
#[derive(Debug, Clone, Default)]
pub struct InMemorySuggestionRepository {
    suggestions: Arc<RwLock<HashMap<OwnerId, Vec<Suggestion>>>>,
}

impl InMemorySuggestionRepository {
    /// Creates a new empty in-memory suggestion repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[allow(clippy::significant_drop_tightening)]
#[async_trait]
impl SuggestionRepository for InMemorySuggestionRepository {
    async fn insert(&self, suggestion: NewSuggestion) -> Result<Suggestion, RepositoryError> {
        check_text(
            "suggested_task",
            &suggestion.suggested_task,
            MAX_SUGGESTION_LENGTH,
        )?;

        let suggestion =
            Suggestion::from_new(SuggestionId::generate_v7(), suggestion, Timestamp::now());
        let mut guard = self.suggestions.write().await;
        guard
            .entry(suggestion.owner_id)
            .or_default()
            .push(suggestion.clone());
        Ok(suggestion)
    }

    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<Suggestion>, RepositoryError> {
        let guard = self.suggestions.read().await;
        Ok(guard
            .get(owner)
            .map(|suggestions| suggestions.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_by_owner(&self, owner: &OwnerId) -> Result<u64, RepositoryError> {
        let mut guard = self.suggestions.write().await;
        let removed = guard.remove(owner).map_or(0, |suggestions| suggestions.len());
        Ok(removed as u64)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Priority, TaskChanges};
    use rstest::rstest;

    // -------------------------------------------------------------------------
    // InMemoryTaskRepository Tests
    // -------------------------------------------------------------------------

    #[rstest]
    #[tokio::test]
    async fn test_task_repository_insert_assigns_identity() {
        let repository = InMemoryTaskRepository::new();
        let owner = OwnerId::generate();

        let task = repository
            .insert(NewTask::new(owner, "Write report").with_priority(Priority::High))
            .await
            .unwrap();

        assert_eq!(task.owner_id, owner);
        assert_eq!(task.title, "Write report");
        assert!(!task.completed);

        let found = repository
            .find_by_id_and_owner(&task.task_id, &owner)
            .await
            .unwrap();
        assert_eq!(found, Some(task));
    }

    #[rstest]
    #[tokio::test]
    async fn test_task_repository_list_newest_first() {
        let repository = InMemoryTaskRepository::new();
        let owner = OwnerId::generate();

        let first = repository.insert(NewTask::new(owner, "first")).await.unwrap();
        let second = repository.insert(NewTask::new(owner, "second")).await.unwrap();
        let third = repository.insert(NewTask::new(owner, "third")).await.unwrap();

        let listed = repository.list_by_owner(&owner).await.unwrap();
        let ids: Vec<TaskId> = listed.iter().map(|task| task.task_id).collect();

        assert_eq!(ids, vec![third.task_id, second.task_id, first.task_id]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_task_repository_is_owner_scoped() {
        let repository = InMemoryTaskRepository::new();
        let owner = OwnerId::generate();
        let intruder = OwnerId::generate();

        let task = repository.insert(NewTask::new(owner, "private")).await.unwrap();

        assert!(repository.list_by_owner(&intruder).await.unwrap().is_empty());
        assert!(
            repository
                .find_by_id_and_owner(&task.task_id, &intruder)
                .await
                .unwrap()
                .is_none()
        );
        assert!(!repository.delete(&task.task_id, &intruder).await.unwrap());

        let hijacked = Task {
            owner_id: intruder,
            ..task.clone()
        };
        assert!(matches!(
            repository.update(&hijacked).await,
            Err(RepositoryError::NotFound(_))
        ));
        assert_eq!(repository.list_by_owner(&owner).await.unwrap(), vec![task]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_task_repository_list_by_completion() {
        let repository = InMemoryTaskRepository::new();
        let owner = OwnerId::generate();

        let open = repository.insert(NewTask::new(owner, "open")).await.unwrap();
        let done = repository.insert(NewTask::new(owner, "done")).await.unwrap();
        repository.update(&done.clone().complete()).await.unwrap();

        let completed = repository
            .list_by_owner_and_completion(&owner, true)
            .await
            .unwrap();
        let pending = repository
            .list_by_owner_and_completion(&owner, false)
            .await
            .unwrap();

        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].task_id, done.task_id);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].task_id, open.task_id);
    }

    #[rstest]
    #[tokio::test]
    async fn test_task_repository_update_keeps_created_at() {
        let repository = InMemoryTaskRepository::new();
        let owner = OwnerId::generate();
        let task = repository.insert(NewTask::new(owner, "before")).await.unwrap();

        let changed = task.clone().apply(TaskChanges {
            title: "after".to_string(),
            description: Some("details".to_string()),
            priority: Priority::Urgent,
            due_at: None,
        });
        let updated = repository.update(&changed).await.unwrap();

        assert_eq!(updated.title, "after");
        assert_eq!(updated.priority, Priority::Urgent);
        assert_eq!(updated.created_at, task.created_at);
        assert!(updated.updated_at >= task.updated_at);
    }

    #[rstest]
    #[tokio::test]
    async fn test_task_repository_delete() {
        let repository = InMemoryTaskRepository::new();
        let owner = OwnerId::generate();
        let task = repository.insert(NewTask::new(owner, "doomed")).await.unwrap();

        assert!(repository.delete(&task.task_id, &owner).await.unwrap());
        assert!(!repository.delete(&task.task_id, &owner).await.unwrap());
        assert!(repository.list_by_owner(&owner).await.unwrap().is_empty());
    }

    #[rstest]
    #[case(String::new(), None)]
    #[case("   ".to_string(), None)]
    #[case("x".repeat(MAX_TITLE_LENGTH + 1), None)]
    #[case("ok".to_string(), Some("y".repeat(MAX_DESCRIPTION_LENGTH + 1)))]
    #[tokio::test]
    async fn test_task_repository_rejects_constraint_violations(
        #[case] title: String,
        #[case] description: Option<String>,
    ) {
        let repository = InMemoryTaskRepository::new();
        let mut task = NewTask::new(OwnerId::generate(), title);
        task.description = description;

        let result = repository.insert(task).await;

        assert!(matches!(result, Err(RepositoryError::ConstraintViolation(_))));
    }

    // -------------------------------------------------------------------------
    // InMemorySuggestionRepository Tests
    // -------------------------------------------------------------------------

    #[rstest]
    #[tokio::test]
    async fn test_suggestion_repository_insert_and_list_newest_first() {
        let repository = InMemorySuggestionRepository::new();
        let owner = OwnerId::generate();

        let older = repository
            .insert(NewSuggestion::new(owner, "older", Priority::Low))
            .await
            .unwrap();
        let newer = repository
            .insert(NewSuggestion::new(owner, "newer", Priority::High))
            .await
            .unwrap();

        let listed = repository.list_by_owner(&owner).await.unwrap();

        assert_eq!(listed, vec![newer, older]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_suggestion_repository_rejects_overlong_text() {
        let repository = InMemorySuggestionRepository::new();
        let text = "z".repeat(MAX_SUGGESTION_LENGTH + 1);

        let result = repository
            .insert(NewSuggestion::new(OwnerId::generate(), text, Priority::Medium))
            .await;

        assert!(matches!(result, Err(RepositoryError::ConstraintViolation(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn test_suggestion_repository_delete_by_owner() {
        let repository = InMemorySuggestionRepository::new();
        let owner = OwnerId::generate();
        let other = OwnerId::generate();

        for text in ["a", "b"] {
            repository
                .insert(NewSuggestion::new(owner, text, Priority::Medium))
                .await
                .unwrap();
        }
        repository
            .insert(NewSuggestion::new(other, "c", Priority::Medium))
            .await
            .unwrap();

        assert_eq!(repository.delete_by_owner(&owner).await.unwrap(), 2);
        assert_eq!(repository.delete_by_owner(&owner).await.unwrap(), 0);
        assert!(repository.list_by_owner(&owner).await.unwrap().is_empty());
        assert_eq!(repository.list_by_owner(&other).await.unwrap().len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn test_task_repository_concurrent_inserts() {
        let repository = InMemoryTaskRepository::new();
        let owner = OwnerId::generate();

        let handles: Vec<_> = (0..10)
            .map(|index| {
                let repository = repository.clone();
                tokio::spawn(async move {
                    repository
                        .insert(NewTask::new(owner, format!("task {index}")))
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        assert_eq!(repository.list_by_owner(&owner).await.unwrap().len(), 10);
    }
}
