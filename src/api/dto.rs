//! Data Transfer Objects for API requests and responses.
//!
//! This module contains DTOs that are separate from domain models,
//! providing a clean API contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH, NewTask, OwnerId, Priority, Suggestion, Task,
    TaskChanges, Timestamp,
};

use super::error::{FieldError, ValidationError};

// =============================================================================
// Todo DTOs
// =============================================================================

/// Request DTO for creating or replacing a todo.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoRequest {
    /// Title of the todo.
    #[serde(default)]
    pub title: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Priority name, case-insensitive (defaults to MEDIUM).
    #[serde(default)]
    pub priority: Option<String>,
    /// Optional RFC 3339 due date.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Query parameters for listing todos.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTodosQuery {
    /// Only return todos with this completion flag.
    pub completed: Option<bool>,
    /// `priority` orders by rank, then due date, then newest.
    pub sort: Option<String>,
}

impl ListTodosQuery {
    /// Returns `true` when the priority ordering was requested.
    #[must_use]
    pub fn sort_by_priority(&self) -> bool {
        self.sort
            .as_deref()
            .is_some_and(|sort| sort.trim().eq_ignore_ascii_case("priority"))
    }
}

/// Response DTO for a todo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    pub due_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Task> for TodoResponse {
    fn from(task: &Task) -> Self {
        Self {
            id: task.task_id.to_string(),
            title: task.title.clone(),
            description: task.description.clone(),
            completed: task.completed,
            priority: task.priority,
            due_date: task.due_at.map(|due_at| due_at.to_string()),
            created_at: task.created_at.to_string(),
            updated_at: task.updated_at.to_string(),
        }
    }
}

impl From<Task> for TodoResponse {
    fn from(task: Task) -> Self {
        Self::from(&task)
    }
}

// =============================================================================
// Suggestion DTOs
// =============================================================================

/// Response DTO for an AI suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionResponse {
    pub id: String,
    pub suggested_task: String,
    pub priority: Priority,
    pub created_at: String,
}

impl From<&Suggestion> for SuggestionResponse {
    fn from(suggestion: &Suggestion) -> Self {
        Self {
            id: suggestion.suggestion_id.to_string(),
            suggested_task: suggestion.suggested_task.clone(),
            priority: suggestion.priority,
            created_at: suggestion.created_at.to_string(),
        }
    }
}

impl From<Suggestion> for SuggestionResponse {
    fn from(suggestion: Suggestion) -> Self {
        Self::from(&suggestion)
    }
}

/// Response DTO for bulk deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}

// =============================================================================
// Validation
// =============================================================================

/// A `TodoRequest` that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTodo {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_at: Option<Timestamp>,
}

impl ValidatedTodo {
    /// Converts into a new-task draft for `owner`.
    #[must_use]
    pub fn into_new_task(self, owner_id: OwnerId) -> NewTask {
        NewTask {
            owner_id,
            title: self.title,
            description: self.description,
            priority: self.priority,
            due_at: self.due_at,
        }
    }

    /// Converts into a full replacement of the editable fields.
    #[must_use]
    pub fn into_changes(self) -> TaskChanges {
        TaskChanges {
            title: self.title,
            description: self.description,
            priority: self.priority,
            due_at: self.due_at,
        }
    }
}

/// Validates a todo title.
///
/// # Validation Rules
///
/// - Title must not be blank
/// - Title must not exceed 255 characters
///
/// # Errors
///
/// Returns a single-field `ValidationError` on failure.
pub fn validate_title(title: &str) -> Result<String, ValidationError> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ValidationError::single("title", "Title is required"));
    }

    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::single(
            "title",
            format!("Title must not exceed {MAX_TITLE_LENGTH} characters"),
        ));
    }

    Ok(title.to_string())
}

/// Validates a todo description. Blank descriptions become `None`.
///
/// # Errors
///
/// Returns a single-field `ValidationError` if the description exceeds
/// 1000 characters.
pub fn validate_description(description: Option<&str>) -> Result<Option<String>, ValidationError> {
    description.map_or(Ok(None), |description| {
        let description = description.trim();
        if description.is_empty() {
            Ok(None)
        } else if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            Err(ValidationError::single(
                "description",
                format!("Description must not exceed {MAX_DESCRIPTION_LENGTH} characters"),
            ))
        } else {
            Ok(Some(description.to_string()))
        }
    })
}

/// Validates a priority name. An absent priority is MEDIUM.
///
/// # Errors
///
/// Returns a single-field `ValidationError` for unknown names.
pub fn validate_priority(priority: Option<&str>) -> Result<Priority, ValidationError> {
    priority.map_or(Ok(Priority::default()), |priority| {
        priority.parse().map_err(|_| {
            ValidationError::single(
                "priority",
                "Priority must be one of LOW, MEDIUM, HIGH, URGENT",
            )
        })
    })
}

/// Validates a whole request, reporting every failing field.
///
/// # Errors
///
/// Returns a `ValidationError` listing all field errors.
pub fn validate_todo_request(request: &TodoRequest) -> Result<ValidatedTodo, ValidationError> {
    let title = validate_title(&request.title);
    let description = validate_description(request.description.as_deref());
    let priority = validate_priority(request.priority.as_deref());

    match (title, description, priority) {
        (Ok(title), Ok(description), Ok(priority)) => Ok(ValidatedTodo {
            title,
            description,
            priority,
            due_at: request.due_date.map(Timestamp::from_datetime),
        }),
        (title, description, priority) => {
            let errors: Vec<FieldError> = [title.err(), description.err(), priority.err()]
                .into_iter()
                .flatten()
                .flat_map(|error| error.errors)
                .collect();
            Err(ValidationError::new(errors))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use crate::domain::TaskId;

    // -------------------------------------------------------------------------
    // Response Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_todo_response_from_task() {
        let task = Task::from_new(
            TaskId::generate_v7(),
            NewTask::new(OwnerId::generate(), "Test Task")
                .with_description("Test description")
                .with_priority(Priority::High),
            Timestamp::now(),
        );

        let response = TodoResponse::from(&task);

        assert_eq!(response.id, task.task_id.to_string());
        assert_eq!(response.title, "Test Task");
        assert_eq!(response.description, Some("Test description".to_string()));
        assert_eq!(response.priority, Priority::High);
        assert!(!response.completed);
        assert!(response.due_date.is_none());
    }

    #[rstest]
    fn test_todo_response_serializes_snake_case() {
        let task = Task::from_new(
            TaskId::generate_v7(),
            NewTask::new(OwnerId::generate(), "Serialize"),
            Timestamp::now(),
        );

        let json = serde_json::to_value(TodoResponse::from(task)).unwrap();

        assert_eq!(json["priority"], "MEDIUM");
        assert!(json.get("created_at").is_some());
        assert!(json.get("due_date").is_some());
    }

    #[rstest]
    fn test_todo_response_keeps_fractional_seconds() {
        let request: TodoRequest = serde_json::from_value(serde_json::json!({
            "title": "Precise",
            "due_date": "2025-01-01T10:00:00.789Z"
        }))
        .unwrap();
        let new_task = validate_todo_request(&request)
            .unwrap()
            .into_new_task(OwnerId::generate());

        let task = Task::from_new(TaskId::generate_v7(), new_task, Timestamp::now());
        let response = TodoResponse::from(&task);

        assert_eq!(
            response.due_date.as_deref(),
            Some("2025-01-01T10:00:00.789Z")
        );
        assert_eq!(response.created_at, task.created_at.to_string());
    }

    #[rstest]
    fn test_suggestion_responses_in_same_second_are_distinguishable() {
        use crate::domain::{NewSuggestion, SuggestionId};

        let base = DateTime::parse_from_rfc3339("2025-01-01T10:00:00.100Z")
            .unwrap()
            .with_timezone(&Utc);
        let owner = OwnerId::generate();
        let older = Suggestion::from_new(
            SuggestionId::generate_v7(),
            NewSuggestion::new(owner, "First", Priority::Low),
            Timestamp::from_datetime(base),
        );
        let newer = Suggestion::from_new(
            SuggestionId::generate_v7(),
            NewSuggestion::new(owner, "Second", Priority::Low),
            Timestamp::from_datetime(base + chrono::Duration::milliseconds(250)),
        );

        let older = SuggestionResponse::from(&older);
        let newer = SuggestionResponse::from(&newer);

        assert_eq!(older.created_at, "2025-01-01T10:00:00.100Z");
        assert_eq!(newer.created_at, "2025-01-01T10:00:00.350Z");
    }

    #[rstest]
    #[case(None, false)]
    #[case(Some("priority"), true)]
    #[case(Some("PRIORITY"), true)]
    #[case(Some("created"), false)]
    fn test_list_query_sort_by_priority(#[case] sort: Option<&str>, #[case] expected: bool) {
        let query = ListTodosQuery {
            completed: None,
            sort: sort.map(str::to_string),
        };
        assert_eq!(query.sort_by_priority(), expected);
    }

    // -------------------------------------------------------------------------
    // Validation Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_validate_title_trims_whitespace() {
        assert_eq!(
            validate_title("  Trimmed Title  "),
            Ok("Trimmed Title".to_string())
        );
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn test_validate_title_blank(#[case] title: &str) {
        assert!(validate_title(title).is_err());
    }

    #[rstest]
    fn test_validate_title_length_limit() {
        assert!(validate_title(&"a".repeat(255)).is_ok());
        assert!(validate_title(&"a".repeat(256)).is_err());
        // Multi-byte characters count once each.
        assert!(validate_title(&"é".repeat(255)).is_ok());
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some(""), None)]
    #[case(Some("  details "), Some("details"))]
    fn test_validate_description_valid(#[case] input: Option<&str>, #[case] expected: Option<&str>) {
        assert_eq!(
            validate_description(input),
            Ok(expected.map(str::to_string))
        );
    }

    #[rstest]
    fn test_validate_description_too_long() {
        let long = "a".repeat(1001);
        assert!(validate_description(Some(&long)).is_err());
    }

    #[rstest]
    #[case(None, Priority::Medium)]
    #[case(Some("urgent"), Priority::Urgent)]
    #[case(Some("LOW"), Priority::Low)]
    fn test_validate_priority_valid(#[case] input: Option<&str>, #[case] expected: Priority) {
        assert_eq!(validate_priority(input), Ok(expected));
    }

    #[rstest]
    fn test_validate_priority_unknown() {
        assert!(validate_priority(Some("critical")).is_err());
    }

    #[rstest]
    fn test_validate_todo_request_collects_all_errors() {
        let request = TodoRequest {
            title: String::new(),
            description: Some("a".repeat(1001)),
            priority: Some("bogus".to_string()),
            due_date: None,
        };

        let error = validate_todo_request(&request).unwrap_err();
        let fields: Vec<&str> = error.errors.iter().map(|error| error.field.as_str()).collect();

        assert_eq!(fields, vec!["title", "description", "priority"]);
    }

    #[rstest]
    fn test_validate_todo_request_valid() {
        let request: TodoRequest = serde_json::from_value(serde_json::json!({
            "title": "Ship",
            "priority": "high",
            "due_date": "2026-01-15T09:00:00Z"
        }))
        .unwrap();

        let validated = validate_todo_request(&request).unwrap();

        assert_eq!(validated.title, "Ship");
        assert_eq!(validated.priority, Priority::High);
        assert_eq!(
            validated.due_at.map(|due_at| due_at.to_string()),
            Some("2026-01-15T09:00:00Z".to_string())
        );
    }
}
