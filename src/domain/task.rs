//! Task domain model.
//!
//! Tasks are always scoped by their owner: every lookup and mutation in
//! this crate carries an [`OwnerId`], and no operation crosses owners.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// Value Objects - Newtypes
// =============================================================================

/// Identifier of the user who exclusively controls a task or suggestion.
///
/// The user entity itself lives outside this crate; the identifier is only
/// used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// Creates an `OwnerId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Generates a new random `OwnerId`.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Unique identifier for a task.
///
/// Assigned by the task store at insert time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Generates a new `TaskId` with a time-ordered UUID (v7).
    ///
    /// **Note**: This is an impure function (side effect: time + random).
    /// Only stores call it.
    #[must_use]
    pub fn generate_v7() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A timestamp wrapper for `DateTime<Utc>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a `Timestamp` from a `DateTime<Utc>`.
    #[must_use]
    pub const fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }

    /// Returns the inner `DateTime<Utc>`.
    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the current time as a `Timestamp`.
    ///
    /// **Note**: This is an impure function (side effect: system clock).
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Sub-second digits appear only when non-zero.
        formatter.write_str(&self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

// =============================================================================
// Priority
// =============================================================================

/// The priority level of a task or suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Returns the sort rank used by the non-AI ordering.
    ///
    /// Lower ranks sort first: URGENT=1, HIGH=2, MEDIUM=3, LOW=4.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Urgent => 1,
            Self::High => 2,
            Self::Medium => 3,
            Self::Low => 4,
        }
    }

    /// Returns the upper-case wire/database name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Urgent => "URGENT",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a priority.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown priority: '{0}'")]
pub struct UnknownPriority(pub String);

impl FromStr for Priority {
    type Err = UnknownPriority;

    /// Parses a priority, ignoring case and surrounding whitespace.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "URGENT" => Ok(Self::Urgent),
            _ => Err(UnknownPriority(value.to_string())),
        }
    }
}

// =============================================================================
// Task
// =============================================================================

/// Maximum length of a task title, in characters.
pub const MAX_TITLE_LENGTH: usize = 255;

/// Maximum length of a task description, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// A persisted todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskId,
    pub owner_id: OwnerId,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub completed: bool,
    pub due_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Task {
    /// Materializes a stored task from a `NewTask` and store-assigned values.
    #[must_use]
    pub fn from_new(task_id: TaskId, new_task: NewTask, created_at: Timestamp) -> Self {
        Self {
            task_id,
            owner_id: new_task.owner_id,
            title: new_task.title,
            description: new_task.description,
            priority: new_task.priority,
            completed: false,
            due_at: new_task.due_at,
            created_at,
            updated_at: created_at,
        }
    }

    /// Returns a copy with the editable fields replaced by `changes`.
    #[must_use]
    pub fn apply(self, changes: TaskChanges) -> Self {
        Self {
            title: changes.title,
            description: changes.description,
            priority: changes.priority,
            due_at: changes.due_at,
            ..self
        }
    }

    /// Returns a copy with the completion flag set to `completed`.
    #[must_use]
    pub fn with_completed(self, completed: bool) -> Self {
        Self { completed, ..self }
    }

    /// Returns a copy marked as completed.
    #[must_use]
    pub fn complete(self) -> Self {
        self.with_completed(true)
    }

    /// Returns a copy with the completion flag flipped.
    #[must_use]
    pub fn toggle(self) -> Self {
        let completed = !self.completed;
        self.with_completed(completed)
    }

    /// Returns a copy with `updated_at` set to `now`.
    #[must_use]
    pub fn touched(self, now: Timestamp) -> Self {
        Self {
            updated_at: now,
            ..self
        }
    }
}

/// Owner-supplied data for a task that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub owner_id: OwnerId,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_at: Option<Timestamp>,
}

impl NewTask {
    /// Creates a new task draft with default priority and no description.
    #[must_use]
    pub fn new(owner_id: OwnerId, title: impl Into<String>) -> Self {
        Self {
            owner_id,
            title: title.into(),
            description: None,
            priority: Priority::default(),
            due_at: None,
        }
    }

    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_priority(self, priority: Priority) -> Self {
        Self { priority, ..self }
    }

    #[must_use]
    pub fn with_due_at(self, due_at: Timestamp) -> Self {
        Self {
            due_at: Some(due_at),
            ..self
        }
    }
}

/// Replacement values for an update.
///
/// All four fields are overwritten; an absent description or due date
/// clears the stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_at: Option<Timestamp>,
}

// =============================================================================
// Tests
// =============================================================================
