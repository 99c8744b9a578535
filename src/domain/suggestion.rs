//! AI suggestion domain model.
//!
//! Suggestions are created only by the suggestion engine and are read-only
//! afterwards, apart from bulk deletion by owner.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::{OwnerId, Priority, Timestamp};

/// Maximum length of a suggested task text, in characters.
pub const MAX_SUGGESTION_LENGTH: usize = 500;

/// Unique identifier for a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SuggestionId(Uuid);

impl SuggestionId {
    /// Creates a `SuggestionId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Generates a new time-ordered `SuggestionId`.
    #[must_use]
    pub fn generate_v7() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for SuggestionId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A persisted suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub suggestion_id: SuggestionId,
    pub owner_id: OwnerId,
    pub suggested_task: String,
    pub priority: Priority,
    pub created_at: Timestamp,
}

impl Suggestion {
    /// Materializes a stored suggestion from its draft and store-assigned values.
    #[must_use]
    pub fn from_new(
        suggestion_id: SuggestionId,
        new_suggestion: NewSuggestion,
        created_at: Timestamp,
    ) -> Self {
        Self {
            suggestion_id,
            owner_id: new_suggestion.owner_id,
            suggested_task: new_suggestion.suggested_task,
            priority: new_suggestion.priority,
            created_at,
        }
    }
}

/// A suggestion that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSuggestion {
    pub owner_id: OwnerId,
    pub suggested_task: String,
    pub priority: Priority,
}

impl NewSuggestion {
    #[must_use]
    pub fn new(owner_id: OwnerId, suggested_task: impl Into<String>, priority: Priority) -> Self {
        Self {
            owner_id,
            suggested_task: suggested_task.into(),
            priority,
        }
    }
}
