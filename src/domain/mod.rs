//! Domain module for task management.
//!
//! This module contains domain models, value objects, and the pure
//! ranking and parsing logic used by the AI-assisted features.

pub mod ranking;
pub mod suggestion;
pub mod task;

pub use ranking::{
    MOCK_SUGGESTIONS, ParsedSuggestion, Reordering, parse_suggestion_line, parse_suggestions,
    prioritization_prompt, reorder_by_response, sort_by_rank, sort_by_rank_then_due,
    suggestion_prompt,
};
pub use suggestion::{MAX_SUGGESTION_LENGTH, NewSuggestion, Suggestion, SuggestionId};
pub use task::{
    MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH, NewTask, OwnerId, Priority, Task, TaskChanges,
    TaskId, Timestamp, UnknownPriority,
};
