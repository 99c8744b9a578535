//! Pure prioritization and suggestion logic.
//!
//! Everything here is deterministic and free of I/O: prompt rendering, the
//! fixed rank ordering, and the best-effort parsers that turn free-form
//! model output back into structured values. The service layer wraps these
//! functions with the completion call, persistence and logging.

use std::cmp::Ordering;

use super::task::{Priority, Task, Timestamp};

// =============================================================================
// Constants
// =============================================================================

/// Placeholder rendered for tasks without a due date.
pub const NO_DUE_DATE: &str = "No due date";

/// Context rendered when the owner has no tasks yet.
pub const NO_EXISTING_TODOS: &str = "No existing todos";

const PRIORITIZATION_INSTRUCTIONS: &str = "Please prioritize the following todos by importance and urgency. \
Return only the todo titles in order of priority (most important first), \
one per line, exactly as they appear:";

const SUGGESTION_INSTRUCTIONS: &str = "Based on the following existing todos, suggest 3 new productive tasks that would \
complement this person's workflow. For each suggestion, provide the task and a priority level \
(LOW, MEDIUM, HIGH, URGENT). Format as: 'TASK_NAME | PRIORITY'";

/// Suggestions substituted when the completion service cannot be used.
pub const MOCK_SUGGESTIONS: [(&str, Priority); 3] = [
    ("Review and organize your email inbox", Priority::Medium),
    ("Plan tomorrow's priorities", Priority::High),
    ("Take a 15-minute break for mental wellness", Priority::Low),
];

// =============================================================================
// Rank Ordering
// =============================================================================

/// Sorts tasks by priority rank, most urgent first.
///
/// The sort is stable: tasks with equal priority keep their input order.
#[must_use]
pub fn sort_by_rank(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by_key(|task| task.priority.rank());
    tasks
}

/// Sorts tasks by rank, then due date (missing last), then newest first.
#[must_use]
pub fn sort_by_rank_then_due(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by(|left, right| {
        left.priority
            .rank()
            .cmp(&right.priority.rank())
            .then_with(|| compare_due_dates(left.due_at.as_ref(), right.due_at.as_ref()))
            .then_with(|| right.created_at.cmp(&left.created_at))
    });
    tasks
}

fn compare_due_dates(left: Option<&Timestamp>, right: Option<&Timestamp>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => left.cmp(right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// =============================================================================
// Prompt Rendering
// =============================================================================

/// Renders the task list sent with a prioritization request.
#[must_use]
pub fn prioritization_listing(tasks: &[Task]) -> String {
    tasks
        .iter()
        .map(|task| {
            let due = task
                .due_at
                .map_or_else(|| NO_DUE_DATE.to_string(), |due| due.to_string());
            format!("- {} (Priority: {}, Due: {})", task.title, task.priority, due)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the full prioritization prompt.
#[must_use]
pub fn prioritization_prompt(tasks: &[Task]) -> String {
    format!(
        "{PRIORITIZATION_INSTRUCTIONS}\n\n{}",
        prioritization_listing(tasks)
    )
}

/// Renders the existing workload used as context for suggestions.
#[must_use]
pub fn suggestion_context(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return NO_EXISTING_TODOS.to_string();
    }

    tasks
        .iter()
        .map(|task| format!("- {} ({})", task.title, task.priority))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the full suggestion prompt.
#[must_use]
pub fn suggestion_prompt(tasks: &[Task]) -> String {
    format!(
        "{SUGGESTION_INSTRUCTIONS}\n\nExisting todos:\n{}",
        suggestion_context(tasks)
    )
}

// =============================================================================
// Prioritization Response Parsing
// =============================================================================

/// Result of matching a model response against the input tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reordering {
    /// The input tasks in their new order.
    pub tasks: Vec<Task>,
    /// How many tasks were placed by a response line.
    pub matched: usize,
}

impl Reordering {
    /// Number of tasks appended because no response line named them.
    #[must_use]
    pub const fn unmatched(&self) -> usize {
        self.tasks.len() - self.matched
    }
}

/// Strips surrounding whitespace and one leading `-` or `*` bullet.
#[must_use]
pub fn clean_response_line(line: &str) -> &str {
    let trimmed = line.trim();
    trimmed
        .strip_prefix(['-', '*'])
        .map_or(trimmed, str::trim_start)
}

/// Reorders `tasks` following the titles listed in `response`.
///
/// Each response line claims the first unclaimed task whose title matches
/// case-insensitively. Lines naming no remaining task are ignored, and
/// tasks never named are appended in their original relative order, so the
/// result is always a permutation of the input.
#[must_use]
pub fn reorder_by_response(tasks: Vec<Task>, response: &str) -> Reordering {
    let titles: Vec<String> = tasks.iter().map(|task| task.title.to_lowercase()).collect();
    let mut claimed = vec![false; tasks.len()];
    let mut order: Vec<usize> = Vec::with_capacity(tasks.len());

    for line in response.lines() {
        let wanted = clean_response_line(line).to_lowercase();
        let found = titles
            .iter()
            .enumerate()
            .find(|(index, title)| !claimed[*index] && **title == wanted)
            .map(|(index, _)| index);

        if let Some(index) = found {
            claimed[index] = true;
            order.push(index);
        }
    }

    let matched = order.len();
    order.extend((0..tasks.len()).filter(|index| !claimed[*index]));

    let mut slots: Vec<Option<Task>> = tasks.into_iter().map(Some).collect();
    let tasks = order
        .into_iter()
        .filter_map(|index| slots[index].take())
        .collect();

    Reordering { tasks, matched }
}

// =============================================================================
// Suggestion Response Parsing
// =============================================================================

/// One `TASK | PRIORITY` line recovered from a model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSuggestion {
    pub suggested_task: String,
    pub priority: Priority,
    /// `false` when the priority column was not a known level and
    /// `priority` fell back to MEDIUM.
    pub priority_recognized: bool,
}

/// Removes a leading list number such as `"1. "`.
fn strip_list_number(text: &str) -> &str {
    let digits = text.len() - text.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return text;
    }
    text[digits..]
        .strip_prefix('.')
        .map_or(text, str::trim_start)
}

/// Parses a single response line.
///
/// Returns `None` for lines without a `|`, lines with fewer than two
/// non-trailing columns, and lines whose task text is empty after cleanup.
/// An unknown priority never rejects the line; it becomes MEDIUM.
#[must_use]
pub fn parse_suggestion_line(line: &str) -> Option<ParsedSuggestion> {
    if !line.contains('|') {
        return None;
    }

    let mut parts: Vec<&str> = line.split('|').collect();
    while parts.last().is_some_and(|part| part.is_empty()) {
        parts.pop();
    }
    if parts.len() < 2 {
        return None;
    }

    let suggested_task = strip_list_number(parts[0].trim());
    if suggested_task.is_empty() {
        return None;
    }

    let (priority, priority_recognized) = parts[1]
        .parse::<Priority>()
        .map_or((Priority::Medium, false), |priority| (priority, true));

    Some(ParsedSuggestion {
        suggested_task: suggested_task.to_string(),
        priority,
        priority_recognized,
    })
}

/// Parses every well-formed line of a suggestion response, in order.
#[must_use]
pub fn parse_suggestions(response: &str) -> Vec<ParsedSuggestion> {
    response.lines().filter_map(parse_suggestion_line).collect()
}

// =============================================================================
// Tests
// =============================================================================
