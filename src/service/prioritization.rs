//! Prioritization engine.

use std::sync::Arc;

use crate::domain::{Task, prioritization_prompt, reorder_by_response, sort_by_rank};
use crate::infrastructure::{CompletionClient, CompletionSettings};

use super::complete_with_deadline;

/// Reorders an owner's tasks by importance.
///
/// With a client, the model's answer decides the order. Without one, tasks
/// are sorted by priority rank. When the call fails, the input order is
/// returned unchanged.
#[derive(Clone)]
pub struct PrioritizationEngine {
    client: Option<Arc<dyn CompletionClient>>,
    settings: CompletionSettings,
}

impl PrioritizationEngine {
    #[must_use]
    pub fn new(client: Option<Arc<dyn CompletionClient>>, settings: CompletionSettings) -> Self {
        Self { client, settings }
    }

    /// Returns `true` if a completion client is configured.
    #[must_use]
    pub const fn is_ai_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Prioritizes `tasks`.
    ///
    /// The result is always a permutation of the input.
    pub async fn prioritize(&self, tasks: Vec<Task>) -> Vec<Task> {
        let owner_id = tasks.first().map(|task| task.owner_id.to_string());
        tracing::info!(?owner_id, task_count = tasks.len(), "Starting prioritization");

        if tasks.is_empty() {
            tracing::info!("No todos to prioritize, returning empty list");
            return tasks;
        }

        let Some(client) = &self.client else {
            tracing::warn!(
                ?owner_id,
                "Completion client not configured, using rank-based prioritization"
            );
            let sorted = sort_by_rank(tasks);
            tracing::debug!(task_count = sorted.len(), "Rank-based prioritization completed");
            return sorted;
        };

        let prompt = prioritization_prompt(&tasks);
        match complete_with_deadline(client, &self.settings, prompt).await {
            Ok(response) => {
                tracing::debug!(%response, "Completion response received");
                let reordering = reorder_by_response(tasks, &response);
                tracing::info!(
                    ?owner_id,
                    matched = reordering.matched,
                    unmatched = reordering.unmatched(),
                    "Prioritization completed"
                );
                reordering.tasks
            }
            Err(error) => {
                tracing::error!(
                    ?owner_id,
                    %error,
                    "Prioritization failed, returning tasks in original order"
                );
                tasks
            }
        }
    }
}

impl std::fmt::Debug for PrioritizationEngine {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("PrioritizationEngine")
            .field("client", &self.client.as_ref().map(|client| client.client_name()))
            .field("settings", &self.settings)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewTask, OwnerId, Priority, TaskId, Timestamp};
    use crate::infrastructure::{CompletionError, StubCompletionClient};
    use rstest::rstest;
    use std::time::Duration;

    fn task(owner: OwnerId, title: &str, priority: Priority) -> Task {
        Task::from_new(
            TaskId::generate_v7(),
            NewTask::new(owner, title).with_priority(priority),
            Timestamp::now(),
        )
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|task| task.title.as_str()).collect()
    }

    fn sample_tasks() -> Vec<Task> {
        let owner = OwnerId::generate();
        vec![
            task(owner, "A", Priority::High),
            task(owner, "B", Priority::Low),
            task(owner, "C", Priority::Urgent),
        ]
    }

    fn engine_with(stub: StubCompletionClient) -> (PrioritizationEngine, Arc<StubCompletionClient>) {
        let stub = Arc::new(stub);
        let engine = PrioritizationEngine::new(
            Some(Arc::clone(&stub) as Arc<dyn CompletionClient>),
            CompletionSettings::prioritize_defaults(),
        );
        (engine, stub)
    }

    #[rstest]
    #[tokio::test]
    async fn test_prioritize_empty_makes_no_call() {
        let (engine, stub) = engine_with(StubCompletionClient::with_response("A"));

        let result = engine.prioritize(Vec::new()).await;

        assert!(result.is_empty());
        assert_eq!(stub.call_count(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_prioritize_without_client_sorts_by_rank() {
        let owner = OwnerId::generate();
        let tasks = vec![
            task(owner, "low", Priority::Low),
            task(owner, "medium-1", Priority::Medium),
            task(owner, "urgent", Priority::Urgent),
            task(owner, "medium-2", Priority::Medium),
            task(owner, "high", Priority::High),
        ];
        let engine = PrioritizationEngine::new(None, CompletionSettings::prioritize_defaults());

        let result = engine.prioritize(tasks).await;

        assert!(!engine.is_ai_enabled());
        assert_eq!(
            titles(&result),
            vec!["urgent", "high", "medium-1", "medium-2", "low"]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_prioritize_follows_model_response() {
        let (engine, stub) = engine_with(StubCompletionClient::with_response("C\nA\nB"));

        let result = engine.prioritize(sample_tasks()).await;

        assert_eq!(titles(&result), vec!["C", "A", "B"]);
        let requests = stub.recorded_requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gpt-4o-mini");
        assert_eq!(requests[0].max_output_tokens, 500);
        assert!(requests[0].prompt.contains("- A (Priority: HIGH, Due: No due date)"));
    }

    #[rstest]
    #[tokio::test]
    async fn test_prioritize_ignores_unknown_titles() {
        let owner = OwnerId::generate();
        let tasks = vec![
            task(owner, "A", Priority::Medium),
            task(owner, "B", Priority::Medium),
        ];
        let (engine, _) = engine_with(StubCompletionClient::with_response("Z\nA"));

        let result = engine.prioritize(tasks).await;

        assert_eq!(titles(&result), vec!["A", "B"]);
    }

    #[rstest]
    #[case(CompletionError::ServiceUnavailable("HTTP 500".to_string()))]
    #[case(CompletionError::MalformedResponse("no choices".to_string()))]
    #[case(CompletionError::ConnectionFailed("refused".to_string()))]
    #[tokio::test]
    async fn test_prioritize_failure_returns_original_order(#[case] error: CompletionError) {
        let (engine, _) = engine_with(StubCompletionClient::with_error(error));

        let result = engine.prioritize(sample_tasks()).await;

        assert_eq!(titles(&result), vec!["A", "B", "C"]);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_prioritize_timeout_returns_original_order() {
        let stub = Arc::new(
            StubCompletionClient::with_response("C\nB\nA").with_delay(Duration::from_secs(60)),
        );
        let engine = PrioritizationEngine::new(
            Some(Arc::clone(&stub) as Arc<dyn CompletionClient>),
            CompletionSettings::prioritize_defaults().with_timeout(Duration::from_secs(1)),
        );

        let result = engine.prioritize(sample_tasks()).await;

        assert_eq!(titles(&result), vec!["A", "B", "C"]);
        assert_eq!(stub.call_count(), 1);
    }
}
