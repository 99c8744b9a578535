//! Suggestion engine.

use std::sync::Arc;

use crate::domain::{
    MOCK_SUGGESTIONS, NewSuggestion, OwnerId, Priority, Suggestion, Task, parse_suggestions,
    suggestion_prompt,
};
use crate::infrastructure::{
    CompletionClient, CompletionSettings, RepositoryError, SuggestionRepository,
};

use super::complete_with_deadline;

/// Generates, stores and lists AI suggestions for an owner.
#[derive(Clone)]
pub struct SuggestionEngine {
    store: Arc<dyn SuggestionRepository + Send + Sync>,
    client: Option<Arc<dyn CompletionClient>>,
    settings: CompletionSettings,
}

impl SuggestionEngine {
    #[must_use]
    pub fn new(
        store: Arc<dyn SuggestionRepository + Send + Sync>,
        client: Option<Arc<dyn CompletionClient>>,
        settings: CompletionSettings,
    ) -> Self {
        Self {
            store,
            client,
            settings,
        }
    }

    /// Returns `true` if a completion client is configured.
    #[must_use]
    pub const fn is_ai_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Generates new suggestions from `tasks` and persists them for `owner`.
    ///
    /// Falls back to the fixed mock set when no client is configured or the
    /// call fails. Suggestions that cannot be stored are logged and dropped.
    pub async fn generate_suggestions(&self, owner: &OwnerId, tasks: &[Task]) -> Vec<Suggestion> {
        tracing::info!(owner_id = %owner, task_count = tasks.len(), "Starting suggestion generation");

        let Some(client) = &self.client else {
            tracing::warn!(
                owner_id = %owner,
                "Completion client not configured, using mock suggestions"
            );
            return self.persist_mock_suggestions(owner).await;
        };

        let prompt = suggestion_prompt(tasks);
        match complete_with_deadline(client, &self.settings, prompt).await {
            Ok(response) => {
                tracing::debug!(%response, "Completion response received");
                let parsed = parse_suggestions(&response);
                let mut saved = Vec::with_capacity(parsed.len());
                for suggestion in parsed {
                    if !suggestion.priority_recognized {
                        tracing::warn!(
                            suggested_task = %suggestion.suggested_task,
                            "Unrecognized priority, defaulting to MEDIUM"
                        );
                    }
                    if let Some(stored) = self
                        .persist(owner, suggestion.suggested_task, suggestion.priority)
                        .await
                    {
                        saved.push(stored);
                    }
                }
                tracing::info!(owner_id = %owner, count = saved.len(), "Saved parsed suggestions");
                saved
            }
            Err(error) => {
                tracing::error!(
                    owner_id = %owner,
                    %error,
                    "Suggestion generation failed, using mock suggestions"
                );
                self.persist_mock_suggestions(owner).await
            }
        }
    }

    /// Lists every stored suggestion of `owner`, newest first.
    ///
    /// # Errors
    ///
    /// Returns the store error unchanged.
    pub async fn user_suggestions(
        &self,
        owner: &OwnerId,
    ) -> Result<Vec<Suggestion>, RepositoryError> {
        let suggestions = self.store.list_by_owner(owner).await?;
        tracing::debug!(owner_id = %owner, count = suggestions.len(), "Retrieved suggestions");
        Ok(suggestions)
    }

    /// Deletes every stored suggestion of `owner` and returns the count.
    ///
    /// # Errors
    ///
    /// Returns the store error unchanged.
    pub async fn clear_suggestions(&self, owner: &OwnerId) -> Result<u64, RepositoryError> {
        let deleted = self.store.delete_by_owner(owner).await?;
        tracing::info!(owner_id = %owner, deleted, "Cleared suggestions");
        Ok(deleted)
    }

    async fn persist_mock_suggestions(&self, owner: &OwnerId) -> Vec<Suggestion> {
        let mut saved = Vec::with_capacity(MOCK_SUGGESTIONS.len());
        for (text, priority) in MOCK_SUGGESTIONS {
            if let Some(stored) = self.persist(owner, text.to_string(), priority).await {
                saved.push(stored);
            }
        }
        tracing::info!(owner_id = %owner, count = saved.len(), "Created mock suggestions");
        saved
    }

    async fn persist(
        &self,
        owner: &OwnerId,
        suggested_task: String,
        priority: Priority,
    ) -> Option<Suggestion> {
        match self
            .store
            .insert(NewSuggestion::new(*owner, suggested_task, priority))
            .await
        {
            Ok(stored) => {
                tracing::debug!(
                    suggestion_id = %stored.suggestion_id,
                    suggested_task = %stored.suggested_task,
                    priority = %stored.priority,
                    "Saved suggestion"
                );
                Some(stored)
            }
            Err(error) => {
                tracing::error!(owner_id = %owner, %error, "Failed to save suggestion");
                None
            }
        }
    }
}

impl std::fmt::Debug for SuggestionEngine {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SuggestionEngine")
            .field("store", &"Arc<dyn SuggestionRepository>")
            .field("client", &self.client.as_ref().map(|client| client.client_name()))
            .field("settings", &self.settings)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
