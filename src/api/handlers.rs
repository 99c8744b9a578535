//! Shared handler state and the health endpoint.

use std::sync::Arc;

use axum::Json;

use crate::infrastructure::{CompletionClient, CompletionConfig, Repositories, TaskRepository};
use crate::service::{PrioritizationEngine, SuggestionEngine};

// =============================================================================
// Application State
// =============================================================================

/// Shared application dependencies.
///
/// Uses trait objects (`dyn`) so the `RepositoryFactory` can select the
/// store backend at runtime.
#[derive(Clone)]
pub struct AppState {
    /// Task repository for persistence.
    pub task_repository: Arc<dyn TaskRepository + Send + Sync>,
    /// Orders an owner's tasks by importance.
    pub prioritization_engine: PrioritizationEngine,
    /// Generates and stores follow-up task ideas.
    pub suggestion_engine: SuggestionEngine,
}

impl AppState {
    /// Creates a new `AppState` from initialized repositories.
    ///
    /// The completion client is built from `completion_config`; an
    /// unconfigured key leaves both engines on their fallback paths.
    #[must_use]
    pub fn from_repositories(repositories: Repositories, completion_config: &CompletionConfig) -> Self {
        Self::with_completion_client(
            repositories,
            completion_config.build_client(),
            completion_config,
        )
    }

    /// Creates a new `AppState` using an explicit completion client.
    #[must_use]
    pub fn with_completion_client(
        repositories: Repositories,
        client: Option<Arc<dyn CompletionClient>>,
        completion_config: &CompletionConfig,
    ) -> Self {
        let prioritization_engine =
            PrioritizationEngine::new(client.clone(), completion_config.prioritize_settings());
        let suggestion_engine = SuggestionEngine::new(
            repositories.suggestion_repository,
            client,
            completion_config.suggest_settings(),
        );

        Self {
            task_repository: repositories.task_repository,
            prioritization_engine,
            suggestion_engine,
        }
    }
}

// =============================================================================
// GET /health Handler
// =============================================================================

/// Health check response body.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// Health check endpoint.
///
/// # Response
///
/// - **200 OK**: Service is healthy
///
/// ```json
/// {
///   "status": "UP",
///   "service": "todo-ai-api",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP",
        service: "todo-ai-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::StubCompletionClient;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn test_health_check() {
        let Json(response) = health_check().await;

        assert_eq!(response.status, "UP");
        assert_eq!(response.service, "todo-ai-api");
        assert_eq!(response.version, env!("CARGO_PKG_VERSION"));
    }

    #[rstest]
    fn test_from_repositories_without_key_disables_ai() {
        let state =
            AppState::from_repositories(Repositories::in_memory(), &CompletionConfig::default());

        assert!(!state.prioritization_engine.is_ai_enabled());
        assert!(!state.suggestion_engine.is_ai_enabled());
    }

    #[rstest]
    fn test_with_completion_client_enables_ai() {
        let client: Arc<dyn CompletionClient> =
            Arc::new(StubCompletionClient::with_response("anything"));

        let state = AppState::with_completion_client(
            Repositories::in_memory(),
            Some(client),
            &CompletionConfig::default(),
        );

        assert!(state.prioritization_engine.is_ai_enabled());
        assert!(state.suggestion_engine.is_ai_enabled());
    }
}
