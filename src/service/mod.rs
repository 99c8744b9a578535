//! AI-assisted engines.
//!
//! Both engines hold an optional completion client. `None` is the explicit
//! "not configured" variant and routes straight to the fallback path.

mod prioritization;
mod suggestion;

pub use prioritization::PrioritizationEngine;
pub use suggestion::SuggestionEngine;

use std::sync::Arc;

use crate::infrastructure::{CompletionClient, CompletionError, CompletionSettings};

/// Sends one prompt, bounded by `settings.timeout`.
///
/// An elapsed deadline is reported as `CompletionError::Timeout`.
#[allow(clippy::cast_possible_truncation)] // Timeout in ms will not exceed u64
async fn complete_with_deadline(
    client: &Arc<dyn CompletionClient>,
    settings: &CompletionSettings,
    prompt: String,
) -> Result<String, CompletionError> {
    let request = settings.request(prompt);
    tracing::debug!(
        client = client.client_name(),
        model = %request.model,
        prompt_length = request.prompt.len(),
        "Sending completion request"
    );

    tokio::time::timeout(settings.timeout, client.complete(&request))
        .await
        .map_err(|_| CompletionError::Timeout(settings.timeout.as_millis() as u64))?
}
