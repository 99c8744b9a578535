//! Completion client for the AI-assisted features.
//!
//! This module provides the [`CompletionClient`] seam used by the
//! prioritization and suggestion engines, an `OpenAI`-compatible HTTP
//! implementation, and a stub for tests and offline runs.
//!
//! # API Details
//!
//! - Endpoint: `POST {base_url}/chat/completions`
//! - Auth: `Authorization: Bearer {api_key}`
//! - Body: `{ model, messages: [{ role: "user", content }], max_tokens }`
//! - Response: `{ choices: [{ message: { content } }] }`

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use super::factory::{ConfigurationError, parse_env_u64};

// =============================================================================
// Completion Error
// =============================================================================

/// Error type for completion requests.
///
/// Covers both real I/O failures and failures returned by stubs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    /// Failed to establish connection to the completion service.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out after the specified duration.
    #[error("Timeout after {0}ms")]
    Timeout(u64),

    /// Service answered with a non-success status.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Response body could not be read as a completion.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

// =============================================================================
// Completion Request
// =============================================================================

/// A single-prompt completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub model: String,
    pub max_output_tokens: u32,
}

/// Model, token limit, and deadline used by one engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSettings {
    pub model: String,
    pub max_output_tokens: u32,
    /// Upper bound on a whole completion call, enforced by the engines.
    pub timeout: Duration,
}

impl CompletionSettings {
    /// Settings used for prioritization when nothing is configured.
    #[must_use]
    pub fn prioritize_defaults() -> Self {
        Self {
            model: DEFAULT_PRIORITIZE_MODEL.to_string(),
            max_output_tokens: DEFAULT_PRIORITIZE_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Settings used for suggestion generation when nothing is configured.
    #[must_use]
    pub fn suggest_defaults() -> Self {
        Self {
            model: DEFAULT_SUGGEST_MODEL.to_string(),
            max_output_tokens: DEFAULT_SUGGEST_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Returns a copy with a different deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds a request for `prompt` with these settings.
    #[must_use]
    pub fn request(&self, prompt: impl Into<String>) -> CompletionRequest {
        CompletionRequest {
            prompt: prompt.into(),
            model: self.model.clone(),
            max_output_tokens: self.max_output_tokens,
        }
    }
}

// =============================================================================
// Completion Client Trait
// =============================================================================

/// Text-completion capability used by the engines.
///
/// Given a prompt, returns the model's free-form text response or an error.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends `request` and returns the response text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;

    /// Returns the client name for logging.
    fn client_name(&self) -> &'static str;
}

// =============================================================================
// OpenAI Completion Client
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// `OpenAI`-compatible chat-completions client.
pub struct OpenAiCompletionClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiCompletionClient {
    /// Creates a new client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Bearer token sent with every request.
    /// * `base_url` - API root, e.g. `https://api.openai.com/v1`.
    /// * `timeout` - Request timeout duration.
    #[must_use]
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

impl std::fmt::Debug for OpenAiCompletionClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("OpenAiCompletionClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    #[allow(clippy::cast_possible_truncation)] // Timeout in ms will not exceed u64
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let timeout_ms = self.timeout.as_millis() as u64;
        let body = ChatCompletionBody {
            model: &request.model,
            messages: [ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_output_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    CompletionError::Timeout(timeout_ms)
                } else if error.is_connect() {
                    CompletionError::ConnectionFailed(error.to_string())
                } else {
                    CompletionError::ServiceUnavailable(error.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(CompletionError::ServiceUnavailable(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|error| {
            if error.is_timeout() {
                CompletionError::Timeout(timeout_ms)
            } else {
                CompletionError::MalformedResponse(error.to_string())
            }
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::MalformedResponse("no choices".to_string()))?
            .message
            .content
            .ok_or_else(|| CompletionError::MalformedResponse("no message content".to_string()))
    }

    fn client_name(&self) -> &'static str {
        "openai"
    }
}

// =============================================================================
// Stub Completion Client (for testing)
// =============================================================================

/// Stub completion client for testing.
///
/// Always returns a fixed result without performing real I/O. Requests are
/// recorded so tests can inspect the prompts that were sent.
#[derive(Debug)]
pub struct StubCompletionClient {
    result: Result<String, CompletionError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl StubCompletionClient {
    fn new(result: Result<String, CompletionError>) -> Self {
        Self {
            result,
            delay: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Creates a stub that returns `Ok(response)`.
    #[must_use]
    pub fn with_response(response: impl Into<String>) -> Self {
        Self::new(Ok(response.into()))
    }

    /// Creates a stub that returns an error.
    #[must_use]
    pub fn with_error(error: CompletionError) -> Self {
        Self::new(Err(error))
    }

    /// Sleeps for `delay` before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns how many times `complete` was called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns a copy of every request received so far.
    pub async fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl CompletionClient for StubCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }

    fn client_name(&self) -> &'static str {
        "stub"
    }
}

// =============================================================================
// Completion Configuration
// =============================================================================

/// Placeholder key shipped in sample configuration; treated as "not configured".
pub const PLACEHOLDER_API_KEY: &str = "your-openai-api-key";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PRIORITIZE_MODEL: &str = "gpt-4o-mini";
const DEFAULT_PRIORITIZE_MAX_TOKENS: u32 = 500;
const DEFAULT_SUGGEST_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_SUGGEST_MAX_TOKENS: u32 = 300;

/// Configuration of the completion service.
///
/// Use `CompletionConfigBuilder` for a fluent API to construct this.
#[derive(Clone, PartialEq, Eq)]
pub struct CompletionConfig {
    /// API key; `None` means no client is configured.
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    pub prioritize_model: String,
    pub prioritize_max_tokens: u32,
    pub suggest_model: String,
    pub suggest_max_tokens: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            prioritize_model: DEFAULT_PRIORITIZE_MODEL.to_string(),
            prioritize_max_tokens: DEFAULT_PRIORITIZE_MAX_TOKENS,
            suggest_model: DEFAULT_SUGGEST_MODEL.to_string(),
            suggest_max_tokens: DEFAULT_SUGGEST_MAX_TOKENS,
        }
    }
}

impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CompletionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("prioritize_model", &self.prioritize_model)
            .field("prioritize_max_tokens", &self.prioritize_max_tokens)
            .field("suggest_model", &self.suggest_model)
            .field("suggest_max_tokens", &self.suggest_max_tokens)
            .finish()
    }
}

/// Returns `Some(key)` unless the key is blank or the placeholder.
fn usable_api_key(raw: Option<String>) -> Option<String> {
    raw.map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty() && key != PLACEHOLDER_API_KEY)
}

fn parse_env_u32(name: &str, default: u32) -> Result<u32, ConfigurationError> {
    let value = parse_env_u64(name, u64::from(default))?;
    u32::try_from(value).map_err(|_| ConfigurationError::OutOfRange {
        name: name.to_string(),
        value,
    })
}

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl CompletionConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CompletionConfigBuilder {
        CompletionConfigBuilder::default()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENAI_API_KEY`: API key (absent, blank, or the placeholder disables the client)
    /// - `OPENAI_BASE_URL`: API root (default: `https://api.openai.com/v1`)
    /// - `OPENAI_TIMEOUT_SECS`: Request timeout in seconds (default: 30)
    /// - `OPENAI_PRIORITIZE_MODEL`: Model for prioritization (default: `gpt-4o-mini`)
    /// - `OPENAI_PRIORITIZE_MAX_TOKENS`: Token limit for prioritization (default: 500)
    /// - `OPENAI_SUGGEST_MODEL`: Model for suggestions (default: `gpt-3.5-turbo`)
    /// - `OPENAI_SUGGEST_MAX_TOKENS`: Token limit for suggestions (default: 300)
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if a numeric variable is invalid or out of range.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let config = Self {
            api_key: usable_api_key(std::env::var("OPENAI_API_KEY").ok()),
            base_url: env_string("OPENAI_BASE_URL", DEFAULT_BASE_URL),
            timeout: Duration::from_secs(parse_env_u64(
                "OPENAI_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?),
            prioritize_model: env_string("OPENAI_PRIORITIZE_MODEL", DEFAULT_PRIORITIZE_MODEL),
            prioritize_max_tokens: parse_env_u32(
                "OPENAI_PRIORITIZE_MAX_TOKENS",
                DEFAULT_PRIORITIZE_MAX_TOKENS,
            )?,
            suggest_model: env_string("OPENAI_SUGGEST_MODEL", DEFAULT_SUGGEST_MODEL),
            suggest_max_tokens: parse_env_u32(
                "OPENAI_SUGGEST_MAX_TOKENS",
                DEFAULT_SUGGEST_MAX_TOKENS,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the timeout or a token limit is zero,
    /// or the base URL is empty.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.timeout.is_zero() {
            return Err(ConfigurationError::ZeroValue("OPENAI_TIMEOUT_SECS".to_string()));
        }
        if self.prioritize_max_tokens == 0 {
            return Err(ConfigurationError::ZeroValue(
                "OPENAI_PRIORITIZE_MAX_TOKENS".to_string(),
            ));
        }
        if self.suggest_max_tokens == 0 {
            return Err(ConfigurationError::ZeroValue(
                "OPENAI_SUGGEST_MAX_TOKENS".to_string(),
            ));
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigurationError::MissingBaseUrl);
        }
        Ok(())
    }

    /// Returns `true` if an API key is present.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Settings for the prioritization engine.
    #[must_use]
    pub fn prioritize_settings(&self) -> CompletionSettings {
        CompletionSettings {
            model: self.prioritize_model.clone(),
            max_output_tokens: self.prioritize_max_tokens,
            timeout: self.timeout,
        }
    }

    /// Settings for the suggestion engine.
    #[must_use]
    pub fn suggest_settings(&self) -> CompletionSettings {
        CompletionSettings {
            model: self.suggest_model.clone(),
            max_output_tokens: self.suggest_max_tokens,
            timeout: self.timeout,
        }
    }

    /// Builds the `OpenAI` client, or `None` when no API key is configured.
    #[must_use]
    pub fn build_client(&self) -> Option<Arc<dyn CompletionClient>> {
        self.api_key.as_ref().map(|api_key| {
            Arc::new(OpenAiCompletionClient::new(
                api_key.clone(),
                self.base_url.clone(),
                self.timeout,
            )) as Arc<dyn CompletionClient>
        })
    }
}

/// Builder for `CompletionConfig`.
///
/// # Example
///
/// ```ignore
/// let config = CompletionConfig::builder()
///     .api_key("sk-...")
///     .base_url("http://localhost:8081/v1")
///     .timeout(Duration::from_secs(5))
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct CompletionConfigBuilder {
    config: CompletionConfig,
}

impl CompletionConfigBuilder {
    /// Sets the API key; blank keys and the placeholder leave the client unconfigured.
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = usable_api_key(Some(api_key.into()));
        self
    }

    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    #[must_use]
    pub fn prioritize_model(mut self, model: impl Into<String>, max_tokens: u32) -> Self {
        self.config.prioritize_model = model.into();
        self.config.prioritize_max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn suggest_model(mut self, model: impl Into<String>, max_tokens: u32) -> Self {
        self.config.suggest_model = model.into();
        self.config.suggest_max_tokens = max_tokens;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the configuration is invalid.
    pub fn build(self) -> Result<CompletionConfig, ConfigurationError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// =============================================================================
// Tests
// =============================================================================
