//! Repository factory for runtime backend selection.
//!
//! This module provides a factory pattern for creating the task and suggestion
//! stores based on environment configuration. It supports switching between
//! `InMemory` and `PostgreSQL` backends at runtime.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `in_memory` (default) | `postgres`
//! - `DATABASE_URL`: `PostgreSQL` connection URL (required when `STORAGE_MODE=postgres`)
//!
//! # Example
//!
//! ```ignore
//! use infrastructure::factory::{RepositoryConfig, RepositoryFactory};
//!
//! let config = RepositoryConfig::from_env()?;
//! let factory = RepositoryFactory::new(config);
//! let repositories = factory.create().await?;
//!
//! let tasks = repositories.task_repository.list_by_owner(&owner).await?;
//! ```

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use super::{
    InMemorySuggestionRepository, InMemoryTaskRepository, PostgresSuggestionRepository,
    PostgresTaskRepository, SuggestionRepository, TaskRepository, ensure_schema,
};

// =============================================================================
// Environment Parsing
// =============================================================================

/// Errors raised while reading a typed environment variable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// Invalid u64 value.
    #[error("Invalid u64 value for {name}: {message} (got '{value}')")]
    InvalidU64 {
        /// Variable name.
        name: String,
        /// Error message.
        message: String,
        /// Actual value.
        value: String,
    },
}

/// Parses a u64 from an environment variable.
///
/// Returns the default value if the variable is not set or blank.
/// Returns an error if the variable is set but contains an invalid value.
pub(crate) fn parse_env_u64(name: &str, default: u64) -> Result<u64, EnvParseError> {
    match env::var(name) {
        Ok(value) if value.trim().is_empty() => Ok(default),
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|error: std::num::ParseIntError| EnvParseError::InvalidU64 {
                name: name.to_string(),
                message: error.to_string(),
                value,
            }),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(error) => Err(EnvParseError::InvalidU64 {
            name: name.to_string(),
            message: error.to_string(),
            value: String::new(),
        }),
    }
}

// =============================================================================
// Configuration Types
// =============================================================================

/// Storage mode for tasks and suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// In-memory storage. Suitable for testing and development.
    #[default]
    InMemory,
    /// `PostgreSQL` storage for production use.
    Postgres,
}

impl FromStr for StorageMode {
    type Err = ConfigurationError;

    /// Parses a storage mode from a string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidStorageMode` if the string is not recognized.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(ConfigurationError::InvalidStorageMode(value.to_string())),
        }
    }
}

/// Configuration for repository factory.
///
/// Use `RepositoryConfigBuilder` for a fluent API to construct this.
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfig {
    /// Storage mode for tasks and suggestions.
    pub storage_mode: StorageMode,
    /// `PostgreSQL` connection URL (required when `storage_mode` is `Postgres`).
    pub database_url: Option<String>,
}

impl RepositoryConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RepositoryConfigBuilder {
        RepositoryConfigBuilder::default()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if:
    /// - `STORAGE_MODE` contains an invalid value
    /// - `DATABASE_URL` is missing when `STORAGE_MODE=postgres`
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let storage_mode = match env::var("STORAGE_MODE") {
            Ok(value) => value.parse()?,
            Err(env::VarError::NotPresent) => StorageMode::default(),
            Err(env::VarError::NotUnicode(_)) => {
                return Err(ConfigurationError::InvalidStorageMode(
                    "<non-UTF-8 value>".to_string(),
                ));
            }
        };

        // Empty or whitespace-only means unset
        let database_url = env::var("DATABASE_URL")
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let config = Self {
            storage_mode,
            database_url,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingDatabaseUrl` if `PostgreSQL` is
    /// selected without a URL.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if matches!(self.storage_mode, StorageMode::Postgres) && self.database_url.is_none() {
            return Err(ConfigurationError::MissingDatabaseUrl);
        }
        Ok(())
    }
}

/// Builder for `RepositoryConfig`.
///
/// # Example
///
/// ```ignore
/// let config = RepositoryConfig::builder()
///     .storage_mode(StorageMode::Postgres)
///     .database_url("postgres://localhost/todos")
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfigBuilder {
    storage_mode: StorageMode,
    database_url: Option<String>,
}

impl RepositoryConfigBuilder {
    /// Sets the storage mode.
    #[must_use]
    pub const fn storage_mode(mut self, mode: StorageMode) -> Self {
        self.storage_mode = mode;
        self
    }

    /// Sets the `PostgreSQL` database URL.
    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the configuration is invalid.
    pub fn build(self) -> Result<RepositoryConfig, ConfigurationError> {
        let config = RepositoryConfig {
            storage_mode: self.storage_mode,
            database_url: self.database_url,
        };

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Invalid storage mode value.
    #[error("Invalid storage mode: '{0}'. Expected 'in_memory' or 'postgres'")]
    InvalidStorageMode(String),

    /// Missing `DATABASE_URL` when storage mode is Postgres.
    #[error("DATABASE_URL environment variable is required when STORAGE_MODE=postgres")]
    MissingDatabaseUrl,

    /// A numeric environment variable could not be parsed.
    #[error("Environment variable parse error: {0}")]
    EnvParse(#[from] EnvParseError),

    /// A numeric value does not fit its target type.
    #[error("Value {value} for {name} is out of range")]
    OutOfRange {
        /// Variable name.
        name: String,
        /// Parsed value.
        value: u64,
    },

    /// A value that must be positive is zero.
    #[error("{0} must be greater than 0")]
    ZeroValue(String),

    /// The completion base URL is empty.
    #[error("OPENAI_BASE_URL must not be empty")]
    MissingBaseUrl,
}

/// Errors that can occur during factory initialization.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    DatabaseConnection(String),

    /// Schema creation failed.
    #[error("Schema initialization error: {0}")]
    SchemaInitialization(String),
}

// =============================================================================
// Repository Factory
// =============================================================================

/// Collection of initialized repositories.
///
/// All repositories are wrapped in `Arc` to allow sharing across threads.
#[derive(Clone)]
pub struct Repositories {
    /// Task store.
    pub task_repository: Arc<dyn TaskRepository + Send + Sync>,
    /// Suggestion store.
    pub suggestion_repository: Arc<dyn SuggestionRepository + Send + Sync>,
}

impl Repositories {
    /// Creates empty in-memory repositories.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            task_repository: Arc::new(InMemoryTaskRepository::new()),
            suggestion_repository: Arc::new(InMemorySuggestionRepository::new()),
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Repositories")
            .field("task_repository", &"Arc<dyn TaskRepository>")
            .field("suggestion_repository", &"Arc<dyn SuggestionRepository>")
            .finish()
    }
}

/// Factory for creating repository instances based on configuration.
///
/// # Example
///
/// ```ignore
/// let config = RepositoryConfig::from_env()?;
/// let factory = RepositoryFactory::new(config);
/// let repositories = factory.create().await?;
/// ```
#[derive(Debug, Clone)]
pub struct RepositoryFactory {
    config: RepositoryConfig,
}

impl RepositoryFactory {
    /// Creates a new repository factory with the given configuration.
    #[must_use]
    pub const fn new(config: RepositoryConfig) -> Self {
        Self { config }
    }

    /// Creates a new repository factory from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError::Configuration` if environment configuration is invalid.
    pub fn from_env() -> Result<Self, FactoryError> {
        let config = RepositoryConfig::from_env()?;
        Ok(Self::new(config))
    }

    /// Returns the configuration used by this factory.
    #[must_use]
    pub const fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Creates all repositories based on the configuration.
    ///
    /// For `PostgreSQL` this connects, then creates missing tables.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if the database connection or schema creation fails.
    pub async fn create(&self) -> Result<Repositories, FactoryError> {
        match self.config.storage_mode {
            StorageMode::InMemory => Ok(Repositories::in_memory()),
            StorageMode::Postgres => {
                let pool = self.create_postgres_pool().await?;
                ensure_schema(&pool)
                    .await
                    .map_err(|error| FactoryError::SchemaInitialization(error.to_string()))?;
                Ok(Self::create_postgres_repositories(pool))
            }
        }
    }

    /// Creates a `PostgreSQL` connection pool.
    async fn create_postgres_pool(&self) -> Result<PgPool, FactoryError> {
        let database_url = self
            .config
            .database_url
            .as_ref()
            .ok_or(ConfigurationError::MissingDatabaseUrl)?;

        PgPool::connect(database_url)
            .await
            .map_err(|error| FactoryError::DatabaseConnection(error.to_string()))
    }

    /// Creates `PostgreSQL`-backed repositories.
    fn create_postgres_repositories(pool: PgPool) -> Repositories {
        Repositories {
            task_repository: Arc::new(PostgresTaskRepository::new(pool.clone())),
            suggestion_repository: Arc::new(PostgresSuggestionRepository::new(pool)),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
