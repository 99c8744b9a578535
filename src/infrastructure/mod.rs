//! Infrastructure layer for the todo service.
//!
//! This module contains the store traits and their in-memory and
//! `PostgreSQL` implementations, the completion client, and the
//! configuration-driven factory.

pub mod completion;
pub mod factory;
mod in_memory;
mod postgres;
mod repository;

pub use completion::{
    CompletionClient, CompletionConfig, CompletionConfigBuilder, CompletionError,
    CompletionRequest, CompletionSettings, OpenAiCompletionClient, PLACEHOLDER_API_KEY,
    StubCompletionClient,
};
pub use factory::{
    ConfigurationError, EnvParseError, FactoryError, Repositories, RepositoryConfig,
    RepositoryConfigBuilder, RepositoryFactory, StorageMode,
};
pub use in_memory::{InMemorySuggestionRepository, InMemoryTaskRepository};
pub use postgres::{PostgresSuggestionRepository, PostgresTaskRepository, ensure_schema};
pub use repository::{RepositoryError, SuggestionRepository, TaskRepository};
