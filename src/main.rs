//! Todo AI API
//!
//! Owner-scoped todo service with language-model assisted prioritization
//! and task suggestions.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `in_memory` (default) | `postgres`
//! - `DATABASE_URL`: `PostgreSQL` connection URL (required when `STORAGE_MODE=postgres`)
//! - `OPENAI_API_KEY`: completion API key (unset or placeholder disables AI calls)
//! - `OPENAI_BASE_URL`, `OPENAI_TIMEOUT_SECS`, `OPENAI_PRIORITIZE_MODEL`,
//!   `OPENAI_PRIORITIZE_MAX_TOKENS`, `OPENAI_SUGGEST_MODEL`, `OPENAI_SUGGEST_MAX_TOKENS`
//! - `RUST_LOG`: Logging level (e.g., `debug`, `info`, `todo_ai_api=debug`)
//! - `HOST`: Server host address (default: `0.0.0.0`)
//! - `PORT`: Server port (default: `8080`)
//! - `WORKER_THREADS`: Number of tokio worker threads (default: logical CPU count)

use std::env;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todo_ai_api::api::{AppState, router};
use todo_ai_api::infrastructure::{CompletionConfig, RepositoryConfig, RepositoryFactory};

/// Worker-thread ceiling when the CPU count is unknown.
const FALLBACK_THREAD_LIMIT: usize = 64;

/// Resolves the `WORKER_THREADS` value against `limit`.
///
/// `None` means the runtime default. Zero or non-numeric values fall back to
/// the default and values above `limit` are capped.
fn resolve_worker_threads(raw: Option<&str>, limit: usize) -> Option<usize> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty())?;

    match raw.parse::<usize>() {
        Ok(0) | Err(_) => {
            eprintln!("Ignoring WORKER_THREADS='{raw}' (expected a positive integer)");
            None
        }
        Ok(threads) if threads > limit => {
            eprintln!("WORKER_THREADS={threads} capped to {limit}");
            Some(limit)
        }
        Ok(threads) => Some(threads),
    }
}

fn main() {
    dotenvy::dotenv().ok();

    let limit = std::thread::available_parallelism()
        .map_or(FALLBACK_THREAD_LIMIT, |parallelism| parallelism.get().saturating_mul(4));
    let worker_threads = resolve_worker_threads(env::var("WORKER_THREADS").ok().as_deref(), limit);

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(threads) = worker_threads {
        builder.worker_threads(threads);
    }

    let runtime = builder.build().expect("Failed to create tokio runtime");
    runtime.block_on(async_main(worker_threads));
}

async fn async_main(worker_threads: Option<usize>) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_ai_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(?worker_threads, "Starting Todo AI API");

    let config = match RepositoryConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!("Configuration error: {}", error);
            std::process::exit(1);
        }
    };

    tracing::info!(storage_mode = ?config.storage_mode, "Repository configuration loaded");

    let completion_config = match CompletionConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!("Completion configuration error: {}", error);
            std::process::exit(1);
        }
    };

    if completion_config.is_configured() {
        tracing::info!(
            base_url = %completion_config.base_url,
            prioritize_model = %completion_config.prioritize_model,
            suggest_model = %completion_config.suggest_model,
            "Completion client configured"
        );
    } else {
        tracing::warn!("OPENAI_API_KEY not configured, AI features use fallback behavior");
    }

    let factory = RepositoryFactory::new(config);
    let repositories = match factory.create().await {
        Ok(repositories) => {
            tracing::info!("Repositories initialized successfully");
            repositories
        }
        Err(error) => {
            tracing::error!("Failed to initialize repositories: {}", error);
            std::process::exit(1);
        }
    };

    let application_state = AppState::from_repositories(repositories, &completion_config);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let application = router(application_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(8080);

    let address: SocketAddr = match format!("{host}:{port}").parse() {
        Ok(address) => address,
        Err(error) => {
            tracing::error!(%error, "Invalid server address: {}:{}", host, port);
            std::process::exit(1);
        }
    };

    let listener = match TcpListener::bind(address).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%error, "Failed to bind to address {}", address);
            std::process::exit(1);
        }
    };

    match listener.local_addr() {
        Ok(address) => tracing::info!("Listening on {}", address),
        Err(error) => tracing::warn!(%error, "Could not determine local address"),
    }

    if let Err(error) = axum::serve(listener, application)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(%error, "Server error");
        std::process::exit(1);
    }

    tracing::info!("Server shutdown complete");
}

/// Handles graceful shutdown signals (SIGINT, SIGTERM).
///
/// On Unix both SIGINT and SIGTERM are handled; elsewhere only Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(error) => {
                tracing::warn!(%error, "Failed to install Ctrl+C handler");
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, None)]
    #[case(Some(""), None)]
    #[case(Some("  "), None)]
    #[case(Some("0"), None)]
    #[case(Some("many"), None)]
    #[case(Some("-2"), None)]
    #[case(Some(" 4 "), Some(4))]
    #[case(Some("16"), Some(16))]
    #[case(Some("17"), Some(16))]
    fn test_resolve_worker_threads(#[case] raw: Option<&str>, #[case] expected: Option<usize>) {
        assert_eq!(resolve_worker_threads(raw, 16), expected);
    }
}
