//! API server implementation.
//!
//! Assembles the router (webhook, trigger, pages, health), owns the shared
//! application state, and runs the daily dispatch scheduler alongside the
//! HTTP listener.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use scout_core::store::{MemoryStore, ResultStore};
use scout_core::{Result, TaskRegistry};

use crate::config::Config;
use crate::upstream::TaskApiClient;

// ============================================================================
// Health Response
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// Immutable task registry.
    registry: Arc<TaskRegistry>,
    /// Result store (latest result per slug).
    store: Arc<dyn ResultStore>,
    /// Client for the external task-execution API.
    upstream: Arc<TaskApiClient>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("registry", &self.registry.len())
            .field("store", &"<ResultStore>")
            .field("upstream", &self.upstream)
            .finish()
    }
}

impl AppState {
    /// Creates new application state with the given store.
    #[must_use]
    pub fn new(config: Config, registry: TaskRegistry, store: Arc<dyn ResultStore>) -> Self {
        let upstream = Arc::new(TaskApiClient::new(
            config.upstream_url.clone(),
            config.api_key.clone(),
        ));
        Self {
            config,
            registry: Arc::new(registry),
            store,
            upstream,
        }
    }

    /// Creates new application state with an in-memory store (for testing).
    #[must_use]
    pub fn with_memory_store(config: Config, registry: TaskRegistry) -> Self {
        Self::new(config, registry, Arc::new(MemoryStore::new()))
    }

    /// Returns the task registry.
    #[must_use]
    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Returns the result store.
    #[must_use]
    pub fn store(&self) -> &dyn ResultStore {
        self.store.as_ref()
    }

    /// Returns the upstream API client.
    #[must_use]
    pub fn upstream(&self) -> &TaskApiClient {
        &self.upstream
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Health check endpoint handler.
///
/// Returns 200 OK if the service is alive. This is a shallow check that
/// doesn't verify dependencies.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

// ============================================================================
// Server
// ============================================================================

/// The scout API server.
pub struct Server {
    config: Config,
    registry: TaskRegistry,
    store: Arc<dyn ResultStore>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("registry", &self.registry.len())
            .field("store", &"<ResultStore>")
            .finish()
    }
}

impl Server {
    /// Creates a new server with an in-memory store.
    ///
    /// Use [`Server::with_store`] for production deployments.
    #[must_use]
    pub fn new(config: Config, registry: TaskRegistry) -> Self {
        Self {
            config,
            registry,
            store: Arc::new(MemoryStore::new()),
        }
    }

    /// Creates a new server with an explicit result store.
    #[must_use]
    pub fn with_store(
        config: Config,
        registry: TaskRegistry,
        store: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            config,
            registry,
            store,
        }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Creates the router with all routes and middleware.
    fn create_router(&self) -> (Router, Arc<AppState>) {
        let state = Arc::new(AppState::new(
            self.config.clone(),
            self.registry.clone(),
            Arc::clone(&self.store),
        ));

        let router = Router::new()
            .route("/health", get(health))
            .route("/run", get(crate::routes::trigger::run_trigger))
            .route("/webhook", post(crate::routes::webhook::receive))
            .route("/tasks.json", get(crate::routes::pages::tasks_json))
            .route("/", get(crate::routes::pages::listing))
            // Static routes above win over the slug capture.
            .route("/:slug", get(crate::routes::pages::detail))
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::clone(&state));

        (router, state)
    }

    /// Starts the server and blocks until shutdown.
    ///
    /// Spawns the daily dispatch scheduler (and an immediate dispatch pass
    /// when `dispatch_on_start` is set) before accepting connections.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails or the listener
    /// cannot bind.
    pub async fn serve(&self) -> Result<()> {
        self.validate_config()?;

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let (router, state) = self.create_router();

        let _scheduler = crate::schedule::spawn_daily(Arc::clone(&state));
        if self.config.dispatch_on_start {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                crate::dispatch::dispatch_all(&state).await;
            });
        }

        tracing::info!(
            http_port = self.config.http_port,
            tasks = self.registry.len(),
            "Starting scout API server"
        );

        let listener =
            tokio::net::TcpListener::bind(addr)
                .await
                .map_err(|e| scout_core::Error::Internal {
                    message: format!("failed to bind to {addr}: {e}"),
                })?;

        axum::serve(listener, router)
            .await
            .map_err(|e| scout_core::Error::Internal {
                message: format!("server error: {e}"),
            })?;

        Ok(())
    }

    /// Creates a test router for the server.
    ///
    /// This is useful for integration tests where you want to exercise the
    /// routes without binding to a port. No scheduler is spawned.
    #[doc(hidden)]
    #[must_use]
    pub fn test_router(&self) -> Router {
        self.create_router().0
    }

    fn validate_config(&self) -> Result<()> {
        if self.config.api_key.trim().is_empty() {
            return Err(scout_core::Error::config(
                "SCOUT_API_KEY is required and cannot be empty",
            ));
        }

        if !self.config.debug && self.config.callback_base_url.is_none() {
            return Err(scout_core::Error::config(
                "SCOUT_CALLBACK_BASE_URL is required when SCOUT_DEBUG=false",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_core::Error;

    fn test_config() -> Config {
        Config {
            debug: true,
            api_key: "test-key".to_string(),
            ..Config::default()
        }
    }

    fn registry() -> TaskRegistry {
        TaskRegistry::builtin().expect("builtin")
    }

    #[test]
    fn validate_rejects_empty_api_key() {
        let server = Server::new(
            Config {
                debug: true,
                ..Config::default()
            },
            registry(),
        );
        let err = server.validate_config().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("SCOUT_API_KEY"));
    }

    #[test]
    fn validate_requires_callback_url_outside_debug() {
        let server = Server::new(
            Config {
                debug: false,
                api_key: "test-key".to_string(),
                ..Config::default()
            },
            registry(),
        );
        let err = server.validate_config().unwrap_err();
        assert!(err.to_string().contains("SCOUT_CALLBACK_BASE_URL"));
    }

    #[test]
    fn validate_accepts_debug_config() {
        let server = Server::new(test_config(), registry());
        assert!(server.validate_config().is_ok());
    }
}
