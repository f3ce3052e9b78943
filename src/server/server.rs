//! Status HTTP server with axum router and graceful shutdown.

use axum::routing::{get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::error::ServerError;
use super::handlers::{
    get_health, get_knowledge_status, get_models, post_clear_cache, post_mapping, post_prompt,
    post_reload, put_intelligent, AppState,
};
use crate::config::ServerConfig;

/// HTTP server exposing knowledge status and prompt composition.
pub struct StatusServer {
    config: ServerConfig,
    state: AppState,
}

impl StatusServer {
    /// Create a new server with default configuration.
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self {
            config: ServerConfig::default(),
            state,
        }
    }

    /// Set the server configuration (builder pattern).
    #[must_use]
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the configured address as a string.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Build the axum router with all routes and middleware.
    pub fn build_router(&self) -> Router {
        let router = Router::new()
            .route("/health", get(get_health))
            .route("/api/models", get(get_models))
            .route("/api/knowledge/status", get(get_knowledge_status))
            .route("/api/knowledge/reload", post(post_reload))
            .route("/api/knowledge/clear-cache", post(post_clear_cache))
            .route("/api/knowledge/intelligent", put(put_intelligent))
            .route("/api/knowledge/mappings", post(post_mapping))
            .route("/api/prompt", post(post_prompt))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http());

        if self.config.cors_permissive {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// Run the server until `cancel` fires, then shut down gracefully.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::BindError` if the address cannot be bound, or
    /// `ServerError::Serve` if serving fails.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ServerError> {
        let address = self.address();
        let app = self.build_router();

        tracing::info!(address = %address, "Starting status server");

        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::BindError {
                address: address.clone(),
                source,
            })?;

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
                tracing::info!("Status server shutting down gracefully");
            })
            .await?;
        Ok(())
    }
}
