//! HTTP server with axum router and graceful shutdown.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::error::ServerError;
use super::handlers::{
    get_default_docs, get_docs, get_latest_spec, get_spec, get_status, get_versions, post_sync,
    AppState,
};
use crate::config::ServerConfig;
use crate::knowledge::KnowledgeBaseManager;

/// Serves the knowledge base over HTTP.
pub struct SpecServer {
    config: ServerConfig,
    state: AppState,
    cancel: CancellationToken,
}

impl SpecServer {
    /// Create a server with default configuration.
    #[must_use]
    pub fn new(knowledge: Arc<KnowledgeBaseManager>, cancel: CancellationToken) -> Self {
        Self {
            config: ServerConfig::default(),
            state: AppState::new(knowledge),
            cancel,
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
        self.config.address()
    }

    /// Build the axum router with all routes and middleware.
    pub fn build_router(&self) -> Router {
        let router = Router::new()
            .route("/api/versions", get(get_versions))
            .route("/api/spec", get(get_latest_spec))
            .route("/api/spec/:version", get(get_spec))
            .route("/api/docs", get(get_default_docs))
            .route("/api/docs/:topic", get(get_docs))
            .route("/api/sync", post(post_sync))
            .route("/api/status", get(get_status))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http());

        if self.config.cors_permissive {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// Bind the configured address and serve until the cancellation token
    /// fires, then shut down gracefully.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or serve.
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::BindError {
                address: addr.clone(),
                source,
            })?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    ///
    /// # Errors
    ///
    /// Returns an error if serving fails.
    pub async fn serve(self, listener: TcpListener) -> Result<(), ServerError> {
        let cancel = self.cancel.clone();
        let app = self.build_router();

        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "Starting knowledge base server");
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
                tracing::info!("Knowledge base server shutting down gracefully");
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> SpecServer {
        let manager = KnowledgeBaseManager::new(std::env::temp_dir().join("mcpguide-server-test"));
        SpecServer::new(Arc::new(manager), CancellationToken::new())
    }

    #[test]
    fn test_server_address() {
        assert_eq!(server().address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_server_with_config() {
        let server = server().with_config(ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_permissive: false,
        });

        assert_eq!(server.address(), "0.0.0.0:8080");
        assert!(!server.config.cors_permissive);
    }

    #[test]
    fn test_build_router() {
        // Just verify the router builds without panicking
        let _router = server().build_router();
    }

    #[tokio::test]
    async fn test_serve_stops_on_cancel() {
        let cancel = CancellationToken::new();
        let manager = KnowledgeBaseManager::new(std::env::temp_dir().join("mcpguide-server-test"));
        let server = SpecServer::new(Arc::new(manager), cancel.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let handle = tokio::spawn(server.serve(listener));
        cancel.cancel();

        assert!(handle.await.unwrap().is_ok());
    }
}
