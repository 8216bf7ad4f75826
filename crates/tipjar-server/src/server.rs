use std::sync::Arc;

use tipjar_sdk::TipJar;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;

/// Tipjar HTTP server.
pub struct TipjarServer {
    config: ServerConfig,
    jar: Arc<TipJar>,
}

impl TipjarServer {
    /// Server over a fresh, empty `TipJar` built from `config.tipjar`.
    pub fn new(config: ServerConfig) -> Self {
        let jar = Arc::new(TipJar::new(config.tipjar.clone()));
        Self { config, jar }
    }

    /// Server over an existing `TipJar`, e.g. one imported from a snapshot.
    pub fn with_tipjar(config: ServerConfig, jar: Arc<TipJar>) -> Self {
        Self { config, jar }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn tipjar(&self) -> &Arc<TipJar> {
        &self.jar
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(Arc::clone(&self.jar))
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            bind_addr = %self.config.bind_addr,
            asset = %self.config.tipjar.asset,
            "tipjar server listening"
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
