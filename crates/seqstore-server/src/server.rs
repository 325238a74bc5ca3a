use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// seqstore HTTP server.
pub struct SeqstoreServer {
    config: ServiceConfig,
    state: AppState,
}

impl SeqstoreServer {
    /// Validate the configuration and build the store. Fails on missing
    /// extension, ACL or bucket.
    pub fn new(config: ServiceConfig) -> ServerResult<Self> {
        let state = AppState::from_config(&config)?;
        Ok(Self { config, state })
    }

    /// Serve with an already-built state.
    pub fn with_state(config: ServiceConfig, state: AppState) -> Self {
        Self { config, state }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = build_router(self.state);
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            backend = ?self.config.backend,
            prefix = %self.config.prefix,
            "seqstore server listening"
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
