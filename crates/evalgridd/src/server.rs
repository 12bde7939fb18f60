//! HTTP server setup: routes, shared state, listener.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use evalgrid_core::RunHistory;
use evalgrid_orchestrator::JobScheduler;

use crate::handlers::{
    cancel_run, get_suggestions, get_status, health_check, submit_run, ApiState,
};

/// Main API server
pub struct ApiServer {
    port: u16,
    state: Arc<ApiState>,
}

impl ApiServer {
    pub fn new(port: u16, scheduler: Arc<JobScheduler>, history: Arc<dyn RunHistory>) -> Self {
        let state = Arc::new(ApiState { scheduler, history });
        Self { port, state }
    }

    /// Router over the shared state; split out so tests can drive it
    /// without binding a socket.
    pub fn router(state: Arc<ApiState>) -> Router {
        Router::new()
            .route("/benchmark/run", post(submit_run))
            .route("/benchmark/run/:job_id/status", get(get_status))
            .route("/benchmark/run/:job_id/cancel", post(cancel_run))
            .route("/benchmark/suggestions", get(get_suggestions))
            .route("/health", get(health_check))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bind and serve until the process is stopped.
    pub async fn start(&self) -> Result<()> {
        let app = Self::router(self.state.clone());
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("evalgridd listening on {}", addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| anyhow::anyhow!("server error: {e}"))?;
        Ok(())
    }
}
