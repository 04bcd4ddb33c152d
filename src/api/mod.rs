pub mod handlers;
pub mod models;
pub mod router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::analytics::AnalyticsEngine;
use crate::exchange::FundingSource;

/// Shared state for the dashboard handlers: the loaded table behind the
/// analytics engine, plus the live exchange client for history passthrough.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AnalyticsEngine>,
    pub source: Arc<dyn FundingSource>,
}

pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    pub fn new(engine: AnalyticsEngine, source: Arc<dyn FundingSource>) -> Self {
        Self {
            state: AppState {
                engine: Arc::new(engine),
                source,
            },
        }
    }

    /// Binds the server to the given port and serves until Ctrl+C.
    pub async fn run(self, port: u16) -> anyhow::Result<()> {
        let app = router::build(self.state);
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        tracing::info!("dashboard API listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                tokio::signal::ctrl_c().await.ok();
                tracing::info!("Shutting down...");
            })
            .await?;

        Ok(())
    }
}
