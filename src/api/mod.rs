//! HTTP surface of the transcription service.
//!
//! One endpoint does the work (`POST /stt`), one reports liveness
//! (`GET /health`). CORS is wide open: all origins, methods and headers.

mod handlers;
mod routes;
pub mod state;

pub use handlers::{ApiError, ErrorResponse, HealthResponse, SttResponse};
pub use routes::create_router;
pub use state::ApiState;

use crate::config::Config;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

/// Start the API server. Runs until the process is killed.
pub async fn serve(state: ApiState, config: &Config) -> anyhow::Result<()> {
    let addr: SocketAddr = config
        .bind
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", config.bind, e))?;

    let router = create_router(state, config.swagger_ui);

    info!("Listening on http://{}", addr);
    if config.swagger_ui {
        info!("Swagger UI available at http://{}/swagger-ui/", addr);
    }

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
