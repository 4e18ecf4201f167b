//! HTTP surface for insight-rs
//!
//! Wraps a [`insight_research::ResearchPipeline`] in an axum router. The
//! `insight` binary in this crate serves it or runs one research request
//! from the command line.

pub mod error;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use routes::{ROOT_MESSAGE, router};
pub use state::AppState;

/// Serve `state` on `listener` until Ctrl-C
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
