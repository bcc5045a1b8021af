mod chunker;
mod config;
mod embeddings;
mod errors;
mod generation;
mod intake;
mod metrics;
mod pdf;
mod retrieval;
mod routes;
mod services;
mod session;
mod vector_store;

#[cfg(test)]
mod test_support;

use crate::services::{AppState, CloudBackendFactory};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    dotenvy::dotenv().ok();
    let config = Arc::new(config::AppConfig::build()?);

    // 2. Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.server.rust_log))
        .init();

    info!("Starting chatpdf v{}", env!("CARGO_PKG_VERSION"));

    // 3. Metrics recorder + /metrics route
    let metrics_router = metrics::setup_metrics()?;

    // 4. App state: session registry plus the pipeline services. External
    //    clients are built per session from its credentials at connect time.
    let backends = Arc::new(CloudBackendFactory::new(config.clone()));
    let state = AppState::new(config.clone(), backends);

    // 5. Router
    let app = routes::create_router(state, metrics_router);

    // 6. Serve
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
