//! Process bootstrap shared by the database-backed and mock binaries.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::build_router;
use crate::config::Config;
use crate::handlers::AppState;
use crate::store::Store;

/// Initializes tracing from `RUST_LOG`, with a debug default for this crate.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "techbook_api=debug,mock_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Serves the API over `store` until SIGINT/SIGTERM, then closes the store.
pub async fn run<S: Store>(store: S, config: Config) -> anyhow::Result<()> {
    let port = config.port;
    let state = Arc::new(AppState::new(store, config));
    let app = build_router(state.clone(), true)?;

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        "TechBook API listening on {} ({} store)",
        addr,
        state.store.backend_name()
    );
    tracing::info!("  GET  /api/health");
    tracing::info!("  GET  /api/produtos");
    tracing::info!("  GET  /api/produtos/:id");
    tracing::info!("  PUT  /api/produtos/:id/estoque");
    tracing::info!("  POST /api/contatos");
    tracing::info!("  GET  /api/contatos");
    tracing::info!("  GET  /api/estatisticas");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("HTTP server stopped");
    state.store.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received SIGTERM, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
