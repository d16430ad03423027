//! Khipu Event Ingestion Server binary

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use khipu_server::{
    config::{self, Config},
    create_router,
    detectors::{DetectorClient, Detectors},
    ingest::IngestCoordinator,
    store, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "khipu_server=debug,tower_http=debug".into());
    if config::environment_from_env() == config::PRODUCTION {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Khipu server starting...");

    // Load configuration
    let config = Config::from_env();
    tracing::info!("Environment: {}", config.environment);

    match &config.detector_api_url {
        Some(url) => tracing::info!("Detector API: {} (timeout {:?})", url, config.detector_timeout),
        None => tracing::warn!("Detector API not configured; events will be stored without analysis"),
    }

    let client = DetectorClient::new(config.detector_api_url.clone(), config.detector_timeout)
        .context("Failed to build detector HTTP client")?;

    let event_store = store::open(&config)
        .await
        .context("Failed to open event store")?;

    // Build application state
    let coordinator = IngestCoordinator::new(
        Detectors::remote(client),
        event_store.clone(),
        config.detector_timeout,
    );
    let state = AppState {
        coordinator,
        config: config.clone(),
    };

    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    event_store.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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

    tracing::info!("Shutdown signal received, draining connections...");
}
