//! Khipu Event Ingestion Server
//!
//! Accepts raw security telemetry, routes each submission to a
//! type-specific detector adapter, grades the verdict into a severity tier
//! and durably records the event with its analysis.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        KHIPU SERVER                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌──────────────┐   ┌─────────────────────┐  │
//! │  │  API      │──►│  Ingest      │──►│  Detector adapters  │──┼──► detector API
//! │  │  (Axum)   │   │  Coordinator │   │  (reqwest, 30s)     │  │
//! │  └─────┬─────┘   └──────┬───────┘   └─────────────────────┘  │
//! │        │                ▼                                    │
//! │        │         ┌─────────────┐                             │
//! │        └────────►│ Event Store │  PostgreSQL | in-memory     │
//! │                  └─────────────┘                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod db;
pub mod detectors;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod models;
pub mod store;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};

pub use error::{AppError, AppResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub coordinator: ingest::IngestCoordinator,
    pub config: config::Config,
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))

        // Ingestion
        .route(
            "/api/v1/events/ingest",
            get(handlers::events::ingest_status).post(handlers::events::ingest),
        )

        // Read side
        .route("/api/v1/events", get(handlers::events::list))
        .route("/api/v1/events/stats", get(handlers::events::stats))

        // Direct analysis, not persisted
        .route("/api/v1/analyze/:detector", post(handlers::analyze::run))

        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
