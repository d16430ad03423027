//! Event Store
//!
//! Durable, append-only record of submitted events. Only `insert` writes;
//! there is no update or delete.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{Config, StoreBackend};
use crate::models::{Event, EventFilter, EventStats, NewEvent};

pub use memory::MemoryEventStore;
pub use postgres::PgEventStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt event {id}: {reason}")]
    Corrupt { id: Uuid, reason: String },

    #[error("event store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Assign id and timestamp and durably write one event
    async fn insert(&self, event: NewEvent) -> Result<Event, StoreError>;

    /// Newest first
    async fn list(&self, filter: EventFilter) -> Result<Vec<Event>, StoreError>;

    async fn stats(&self) -> Result<EventStats, StoreError>;

    /// Release connections. Called once at shutdown.
    async fn close(&self) {}

    fn backend(&self) -> &'static str;
}

/// Open the backend selected by `config`; Postgres also gets its schema applied.
pub async fn open(config: &Config) -> Result<Arc<dyn EventStore>, StoreError> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory event store; events will not survive a restart");
            Ok(Arc::new(MemoryEventStore::new()))
        }
        StoreBackend::Postgres => {
            tracing::info!("Database: {}", config.redacted_database_url());
            let store = PgEventStore::connect(&config.database_url, config.database_max_connections).await?;
            Ok(Arc::new(store))
        }
    }
}
