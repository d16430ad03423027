//! PostgreSQL event store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use super::{EventStore, StoreError};
use crate::db;
use crate::models::{Event, EventFilter, EventKind, EventStats, NewEvent, Severity};

#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

/// Row as stored; kind and severity are text columns
#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    #[sqlx(rename = "type")]
    kind: String,
    raw_data: serde_json::Value,
    analysis_result: Option<serde_json::Value>,
    is_threat: bool,
    severity: String,
    confidence: f64,
    created_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let kind = EventKind::parse(&row.kind).ok_or_else(|| StoreError::Corrupt {
            id: row.id,
            reason: format!("unknown type '{}'", row.kind),
        })?;
        let severity = Severity::parse(&row.severity).ok_or_else(|| StoreError::Corrupt {
            id: row.id,
            reason: format!("unknown severity '{}'", row.severity),
        })?;

        Ok(Event {
            id: row.id,
            kind,
            raw_data: row.raw_data,
            analysis_result: row.analysis_result,
            is_threat: row.is_threat,
            severity,
            confidence: row.confidence,
            created_at: row.created_at,
        })
    }
}

impl PgEventStore {
    /// Connect and apply the schema
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = db::create_pool(database_url, max_connections).await?;

        tracing::info!("Running database migrations...");
        db::run_migrations(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn insert(&self, event: NewEvent) -> Result<Event, StoreError> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            INSERT INTO events (type, raw_data, analysis_result, is_threat, severity, confidence)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#
        )
        .bind(event.kind.as_str())
        .bind(&event.raw_data)
        .bind(&event.analysis_result)
        .bind(event.is_threat)
        .bind(event.severity.as_str())
        .bind(event.confidence)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn list(&self, filter: EventFilter) -> Result<Vec<Event>, StoreError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT * FROM events
            WHERE ($1 = false OR is_threat = true)
            ORDER BY created_at DESC
            LIMIT $2
            "#
        )
        .bind(filter.threats_only)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Event::try_from).collect()
    }

    async fn stats(&self) -> Result<EventStats, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) as total,
                COUNT(*) FILTER (WHERE is_threat) as threats,
                COUNT(*) FILTER (WHERE severity = 'critical') as critical
            FROM events
            "#
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(EventStats {
            total: row.get("total"),
            threats: row.get("threats"),
            critical: row.get("critical"),
        })
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
