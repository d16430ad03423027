//! Event ingestion and read-side handlers

use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

use crate::{AppState, AppResult, AppError};
use crate::ingest::Submission;
use crate::models::{Event, EventFilter, EventStats};

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub success: bool,
    pub event: Event,
    pub message: &'static str,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListQuery {
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<i64>,
    #[serde(default)]
    pub threats_only: bool,
}

/// Liveness probe for ingestion clients
pub async fn ingest_status() -> Json<Value> {
    Json(json!({ "message": "Event ingestion endpoint is working" }))
}

/// Validate, analyze and store one event
pub async fn ingest(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<IngestResponse>> {
    let Json(body) = body.map_err(|e| {
        tracing::debug!("Rejected ingest body: {}", e);
        AppError::ValidationError("Invalid JSON body".to_string())
    })?;

    let event = state.coordinator.ingest(Submission::from_body(body)).await?;

    Ok(Json(IngestResponse {
        success: true,
        event,
        message: "Event ingested and analyzed successfully",
    }))
}

/// List events, newest first
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> AppResult<Json<Vec<Event>>> {
    let Query(query) = query.map_err(|e| AppError::ValidationError(e.body_text()))?;
    query.validate()?;

    let filter = EventFilter::new(query.limit, query.threats_only);
    let events = state.coordinator.store().list(filter).await?;
    Ok(Json(events))
}

/// Aggregate counts
pub async fn stats(State(state): State<AppState>) -> AppResult<Json<EventStats>> {
    let stats = state.coordinator.store().stats().await?;
    Ok(Json(stats))
}
