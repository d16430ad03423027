//! Direct detector analysis (nothing is persisted)

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::Value;

use crate::{AppState, AppResult, AppError};
use crate::detectors::{AdapterResult, DetectorKind};

/// Run one adapter against a JSON object body
pub async fn run(
    State(state): State<AppState>,
    Path(detector): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<AdapterResult>> {
    let kind = DetectorKind::parse(&detector)
        .ok_or_else(|| AppError::NotFound(format!("Unknown detector: {}", detector)))?;

    let Json(body) = body.map_err(|_| AppError::ValidationError("Invalid JSON body".to_string()))?;
    let Value::Object(fields) = body else {
        return Err(AppError::ValidationError("Data must be a JSON object".to_string()));
    };

    Ok(Json(state.coordinator.analyze(kind, fields).await))
}
