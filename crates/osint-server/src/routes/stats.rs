use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

/// GET /api/stats: workflow counts per status, active alerts per severity.
pub async fn get_stats(State(app): State<AppState>) -> Result<Json<Value>, AppError> {
    let stats = app.orchestrator.stats().await;
    Ok(Json(serde_json::to_value(stats)?))
}
