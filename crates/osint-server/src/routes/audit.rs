use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
}

/// GET /api/investigations/{id}/audit?limit=: newest entries first.
pub async fn get_audit_trail(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Value>, AppError> {
    let entries = app.audit.get_by_investigation(&id, query.limit).await?;
    Ok(Json(serde_json::to_value(entries)?))
}
