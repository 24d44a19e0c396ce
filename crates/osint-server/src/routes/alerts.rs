use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use osint_core::types::Severity;
use osint_core::workflow::AlertStatus;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AlertQuery {
    pub severity: Option<String>,
    pub status: Option<String>,
}

/// GET /api/alerts?severity=&status=: defaults to active alerts of any
/// severity.
pub async fn list_alerts(
    State(app): State<AppState>,
    Query(query): Query<AlertQuery>,
) -> Result<Json<Value>, AppError> {
    let severity = query
        .severity
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<Severity>)
        .transpose()?;
    let status = match query.status.as_deref() {
        None | Some("") => AlertStatus::Active,
        Some(s) => s.parse::<AlertStatus>()?,
    };
    let alerts = app.orchestrator.get_alerts(severity, status).await;
    Ok(Json(serde_json::to_value(alerts)?))
}

/// POST /api/alerts/{id}/acknowledge
pub async fn acknowledge_alert(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let alert = app.orchestrator.acknowledge_alert(&id).await?;
    Ok(Json(serde_json::to_value(alert)?))
}
