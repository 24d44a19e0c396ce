use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use osint_core::workflow::WorkflowSpec;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/workflows: summaries of every workflow.
pub async fn list_workflows(State(app): State<AppState>) -> Result<Json<Value>, AppError> {
    let summaries = app.orchestrator.get_all_workflows().await;
    Ok(Json(serde_json::to_value(summaries)?))
}

/// POST /api/workflows: register a pending workflow.
pub async fn create_workflow(
    State(app): State<AppState>,
    Json(spec): Json<WorkflowSpec>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if spec.name.trim().is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    if spec.objective.trim().is_empty() {
        return Err(AppError::bad_request("objective must not be empty"));
    }
    let id = app.orchestrator.create_workflow(spec).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// GET /api/workflows/{id}: full workflow with history.
pub async fn get_workflow(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let workflow = app.orchestrator.get_workflow_status(&id).await?;
    Ok(Json(serde_json::to_value(workflow)?))
}

/// POST /api/workflows/{id}/execute: run once and return the result or
/// `{"error": ...}`.
pub async fn execute_workflow(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    app.orchestrator.get_workflow_status(&id).await?;
    let outcome = app.orchestrator.execute_workflow(&id).await;
    Ok(Json(serde_json::to_value(outcome)?))
}

/// POST /api/workflows/{id}/schedule
pub async fn schedule_workflow(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    app.orchestrator.schedule_workflow(&id).await?;
    Ok(Json(json!({ "id": id, "scheduled": true })))
}

#[derive(Debug, Deserialize)]
pub struct MonitorParams {
    pub interval_secs: Option<u64>,
}

/// POST /api/workflows/{id}/monitor?interval_secs=N
pub async fn monitor_workflow(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<MonitorParams>,
) -> Result<Json<Value>, AppError> {
    let interval = params.interval_secs.map(Duration::from_secs);
    app.orchestrator.continuous_monitoring(&id, interval).await?;
    let workflow = app.orchestrator.get_workflow_status(&id).await?;
    Ok(Json(json!({
        "id": id,
        "monitoring": true,
        "check_interval_secs": workflow.check_interval_secs,
    })))
}

/// POST /api/workflows/{id}/pause
pub async fn pause_workflow(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    app.orchestrator.pause_workflow(&id).await?;
    let workflow = app.orchestrator.get_workflow_status(&id).await?;
    Ok(Json(json!({ "id": id, "status": workflow.status })))
}

/// POST /api/workflows/{id}/resume
pub async fn resume_workflow(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    app.orchestrator.resume_workflow(&id).await?;
    let workflow = app.orchestrator.get_workflow_status(&id).await?;
    Ok(Json(json!({
        "id": id,
        "status": workflow.status,
        "active": app.orchestrator.is_active(&id).await,
    })))
}
