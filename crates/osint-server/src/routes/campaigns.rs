use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use osint_core::workflow::CampaignTarget;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CampaignRequest {
    pub name: String,
    pub targets: Vec<CampaignTarget>,
    #[serde(alias = "objective_template")]
    pub template: String,
    #[serde(default)]
    pub parallel: bool,
}

/// POST /api/campaigns: run one investigation per target and return the
/// aggregated campaign result.
pub async fn run_campaign(
    State(app): State<AppState>,
    Json(req): Json<CampaignRequest>,
) -> Result<Json<Value>, AppError> {
    if req.targets.is_empty() {
        return Err(AppError::bad_request("targets must not be empty"));
    }
    if req.template.trim().is_empty() {
        return Err(AppError::bad_request("template must not be empty"));
    }
    let result = app
        .orchestrator
        .run_campaign(&req.name, req.targets, &req.template, req.parallel)
        .await;
    Ok(Json(serde_json::to_value(result)?))
}
