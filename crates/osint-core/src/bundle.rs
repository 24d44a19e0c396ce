//! The investigation result bundle handed to reporters, the dashboard and the
//! orchestrator. Every field has a serde default so consumers tolerate
//! partial bundles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::intel::{ActionResult, Analysis, Evaluation, Plan, ProcessedData};
use crate::investigation::InvestigationStatus;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_seconds: f64,
    #[serde(default)]
    pub iterations: u32,
    /// Distinct tool names, sorted.
    #[serde(default)]
    pub tools_used: Vec<String>,
    /// Findings at or above the engine's minimum confidence.
    #[serde(default)]
    pub confident_findings: usize,
    #[serde(default)]
    pub status: InvestigationStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestigationResult {
    #[serde(default)]
    pub investigation_id: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub plan: Plan,
    #[serde(default)]
    pub collection_results: Vec<ActionResult>,
    #[serde(default)]
    pub processed_data: ProcessedData,
    #[serde(default)]
    pub analysis: Analysis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    #[serde(default)]
    pub evaluation: Evaluation,
    #[serde(default)]
    pub metadata: RunMetadata,
}

impl InvestigationResult {
    pub fn finding_count(&self) -> usize {
        self.analysis.key_findings.len()
    }

    pub fn entity_count(&self) -> usize {
        self.processed_data.entities.len()
    }

    pub fn entity_names(&self) -> BTreeSet<String> {
        self.processed_data.entity_names()
    }

    /// `true` when any phase had to fall back.
    pub fn is_degraded(&self) -> bool {
        self.plan.degraded
            || self.processed_data.degraded
            || self.analysis.degraded
            || self.evaluation.degraded
    }
}

pub(crate) fn distinct_tools(results: &[ActionResult]) -> Vec<String> {
    results
        .iter()
        .map(|r| r.tool.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
