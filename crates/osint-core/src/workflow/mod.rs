//! Workflows: recurring or one-off investigations driven by the orchestrator.

mod alert;
mod campaign;
mod change;
mod orchestrator;
mod store;

pub use alert::{evaluate_conditions, Alert, AlertCondition, AlertStatus, ConditionKind, Trigger};
pub use campaign::{CampaignOutcome, CampaignResult, CampaignTarget, TARGET_PLACEHOLDER};
pub use change::{detect_changes, Change};
pub use orchestrator::{Orchestrator, OrchestratorStats, WorkflowOutcome};
pub use store::{ImportSummary, WorkflowExport, WorkflowStore};

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::bundle::InvestigationResult;
use crate::error::{OsintError, Result};

// ---------------------------------------------------------------------------
// WorkflowType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    #[default]
    OneTime,
    Scheduled,
    Continuous,
    Triggered,
}

impl WorkflowType {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowType::OneTime => "one_time",
            WorkflowType::Scheduled => "scheduled",
            WorkflowType::Continuous => "continuous",
            WorkflowType::Triggered => "triggered",
        }
    }
}

impl fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkflowType {
    type Err = OsintError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "one_time" | "one-time" | "once" => Ok(WorkflowType::OneTime),
            "scheduled" => Ok(WorkflowType::Scheduled),
            "continuous" => Ok(WorkflowType::Continuous),
            "triggered" => Ok(WorkflowType::Triggered),
            other => Err(OsintError::InvalidWorkflowType(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// WorkflowStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Paused,
}

impl WorkflowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStatus::Pending => "pending",
            WorkflowStatus::Running => "running",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Failed => "failed",
            WorkflowStatus::Paused => "paused",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ScheduleConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleInterval {
    Hourly,
    Daily,
    Weekly,
}

impl ScheduleInterval {
    pub fn period(self) -> Duration {
        match self {
            ScheduleInterval::Hourly => Duration::from_secs(3600),
            ScheduleInterval::Daily => Duration::from_secs(86_400),
            ScheduleInterval::Weekly => Duration::from_secs(604_800),
        }
    }
}

/// Without an `interval` a scheduled workflow runs once and stops.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<ScheduleInterval>,
    /// Informational time of day, e.g. `"09:00"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub findings: usize,
    pub entities: usize,
    pub duration_seconds: f64,
}

/// One workflow run. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investigation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<ExecutionSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Execution {
    pub(crate) fn completed(start: DateTime<Utc>, result: &InvestigationResult) -> Self {
        let end = Utc::now();
        Self {
            start_time: start,
            end_time: end,
            status: ExecutionStatus::Completed,
            investigation_id: Some(result.investigation_id.clone()),
            summary: Some(ExecutionSummary {
                findings: result.finding_count(),
                entities: result.entity_count(),
                duration_seconds: (end - start).num_milliseconds() as f64 / 1000.0,
            }),
            error: None,
        }
    }

    pub(crate) fn failed(start: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            start_time: start,
            end_time: Utc::now(),
            status: ExecutionStatus::Failed,
            investigation_id: None,
            summary: None,
            error: Some(error.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// Everything needed to create a workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSpec {
    pub name: String,
    #[serde(rename = "type", alias = "workflow_type", default)]
    pub kind: WorkflowType,
    pub objective: String,
    #[serde(default, alias = "schedule_config")]
    pub schedule: ScheduleConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Map<String, Value>>,
    #[serde(default)]
    pub alert_conditions: Vec<AlertCondition>,
}

impl WorkflowSpec {
    pub fn new(name: impl Into<String>, kind: WorkflowType, objective: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            objective: objective.into(),
            ..Default::default()
        }
    }

    pub fn with_alert(mut self, condition: AlertCondition) -> Self {
        self.alert_conditions.push(condition);
        self
    }

    pub fn with_schedule(mut self, schedule: ScheduleConfig) -> Self {
        self.schedule = schedule;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: WorkflowType,
    pub objective: String,
    #[serde(default)]
    pub schedule_config: ScheduleConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Map<String, Value>>,
    #[serde(default)]
    pub alert_conditions: Vec<AlertCondition>,
    pub status: WorkflowStatus,
    pub created_at: DateTime<Utc>,
    /// Period of the last continuous monitoring loop, reused on resume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_interval_secs: Option<u64>,
    #[serde(default)]
    pub executions: Vec<Execution>,
    #[serde(default)]
    pub results: Vec<InvestigationResult>,
}

impl Workflow {
    pub(crate) fn from_spec(spec: WorkflowSpec) -> Self {
        let created_at = Utc::now();
        Self {
            id: workflow_id(&spec.name, created_at),
            name: spec.name,
            kind: spec.kind,
            objective: spec.objective,
            schedule_config: spec.schedule,
            constraints: spec.constraints,
            alert_conditions: spec.alert_conditions,
            status: WorkflowStatus::Pending,
            created_at,
            check_interval_secs: None,
            executions: Vec::new(),
            results: Vec::new(),
        }
    }

    /// Most recent successful result.
    pub fn last_result(&self) -> Option<&InvestigationResult> {
        self.results.last()
    }

    pub fn summary(&self) -> WorkflowSummary {
        WorkflowSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind,
            status: self.status,
            objective: self.objective.clone(),
            executions: self.executions.len(),
            last_execution: self.executions.last().cloned(),
            created_at: self.created_at,
        }
    }
}

/// `wf_<YYYYmmdd_HHMMSS>_<name>`.
pub fn workflow_id(name: &str, created_at: DateTime<Utc>) -> String {
    format!(
        "wf_{}_{}",
        created_at.format("%Y%m%d_%H%M%S"),
        crate::paths::file_stem(name)
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: WorkflowType,
    pub status: WorkflowStatus,
    pub objective: String,
    pub executions: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_execution: Option<Execution>,
    pub created_at: DateTime<Utc>,
}
