use thiserror::Error;

use crate::types::Phase;

#[derive(Debug, Error)]
pub enum OsintError {
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },

    #[error("reasoning gateway error: {0}")]
    Gateway(String),

    #[error("malformed {phase} response: {source}")]
    MalformedResponse {
        phase: Phase,
        #[source]
        source: serde_json::Error,
    },

    #[error("planning failed: {0}")]
    Planning(String),

    #[error("processing failed: {0}")]
    Processing(String),

    #[error("analysis failed: {0}")]
    Analysis(String),

    #[error("report generation failed: {0}")]
    ReportGeneration(String),

    #[error("evaluation failed: {0}")]
    Evaluation(String),

    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),

    #[error("alert not found: {0}")]
    AlertNotFound(String),

    #[error("campaign target '{target}' failed: {message}")]
    CampaignTarget { target: String, message: String },

    #[error("invalid objective: {0}")]
    InvalidObjective(String),

    #[error("invalid workflow type: {0}")]
    InvalidWorkflowType(String),

    #[error("invalid severity: {0}")]
    InvalidSeverity(String),

    #[error("invalid alert condition: {0}")]
    InvalidAlertCondition(String),

    #[error("invalid report format: {0}")]
    InvalidReportFormat(String),

    #[error("audit store error: {0}")]
    AuditStore(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl OsintError {
    /// Wrap a JSON parse failure of model output produced during `phase`.
    pub fn malformed(phase: Phase, source: serde_json::Error) -> Self {
        Self::MalformedResponse { phase, source }
    }
}

pub type Result<T> = std::result::Result<T, OsintError>;
