use crate::error::Result;
use crate::paths;
use crate::types::{ConfidenceLevel, ReportFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: ConfidenceLevel,
    /// Actions popped from the queue per collection iteration.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Delay between two tool calls of the same batch.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    #[serde(default)]
    pub report_format: ReportFormat,
    #[serde(default = "default_classification")]
    pub classification: String,
}

fn default_max_iterations() -> u32 {
    15
}

fn default_min_confidence() -> ConfidenceLevel {
    ConfidenceLevel::Medium
}

fn default_batch_size() -> usize {
    3
}

fn default_pacing_ms() -> u64 {
    500
}

fn default_classification() -> String {
    "UNCLASSIFIED".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            min_confidence: default_min_confidence(),
            batch_size: default_batch_size(),
            pacing_ms: default_pacing_ms(),
            report_format: ReportFormat::default(),
            classification: default_classification(),
        }
    }
}

impl EngineConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

// ---------------------------------------------------------------------------
// ReasoningConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    #[default]
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
    Offline,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Provider::Anthropic => "anthropic",
            Provider::OpenAi => "openai",
            Provider::Offline => "offline",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    #[serde(default)]
    pub provider: Provider,
    /// Falls back to the provider's default model when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Environment variable holding the API key. Defaults per provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            api_key_env: None,
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ReasoningConfig {
    pub fn model(&self) -> &str {
        match (&self.model, self.provider) {
            (Some(m), _) => m,
            (None, Provider::Anthropic) => "claude-3-opus-20240229",
            (None, Provider::OpenAi) => "gpt-4-turbo-preview",
            (None, Provider::Offline) => "offline",
        }
    }

    pub fn api_key_env(&self) -> &str {
        match (&self.api_key_env, self.provider) {
            (Some(v), _) => v,
            (None, Provider::OpenAi) => "OPENAI_API_KEY",
            (None, _) => "ANTHROPIC_API_KEY",
        }
    }
}

// ---------------------------------------------------------------------------
// OrchestratorConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Pause between targets of a sequential campaign.
    #[serde(default = "default_campaign_delay_ms")]
    pub campaign_delay_ms: u64,
    /// Default period for continuous monitoring.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    /// Results kept per workflow; oldest are dropped first.
    #[serde(default = "default_result_history_limit")]
    pub result_history_limit: usize,
}

fn default_campaign_delay_ms() -> u64 {
    2000
}

fn default_check_interval_secs() -> u64 {
    300
}

fn default_result_history_limit() -> usize {
    50
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            campaign_delay_ms: default_campaign_delay_ms(),
            check_interval_secs: default_check_interval_secs(),
            result_history_limit: default_result_history_limit(),
        }
    }
}

impl OrchestratorConfig {
    pub fn campaign_delay(&self) -> Duration {
        Duration::from_millis(self.campaign_delay_ms)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}

// ---------------------------------------------------------------------------
// StorageConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_audit_db")]
    pub audit_db: PathBuf,
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
    #[serde(default = "default_investigations_dir")]
    pub investigations_dir: PathBuf,
}

fn default_audit_db() -> PathBuf {
    PathBuf::from(paths::AUDIT_DB)
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(paths::EXPORTS_DIR)
}

fn default_investigations_dir() -> PathBuf {
    PathBuf::from(paths::INVESTIGATIONS_DIR)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            audit_db: default_audit_db(),
            export_dir: default_export_dir(),
            investigations_dir: default_investigations_dir(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub reasoning: ReasoningConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load `.osint/config.yaml`. A missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn audit_db_path(&self, root: &Path) -> PathBuf {
        paths::resolve(root, &self.storage.audit_db)
    }

    pub fn export_dir(&self, root: &Path) -> PathBuf {
        paths::resolve(root, &self.storage.export_dir)
    }

    pub fn investigations_dir(&self, root: &Path) -> PathBuf {
        paths::resolve(root, &self.storage.investigations_dir)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut push = |level, message: String| warnings.push(ConfigWarning { level, message });

        if self.engine.max_iterations == 0 {
            push(
                WarnLevel::Error,
                "engine.max_iterations is 0; no collection will run".into(),
            );
        }
        if self.engine.batch_size == 0 {
            push(
                WarnLevel::Error,
                "engine.batch_size is 0; every collection batch will be empty".into(),
            );
        }
        if !(0.0..=2.0).contains(&self.reasoning.temperature) {
            push(
                WarnLevel::Warning,
                format!(
                    "reasoning.temperature {} is outside [0, 2]",
                    self.reasoning.temperature
                ),
            );
        }
        if self.reasoning.max_tokens == 0 {
            push(WarnLevel::Error, "reasoning.max_tokens is 0".into());
        }
        if self.orchestrator.check_interval_secs == 0 {
            push(
                WarnLevel::Warning,
                "orchestrator.check_interval_secs is 0; monitoring will run back to back".into(),
            );
        }
        if self.orchestrator.result_history_limit == 0 {
            push(
                WarnLevel::Warning,
                "orchestrator.result_history_limit is 0; change detection has no baseline".into(),
            );
        }

        warnings
    }
}
