use crate::error::{OsintError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Intelligence lifecycle phase.
///
/// Planning and Feedback run exactly once per investigation; Collection may
/// repeat while the adaptive loop keeps re-planning batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Planning,
    Collection,
    Processing,
    Analysis,
    Dissemination,
    Feedback,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Planning => "planning",
            Phase::Collection => "collection",
            Phase::Processing => "processing",
            Phase::Analysis => "analysis",
            Phase::Dissemination => "dissemination",
            Phase::Feedback => "feedback",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ConfidenceLevel
// ---------------------------------------------------------------------------

/// Ordered qualitative rating of a finding's reliability.
///
/// Variants are declared lowest first so the derived `Ord` matches intuition:
/// `VeryLow < Low < Medium < High < VeryHigh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryLow,
    #[default]
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceLevel::VeryLow => "very_low",
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::High => "high",
            ConfidenceLevel::VeryHigh => "very_high",
        }
    }

    /// `true` for the two levels that trigger `high_confidence_finding` alerts.
    pub fn is_high(self) -> bool {
        self >= ConfidenceLevel::High
    }

    /// Bucket a raw `0.0..=1.0` score (or a `0..=100` percentage).
    pub fn from_score(score: f64) -> Self {
        let s = if score > 1.0 { score / 100.0 } else { score };
        if s >= 0.9 {
            ConfidenceLevel::VeryHigh
        } else if s >= 0.75 {
            ConfidenceLevel::High
        } else if s >= 0.5 {
            ConfidenceLevel::Medium
        } else if s >= 0.25 {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::VeryLow
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConfidenceLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match norm.as_str() {
            "very_high" | "veryhigh" | "certain" => Ok(ConfidenceLevel::VeryHigh),
            "high" => Ok(ConfidenceLevel::High),
            "medium" | "moderate" => Ok(ConfidenceLevel::Medium),
            "low" => Ok(ConfidenceLevel::Low),
            "very_low" | "verylow" => Ok(ConfidenceLevel::VeryLow),
            other => Err(format!("unknown confidence level '{other}'")),
        }
    }
}

impl<'de> Deserialize<'de> for ConfidenceLevel {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Label(String),
            Score(f64),
        }

        match Raw::deserialize(d)? {
            Raw::Label(s) => s.parse().map_err(serde::de::Error::custom),
            Raw::Score(n) => Ok(ConfidenceLevel::from_score(n)),
        }
    }
}

// ---------------------------------------------------------------------------
// Significance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    Low,
    #[default]
    Medium,
    High,
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = OsintError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(OsintError::InvalidSeverity(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ReportFormat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Markdown,
    Html,
    Json,
    Text,
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReportFormat::Markdown => "markdown",
            ReportFormat::Html => "html",
            ReportFormat::Json => "json",
            ReportFormat::Text => "text",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = OsintError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            "html" => Ok(ReportFormat::Html),
            "json" => Ok(ReportFormat::Json),
            "text" | "txt" => Ok(ReportFormat::Text),
            other => Err(OsintError::InvalidReportFormat(other.to_string())),
        }
    }
}
