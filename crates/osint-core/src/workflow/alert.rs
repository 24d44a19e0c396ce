//! Alert rules and the alerts they raise.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::Workflow;
use crate::bundle::InvestigationResult;
use crate::error::{OsintError, Result};
use crate::types::Severity;

// ---------------------------------------------------------------------------
// AlertCondition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionKind {
    /// At least `threshold` key findings.
    FindingCount { threshold: usize },
    /// Any finding rated `high` or `very_high`.
    HighConfidenceFinding,
    /// Any keyword, case-insensitively, in the report text.
    KeywordMatch { keywords: Vec<String> },
    /// Any risk indicator present.
    RiskIndicator,
    /// Raised by continuous monitoring only.
    ChangeDetected,
}

impl ConditionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionKind::FindingCount { .. } => "finding_count",
            ConditionKind::HighConfidenceFinding => "high_confidence_finding",
            ConditionKind::KeywordMatch { .. } => "keyword_match",
            ConditionKind::RiskIndicator => "risk_indicator",
            ConditionKind::ChangeDetected => "change_detected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCondition {
    #[serde(flatten)]
    pub kind: ConditionKind,
    #[serde(default)]
    pub severity: Severity,
}

impl AlertCondition {
    pub fn new(kind: ConditionKind, severity: Severity) -> Self {
        Self { kind, severity }
    }

    pub fn change_detected() -> Self {
        Self::new(ConditionKind::ChangeDetected, Severity::Medium)
    }
}

impl fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ConditionKind::FindingCount { threshold } => {
                write!(f, "finding_count>={threshold}")?
            }
            ConditionKind::KeywordMatch { keywords } => {
                write!(f, "keyword_match[{}]", keywords.join(","))?
            }
            other => f.write_str(other.as_str())?,
        }
        write!(f, " ({})", self.severity)
    }
}

/// Compact command-line form:
/// `finding_count:3[:sev]`, `high_confidence[:sev]`, `keyword:a,b[:sev]`, `risk[:sev]`.
impl std::str::FromStr for AlertCondition {
    type Err = OsintError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || OsintError::InvalidAlertCondition(s.to_string());
        let mut parts = s.split(':');
        let head = parts.next().unwrap_or("").trim();
        let (kind, rest): (ConditionKind, Vec<&str>) = match head {
            "finding_count" => {
                let threshold = parts
                    .next()
                    .and_then(|t| t.trim().parse().ok())
                    .ok_or_else(invalid)?;
                (ConditionKind::FindingCount { threshold }, parts.collect())
            }
            "high_confidence" | "high_confidence_finding" => {
                (ConditionKind::HighConfidenceFinding, parts.collect())
            }
            "keyword" | "keyword_match" => {
                let keywords: Vec<String> = parts
                    .next()
                    .unwrap_or("")
                    .split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .collect();
                if keywords.is_empty() {
                    return Err(invalid());
                }
                (ConditionKind::KeywordMatch { keywords }, parts.collect())
            }
            "risk" | "risk_indicator" => (ConditionKind::RiskIndicator, parts.collect()),
            _ => return Err(invalid()),
        };
        let severity = match rest.as_slice() {
            [] => Severity::default(),
            [sev] => sev.trim().parse()?,
            _ => return Err(invalid()),
        };
        Ok(Self { kind, severity })
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// A condition that matched, with the data that made it match.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub condition: AlertCondition,
    pub data: Value,
}

/// Check every condition against `result`. Each condition fires at most once;
/// several may fire for the same result.
pub fn evaluate_conditions(
    conditions: &[AlertCondition],
    result: &InvestigationResult,
) -> Vec<Trigger> {
    conditions
        .iter()
        .filter_map(|c| {
            evaluate(&c.kind, result).map(|data| Trigger {
                condition: c.clone(),
                data,
            })
        })
        .collect()
}

fn evaluate(kind: &ConditionKind, result: &InvestigationResult) -> Option<Value> {
    let analysis = &result.analysis;
    match kind {
        ConditionKind::FindingCount { threshold } => {
            let count = analysis.key_findings.len();
            (count >= *threshold).then(|| json!({"finding_count": count, "threshold": threshold}))
        }
        ConditionKind::HighConfidenceFinding => {
            let high: Vec<_> = analysis
                .key_findings
                .iter()
                .filter(|f| f.confidence.is_high())
                .collect();
            (!high.is_empty()).then(|| json!({"high_confidence_findings": high}))
        }
        ConditionKind::KeywordMatch { keywords } => {
            let report = result.report.as_deref()?.to_lowercase();
            let matched: Vec<&String> = keywords
                .iter()
                .filter(|k| report.contains(&k.to_lowercase()))
                .collect();
            (!matched.is_empty()).then(|| json!({"matched_keywords": matched}))
        }
        ConditionKind::RiskIndicator => (!analysis.risk_indicators.is_empty())
            .then(|| json!({"risk_indicators": analysis.risk_indicators})),
        ConditionKind::ChangeDetected => None,
    }
}

// ---------------------------------------------------------------------------
// Alert
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    #[default]
    Active,
    Acknowledged,
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlertStatus::Active => "active",
            AlertStatus::Acknowledged => "acknowledged",
        })
    }
}

impl std::str::FromStr for AlertStatus {
    type Err = OsintError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(AlertStatus::Active),
            "acknowledged" => Ok(AlertStatus::Acknowledged),
            other => Err(OsintError::InvalidAlertCondition(format!(
                "unknown alert status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub workflow_id: String,
    pub workflow_name: String,
    pub condition: AlertCondition,
    pub alert_data: Value,
    pub investigation_id: String,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub status: AlertStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub fn new(
        workflow: &Workflow,
        condition: AlertCondition,
        alert_data: Value,
        investigation_id: &str,
    ) -> Self {
        let timestamp = Utc::now();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self {
            id: format!("alert_{}_{}", timestamp.format("%Y%m%d_%H%M%S"), &suffix[..8]),
            workflow_id: workflow.id.clone(),
            workflow_name: workflow.name.clone(),
            severity: condition.severity,
            condition,
            alert_data,
            investigation_id: investigation_id.to_string(),
            timestamp,
            status: AlertStatus::Active,
            acknowledged_at: None,
        }
    }

    pub fn acknowledge(&mut self) {
        if self.status == AlertStatus::Active {
            self.status = AlertStatus::Acknowledged;
            self.acknowledged_at = Some(Utc::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intel::KeyFinding;
    use crate::types::ConfidenceLevel;

    fn result_with(findings: &[ConfidenceLevel]) -> InvestigationResult {
        let mut r = InvestigationResult::default();
        r.investigation_id = "inv1".into();
        r.analysis.key_findings = findings
            .iter()
            .enumerate()
            .map(|(i, c)| KeyFinding::new(format!("finding {i}"), *c))
            .collect();
        r
    }

    fn cond(kind: ConditionKind) -> AlertCondition {
        AlertCondition::new(kind, Severity::High)
    }

    #[test]
    fn finding_count_threshold_is_inclusive() {
        let conditions = [cond(ConditionKind::FindingCount { threshold: 3 })];
        let three = result_with(&[ConfidenceLevel::Low; 3]);
        let triggers = evaluate_conditions(&conditions, &three);
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].data["finding_count"], 3);
        assert_eq!(triggers[0].data["threshold"], 3);

        let two = result_with(&[ConfidenceLevel::Low; 2]);
        assert!(evaluate_conditions(&conditions, &two).is_empty());
    }

    #[test]
    fn high_confidence_needs_high_or_very_high() {
        let conditions = [cond(ConditionKind::HighConfidenceFinding)];
        let medium = result_with(&[ConfidenceLevel::Medium, ConfidenceLevel::Low]);
        assert!(evaluate_conditions(&conditions, &medium).is_empty());

        let mixed = result_with(&[ConfidenceLevel::VeryHigh, ConfidenceLevel::Medium]);
        let triggers = evaluate_conditions(&conditions, &mixed);
        assert_eq!(triggers[0].data["high_confidence_findings"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn keyword_match_is_case_insensitive_on_report() {
        let conditions = [cond(ConditionKind::KeywordMatch {
            keywords: vec!["Breach".into(), "ransom".into()],
        })];
        let mut r = result_with(&[]);
        assert!(evaluate_conditions(&conditions, &r).is_empty());
        r.report = Some("A data BREACH was disclosed.".into());
        let triggers = evaluate_conditions(&conditions, &r);
        assert_eq!(triggers[0].data["matched_keywords"], json!(["Breach"]));
    }

    #[test]
    fn multiple_conditions_fire_independently() {
        let conditions = [
            cond(ConditionKind::FindingCount { threshold: 1 }),
            cond(ConditionKind::RiskIndicator),
            cond(ConditionKind::ChangeDetected),
        ];
        let mut r = result_with(&[ConfidenceLevel::High]);
        r.analysis.risk_indicators = vec![json!("expired certificate")];
        let triggers = evaluate_conditions(&conditions, &r);
        let kinds: Vec<_> = triggers.iter().map(|t| t.condition.kind.as_str()).collect();
        assert_eq!(kinds, vec!["finding_count", "risk_indicator"]);
    }

    #[test]
    fn condition_serde_shape() {
        let c: AlertCondition =
            serde_json::from_value(json!({"type": "keyword_match", "keywords": ["a"]})).unwrap();
        assert_eq!(c.severity, Severity::Medium);
        let v = serde_json::to_value(AlertCondition::new(
            ConditionKind::FindingCount { threshold: 2 },
            Severity::Critical,
        ))
        .unwrap();
        assert_eq!(v, json!({"type": "finding_count", "threshold": 2, "severity": "critical"}));
    }

    #[test]
    fn condition_specs_parse() {
        let c: AlertCondition = "finding_count:3:high".parse().unwrap();
        assert_eq!(c.kind, ConditionKind::FindingCount { threshold: 3 });
        assert_eq!(c.severity, Severity::High);

        let c: AlertCondition = "keyword:breach, leak".parse().unwrap();
        assert_eq!(
            c.kind,
            ConditionKind::KeywordMatch {
                keywords: vec!["breach".into(), "leak".into()]
            }
        );
        assert_eq!(c.severity, Severity::Medium);

        assert!("risk:critical".parse::<AlertCondition>().is_ok());
        assert!("finding_count".parse::<AlertCondition>().is_err());
        assert!("keyword:".parse::<AlertCondition>().is_err());
        assert!("risk:urgent".parse::<AlertCondition>().is_err());
        assert!("weather".parse::<AlertCondition>().is_err());
    }

    #[test]
    fn acknowledge_sets_timestamp_once() {
        let wf = Workflow::from_spec(super::super::WorkflowSpec::new(
            "w",
            super::super::WorkflowType::OneTime,
            "o",
        ));
        let mut alert = Alert::new(&wf, AlertCondition::change_detected(), json!({}), "inv");
        assert_eq!(alert.status, AlertStatus::Active);
        assert!(alert.id.starts_with("alert_"));
        alert.acknowledge();
        let first = alert.acknowledged_at;
        assert!(first.is_some());
        alert.acknowledge();
        assert_eq!(alert.acknowledged_at, first);
    }
}
