//! Intelligence products passed between lifecycle phases.
//!
//! Every product the reasoning gateway produces has a named fallback
//! constructor flagged `degraded: true`, so a failed phase still hands a
//! well-formed value to the next one.

use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::lenient;
use crate::types::{ConfidenceLevel, Significance};

pub type Params = Map<String, Value>;

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// One queued collection step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedAction {
    #[serde(alias = "tool_name", deserialize_with = "lenient::text")]
    pub tool: String,
    #[serde(default, alias = "params", deserialize_with = "lenient::params")]
    pub parameters: Params,
    /// `1` is most urgent.
    #[serde(
        default = "lenient::default_priority",
        deserialize_with = "lenient::priority"
    )]
    pub priority: u32,
    #[serde(
        default,
        alias = "dependencies",
        alias = "dependency",
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub depends_on: Option<String>,
    #[serde(
        default,
        alias = "expected_value",
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub rationale: Option<String>,
}

impl PlannedAction {
    pub fn new(tool: impl Into<String>, parameters: Params) -> Self {
        Self {
            tool: tool.into(),
            parameters,
            priority: lenient::DEFAULT_PRIORITY,
            depends_on: None,
            rationale: None,
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub investigation_id: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub information_requirements: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub collection_strategy: String,
    #[serde(default, alias = "priority_actions")]
    pub actions: Vec<PlannedAction>,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub success_criteria: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub risk_assessment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub degraded: bool,
}

impl Plan {
    /// Single-action plan used when planning fails: the first registered tool
    /// queried with the objective itself.
    pub fn fallback(investigation_id: &str, objective: &str, first_tool: Option<&str>) -> Self {
        let mut params = Params::new();
        params.insert("query".into(), Value::String(objective.to_string()));
        Self {
            investigation_id: investigation_id.to_string(),
            objective: objective.to_string(),
            information_requirements: vec!["General information about the target".into()],
            collection_strategy: "Sequential execution of available tools".into(),
            actions: vec![PlannedAction::new(first_tool.unwrap_or("none"), params).with_priority(1)],
            success_criteria: vec!["Gather basic information".into()],
            risk_assessment: "Limited plan due to planning error".into(),
            created_at: Some(Utc::now()),
            degraded: true,
        }
    }

    /// The action queue, most urgent first. Equal priorities keep plan order.
    pub fn action_queue(&self) -> VecDeque<PlannedAction> {
        let mut actions = self.actions.clone();
        actions.sort_by_key(|a| a.priority);
        actions.into()
    }
}

// ---------------------------------------------------------------------------
// ActionResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionErrorKind {
    ToolNotFound,
    ToolExecution,
}

/// Outcome of one collection action. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub tool: String,
    #[serde(default)]
    pub parameters: Params,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ActionErrorKind>,
    pub timestamp: DateTime<Utc>,
}

impl ActionResult {
    pub fn succeeded(tool: impl Into<String>, parameters: Params, data: Value) -> Self {
        Self {
            tool: tool.into(),
            parameters,
            success: true,
            data: Some(data),
            error: None,
            error_kind: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(
        tool: impl Into<String>,
        parameters: Params,
        kind: ActionErrorKind,
        error: impl Into<String>,
    ) -> Self {
        Self {
            tool: tool.into(),
            parameters,
            success: false,
            data: None,
            error: Some(error.into()),
            error_kind: Some(kind),
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProcessedData
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(
        rename = "type",
        alias = "entity_type",
        default = "unknown_kind",
        deserialize_with = "lenient::text"
    )]
    pub kind: String,
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::params")]
    pub attributes: Map<String, Value>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_confidence",
        skip_serializing_if = "Option::is_none"
    )]
    pub confidence: Option<ConfidenceLevel>,
}

fn unknown_kind() -> String {
    "unknown".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(
        default,
        alias = "event",
        alias = "name",
        deserialize_with = "lenient::text"
    )]
    pub description: String,
    #[serde(
        default,
        alias = "date",
        alias = "timestamp",
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub when: Option<String>,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub entities: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(alias = "from", alias = "entity1", deserialize_with = "lenient::text")]
    pub source: String,
    #[serde(alias = "to", alias = "entity2", deserialize_with = "lenient::text")]
    pub target: String,
    #[serde(
        rename = "type",
        alias = "relationship_type",
        alias = "relation",
        default,
        deserialize_with = "lenient::text"
    )]
    pub kind: String,
    #[serde(
        default,
        deserialize_with = "lenient::opt_confidence",
        skip_serializing_if = "Option::is_none"
    )]
    pub confidence: Option<ConfidenceLevel>,
}

/// Normalized, deduplicated view over every `ActionResult` of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessedData {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub data_quality_notes: Vec<String>,
    /// Number of raw results this was derived from.
    #[serde(default)]
    pub sources_processed: usize,
    #[serde(default)]
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessedData {
    /// Empty-but-valid result that still reports how much raw data existed.
    pub fn degraded(raw_count: usize, error: impl Into<String>) -> Self {
        Self {
            data_quality_notes: vec!["Processing failed, raw data preserved".into()],
            sources_processed: raw_count,
            degraded: true,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// True when the reply carried none of the processing fields.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
            && self.events.is_empty()
            && self.relationships.is_empty()
            && self.data_quality_notes.is_empty()
    }

    pub fn entity_names(&self) -> BTreeSet<String> {
        self.entities.iter().map(|e| e.name.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyFinding {
    pub description: String,
    pub confidence: ConfidenceLevel,
    pub significance: Significance,
    pub evidence: Vec<String>,
}

impl KeyFinding {
    pub fn new(description: impl Into<String>, confidence: ConfidenceLevel) -> Self {
        Self {
            description: description.into(),
            confidence,
            significance: Significance::default(),
            evidence: Vec::new(),
        }
    }
}

impl<'de> Deserialize<'de> for KeyFinding {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Full {
            #[serde(
                default,
                alias = "finding",
                alias = "title",
                alias = "summary",
                deserialize_with = "lenient::text"
            )]
            description: String,
            #[serde(
                default,
                alias = "confidence_level",
                deserialize_with = "lenient::confidence"
            )]
            confidence: ConfidenceLevel,
            #[serde(default, deserialize_with = "significance")]
            significance: Significance,
            #[serde(default, alias = "sources", deserialize_with = "lenient::text_list")]
            evidence: Vec<String>,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Full(Full),
        }

        Ok(match Raw::deserialize(d)? {
            Raw::Text(description) => KeyFinding::new(description, ConfidenceLevel::Low),
            Raw::Full(f) => KeyFinding {
                description: f.description,
                confidence: f.confidence,
                significance: f.significance,
                evidence: f.evidence,
            },
        })
    }
}

fn significance<'de, D: Deserializer<'de>>(d: D) -> Result<Significance, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(serde_json::from_value(match v {
        Value::String(s) => Value::String(s.to_ascii_lowercase()),
        other => other,
    })
    .unwrap_or_default())
}

/// Overall reliability plus whatever per-finding detail the model supplied.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfidenceAssessment {
    pub overall: ConfidenceLevel,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl<'de> Deserialize<'de> for ConfidenceAssessment {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(match v {
            Value::Object(mut map) => {
                let overall = map
                    .remove("overall")
                    .and_then(|o| serde_json::from_value(o).ok())
                    .unwrap_or_default();
                ConfidenceAssessment {
                    overall,
                    details: map,
                }
            }
            other => ConfidenceAssessment {
                overall: serde_json::from_value(other).unwrap_or_default(),
                details: Map::new(),
            },
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default)]
    pub key_findings: Vec<KeyFinding>,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub insights: Vec<String>,
    #[serde(default)]
    pub confidence_assessment: ConfidenceAssessment,
    #[serde(default, alias = "gaps_and_limitations", deserialize_with = "lenient::text_list")]
    pub gaps: Vec<String>,
    #[serde(default, deserialize_with = "lenient::value_list")]
    pub risk_indicators: Vec<Value>,
    #[serde(default, deserialize_with = "lenient::value_list")]
    pub timeline: Vec<Value>,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Analysis {
    /// Minimal low-confidence analysis used when synthesis fails.
    pub fn degraded(error: impl Into<String>) -> Self {
        Self {
            confidence_assessment: ConfidenceAssessment {
                overall: ConfidenceLevel::Low,
                details: Map::new(),
            },
            gaps: vec!["Full analysis unavailable".into()],
            recommendations: vec!["Manual review recommended".into()],
            degraded: true,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.key_findings.is_empty()
            && self.insights.is_empty()
            && self.gaps.is_empty()
            && self.risk_indicators.is_empty()
            && self.timeline.is_empty()
            && self.recommendations.is_empty()
    }

    /// Findings whose confidence meets `threshold`.
    pub fn findings_at_or_above(&self, threshold: ConfidenceLevel) -> usize {
        self.key_findings
            .iter()
            .filter(|f| f.confidence >= threshold)
            .count()
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Advisory post-run scoring. Never blocks completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Percent of the objective answered.
    #[serde(default, deserialize_with = "lenient::number")]
    pub objective_achievement: f64,
    /// Percent coverage.
    #[serde(default, deserialize_with = "lenient::number")]
    pub coverage: f64,
    /// 1–10.
    #[serde(default, deserialize_with = "lenient::number")]
    pub source_quality: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub efficiency: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub timeliness: f64,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub gaps: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub lessons_learned: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub recommendations: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub degraded: bool,
}

impl Evaluation {
    pub fn degraded(error: impl std::fmt::Display) -> Self {
        Self {
            notes: Some(format!("Evaluation failed: {error}")),
            evaluated_at: Some(Utc::now()),
            degraded: true,
            ..Default::default()
        }
    }

    /// No scores, no lists and no notes.
    pub fn is_empty(&self) -> bool {
        [
            self.objective_achievement,
            self.coverage,
            self.source_quality,
            self.efficiency,
            self.timeliness,
        ]
        .iter()
        .all(|score| *score == 0.0)
            && self.gaps.is_empty()
            && self.lessons_learned.is_empty()
            && self.recommendations.is_empty()
            && self.notes.is_none()
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    #[default]
    Continue,
    Conclude,
    Pivot,
}

impl<'de> Deserialize<'de> for Recommendation {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = lenient::text(d)?.to_ascii_lowercase();
        Ok(if s.contains("pivot") {
            Recommendation::Pivot
        } else if s.contains("conclude") || s.contains("stop") {
            Recommendation::Conclude
        } else {
            Recommendation::Continue
        })
    }
}

/// Outcome of the adaptive continue/pivot check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(rename = "continue", default = "default_true")]
    pub should_continue: bool,
    #[serde(default, deserialize_with = "lenient::text")]
    pub reason: String,
    #[serde(default)]
    pub recommendation: Recommendation,
    #[serde(default, deserialize_with = "lenient::number")]
    pub confidence: f64,
    #[serde(default)]
    pub degraded: bool,
}

fn default_true() -> bool {
    true
}

impl Decision {
    pub fn max_iterations_reached() -> Self {
        Self {
            should_continue: false,
            reason: "Maximum iterations reached".into(),
            recommendation: Recommendation::Conclude,
            confidence: 1.0,
            degraded: false,
        }
    }

    /// Continue unless within the last two allowed iterations.
    pub fn fallback(iteration: u32, max_iterations: u32) -> Self {
        Self {
            should_continue: iteration < max_iterations.saturating_sub(2),
            reason: "Default behavior due to decision error".into(),
            recommendation: Recommendation::Continue,
            confidence: 0.0,
            degraded: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plan_parses_loose_model_output() {
        let plan: Plan = serde_json::from_value(json!({
            "information_requirements": "Who owns the domain",
            "collection_strategy": {"description": "DNS first"},
            "actions": [
                {"tool": "dns_lookup", "parameters": {"domain": "example.com"}, "priority": "low"},
                {"tool": "web_search", "parameters": "example.com owner", "priority": 1}
            ],
            "success_criteria": ["owner identified"],
            "risk_assessment": ["rate limits", "stale records"]
        }))
        .unwrap();
        assert_eq!(plan.information_requirements, vec!["Who owns the domain"]);
        assert_eq!(plan.collection_strategy, "DNS first");
        assert_eq!(plan.actions[1].parameters["query"], "example.com owner");
        let queue = plan.action_queue();
        assert_eq!(queue[0].tool, "web_search");
        assert_eq!(queue[1].tool, "dns_lookup");
        assert!(!plan.degraded);
    }

    #[test]
    fn fallback_plan_uses_first_tool_and_objective() {
        let plan = Plan::fallback("abc", "find things", Some("web_search"));
        assert!(plan.degraded);
        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.actions[0].tool, "web_search");
        assert_eq!(plan.actions[0].parameters["query"], "find things");

        let none = Plan::fallback("abc", "find things", None);
        assert_eq!(none.actions[0].tool, "none");
    }

    #[test]
    fn key_findings_accept_strings_and_objects() {
        let analysis: Analysis = serde_json::from_value(json!({
            "key_findings": [
                "plain sentence",
                {"finding": "exposed admin panel", "confidence": "HIGH", "significance": "High",
                 "evidence": "http_probe"}
            ],
            "confidence_assessment": "medium",
            "risk_indicators": {"indicator": "expired cert"}
        }))
        .unwrap();
        assert_eq!(analysis.key_findings.len(), 2);
        assert_eq!(analysis.key_findings[0].confidence, ConfidenceLevel::Low);
        assert_eq!(analysis.key_findings[1].confidence, ConfidenceLevel::High);
        assert_eq!(analysis.key_findings[1].significance, Significance::High);
        assert_eq!(analysis.key_findings[1].evidence, vec!["http_probe"]);
        assert_eq!(
            analysis.confidence_assessment.overall,
            ConfidenceLevel::Medium
        );
        assert_eq!(analysis.risk_indicators.len(), 1);
        assert_eq!(analysis.findings_at_or_above(ConfidenceLevel::Medium), 1);
    }

    #[test]
    fn confidence_assessment_keeps_details() {
        let ca: ConfidenceAssessment =
            serde_json::from_value(json!({"overall": 0.95, "dns": "high"})).unwrap();
        assert_eq!(ca.overall, ConfidenceLevel::VeryHigh);
        assert_eq!(ca.details["dns"], "high");
    }

    #[test]
    fn entity_without_name_is_rejected() {
        let res: Result<ProcessedData, _> =
            serde_json::from_value(json!({"entities": [{"type": "domain"}]}));
        assert!(res.is_err());
    }

    #[test]
    fn degraded_processed_data_preserves_raw_count() {
        let p = ProcessedData::degraded(7, "gateway down");
        assert!(p.degraded);
        assert_eq!(p.sources_processed, 7);
        assert!(p.entities.is_empty());
        assert_eq!(p.data_quality_notes.len(), 1);
    }

    #[test]
    fn decision_recommendation_is_lenient() {
        let d: Decision =
            serde_json::from_value(json!({"continue": true, "recommendation": "Pivot to DNS"}))
                .unwrap();
        assert_eq!(d.recommendation, Recommendation::Pivot);
        let d: Decision = serde_json::from_value(json!({"reason": "enough"})).unwrap();
        assert!(d.should_continue);
        assert_eq!(d.recommendation, Recommendation::Continue);
    }

    #[test]
    fn decision_fallback_stops_near_the_limit() {
        assert!(Decision::fallback(0, 15).should_continue);
        assert!(Decision::fallback(12, 15).should_continue);
        assert!(!Decision::fallback(13, 15).should_continue);
        assert!(!Decision::fallback(0, 1).should_continue);
    }

    #[test]
    fn evaluation_scores_parse_from_strings() {
        let e: Evaluation = serde_json::from_value(json!({
            "objective_achievement": "80%",
            "coverage": 65,
            "source_quality": "7/10",
            "lessons_learned": "use more sources"
        }))
        .unwrap();
        assert!((e.objective_achievement - 80.0).abs() < f64::EPSILON);
        assert!((e.source_quality - 7.0).abs() < f64::EPSILON);
        assert_eq!(e.lessons_learned.len(), 1);
    }
}
