//! Multi-target campaigns: one investigation per target from a shared
//! objective template.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::orchestrator::Orchestrator;
use crate::bundle::InvestigationResult;
use crate::engine::Investigator;
use crate::error::OsintError;

/// Placeholder replaced by each target's name.
pub const TARGET_PLACEHOLDER: &str = "{target}";

/// A bare name, or an object with a `name` and arbitrary extra fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CampaignTarget {
    Plain(String),
    Named {
        name: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl CampaignTarget {
    pub fn name(&self) -> &str {
        match self {
            CampaignTarget::Plain(name) => name,
            CampaignTarget::Named { name, .. } => name,
        }
    }
}

impl From<&str> for CampaignTarget {
    fn from(name: &str) -> Self {
        CampaignTarget::Plain(name.to_string())
    }
}

impl From<String> for CampaignTarget {
    fn from(name: String) -> Self {
        CampaignTarget::Plain(name)
    }
}

/// Per-target entry. `Failed` is tried first when deserialising since a
/// result bundle accepts any object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CampaignOutcome {
    Failed { error: String, target: String },
    Completed(Box<InvestigationResult>),
}

impl CampaignOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, CampaignOutcome::Failed { .. })
    }

    pub fn result(&self) -> Option<&InvestigationResult> {
        match self {
            CampaignOutcome::Completed(r) => Some(r),
            CampaignOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignResult {
    pub campaign_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub targets: Vec<CampaignTarget>,
    /// Same order as `targets`.
    pub results: Vec<CampaignOutcome>,
    pub completed: usize,
    pub failed: usize,
}

fn objective_for(template: &str, target: &CampaignTarget) -> String {
    template.replace(TARGET_PLACEHOLDER, target.name())
}

async fn run_target(
    investigator: Arc<dyn Investigator>,
    objective: String,
    target: String,
) -> CampaignOutcome {
    match investigator.investigate(&objective, None, true).await {
        Ok(result) => CampaignOutcome::Completed(Box::new(result)),
        Err(e) => failed(target, e.to_string()),
    }
}

fn failed(target: String, message: String) -> CampaignOutcome {
    let err = OsintError::CampaignTarget {
        target: target.clone(),
        message: message.clone(),
    };
    warn!(error = %err, "campaign target failed");
    CampaignOutcome::Failed {
        error: message,
        target,
    }
}

impl Orchestrator {
    /// Investigate every target. A failing target yields an `error` entry at
    /// its own position and never stops the others. Sequential runs pause
    /// `campaign_delay_ms` between targets; parallel runs start all at once.
    pub async fn run_campaign(
        &self,
        name: &str,
        targets: Vec<CampaignTarget>,
        template: &str,
        parallel: bool,
    ) -> CampaignResult {
        let start_time = Utc::now();
        info!(campaign = %name, targets = targets.len(), parallel, "campaign starting");

        let results = if parallel {
            let handles: Vec<_> = targets
                .iter()
                .map(|t| {
                    tokio::spawn(run_target(
                        self.investigator(),
                        objective_for(template, t),
                        t.name().to_string(),
                    ))
                })
                .collect();
            join_all(handles)
                .await
                .into_iter()
                .zip(&targets)
                .map(|(joined, target)| {
                    joined.unwrap_or_else(|e| failed(target.name().to_string(), e.to_string()))
                })
                .collect()
        } else {
            let delay = self.config().campaign_delay();
            let mut results = Vec::with_capacity(targets.len());
            for (i, target) in targets.iter().enumerate() {
                if i > 0 && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                info!(campaign = %name, target = %target.name(), "investigating target");
                results.push(
                    run_target(
                        self.investigator(),
                        objective_for(template, target),
                        target.name().to_string(),
                    )
                    .await,
                );
            }
            results
        };

        let failed = results.iter().filter(|r| r.is_failed()).count();
        let completed = results.len() - failed;
        info!(campaign = %name, completed, failed, "campaign complete");
        CampaignResult {
            campaign_name: name.to_string(),
            start_time,
            end_time: Utc::now(),
            targets,
            results,
            completed,
            failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestratorConfig;
    use crate::testing::ScriptedInvestigator;
    use std::time::Duration;

    fn orchestrator(investigator: ScriptedInvestigator) -> (Orchestrator, Arc<ScriptedInvestigator>) {
        let investigator = Arc::new(investigator);
        (
            Orchestrator::new(investigator.clone(), OrchestratorConfig::default()),
            investigator,
        )
    }

    fn targets() -> Vec<CampaignTarget> {
        vec!["T1".into(), "T2".into(), "T3".into()]
    }

    #[tokio::test(start_paused = true)]
    async fn sequential_isolates_failures_in_place() {
        let (orch, inv) = orchestrator(ScriptedInvestigator::new().fail_on("T2"));
        let result = orch
            .run_campaign("c", targets(), "profile {target}", false)
            .await;

        assert_eq!(result.completed, 2);
        assert_eq!(result.failed, 1);
        assert!(!result.results[0].is_failed());
        assert!(result.results[1].is_failed());
        assert!(!result.results[2].is_failed());
        assert_eq!(
            inv.objectives(),
            vec!["profile T1", "profile T2", "profile T3"]
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["results"][1]["target"], "T2");
        assert!(json["results"][1].get("error").is_some());
        assert!(json["results"][0].get("error").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn sequential_waits_between_targets_only() {
        let (orch, _) = orchestrator(ScriptedInvestigator::new());
        let before = tokio::time::Instant::now();
        orch.run_campaign("c", targets(), "{target}", false).await;
        let elapsed = before.elapsed();
        assert!(elapsed >= Duration::from_millis(4000));
        assert!(elapsed < Duration::from_millis(6000));
    }

    #[tokio::test(start_paused = true)]
    async fn parallel_preserves_target_order() {
        let (orch, _) = orchestrator(
            ScriptedInvestigator::new()
                .delay_on("T1", Duration::from_secs(5))
                .fail_on("T2"),
        );
        let before = tokio::time::Instant::now();
        let result = orch.run_campaign("c", targets(), "check {target}", true).await;
        assert!(before.elapsed() < Duration::from_secs(6));

        assert_eq!(result.completed, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.results[0].result().unwrap().objective, "check T1");
        assert!(result.results[1].is_failed());
        assert_eq!(result.results[2].result().unwrap().objective, "check T3");
    }

    #[test]
    fn targets_accept_strings_and_objects() {
        let targets: Vec<CampaignTarget> =
            serde_json::from_value(serde_json::json!(["a.com", {"name": "b.com", "tier": 1}]))
                .unwrap();
        assert_eq!(targets[0].name(), "a.com");
        assert_eq!(targets[1].name(), "b.com");
        assert_eq!(
            objective_for("Investigate {target} infra", &targets[1]),
            "Investigate b.com infra"
        );
    }

    #[test]
    fn failed_entry_round_trips_as_failed() {
        let outcome: CampaignOutcome =
            serde_json::from_value(serde_json::json!({"error": "x", "target": "T2"})).unwrap();
        assert!(outcome.is_failed());
    }
}
