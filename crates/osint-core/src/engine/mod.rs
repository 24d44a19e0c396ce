//! Investigation engine: drives one objective through the intelligence
//! lifecycle.
//!
//! ```text
//! PLANNING → COLLECTION ⇄ (adaptive loop) → PROCESSING → ANALYSIS
//!          → DISSEMINATION (optional) → FEEDBACK
//! ```
//!
//! The engine holds no per-run state; every `investigate` call owns its own
//! [`Investigation`], so one engine can serve concurrent runs.

mod phases;
pub(crate) mod prompts;
mod report;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::audit::{AuditEntry, AuditLog};
use crate::bundle::{distinct_tools, InvestigationResult, RunMetadata};
use crate::config::EngineConfig;
use crate::error::{OsintError, Result};
use crate::gateway::ReasoningGateway;
use crate::intel::Recommendation;
use crate::investigation::{Investigation, InvestigationStatus};
use crate::tool::ToolRegistry;
use crate::types::Phase;

/// Anything that can turn an objective into a result bundle. The
/// orchestrator depends on this rather than on the concrete engine.
#[async_trait]
pub trait Investigator: Send + Sync {
    async fn investigate(
        &self,
        objective: &str,
        constraints: Option<Map<String, Value>>,
        auto_report: bool,
    ) -> Result<InvestigationResult>;
}

pub struct InvestigationEngine {
    gateway: Arc<dyn ReasoningGateway>,
    tools: ToolRegistry,
    audit: Arc<dyn AuditLog>,
    config: EngineConfig,
}

impl InvestigationEngine {
    pub fn new(
        gateway: Arc<dyn ReasoningGateway>,
        tools: ToolRegistry,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            gateway,
            tools,
            audit,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn audit(&self) -> &Arc<dyn AuditLog> {
        &self.audit
    }

    /// Allocate the per-run state for `objective`.
    pub fn begin(
        &self,
        objective: &str,
        constraints: Option<Map<String, Value>>,
    ) -> Result<Investigation> {
        let objective = objective.trim();
        if objective.is_empty() {
            return Err(OsintError::InvalidObjective(
                "objective must not be empty".into(),
            ));
        }
        Ok(Investigation::new(
            objective,
            constraints,
            self.config.max_iterations,
            self.config.min_confidence,
        ))
    }

    /// Run the full lifecycle. Phase failures degrade, they never abort.
    pub async fn investigate(
        &self,
        objective: &str,
        constraints: Option<Map<String, Value>>,
        auto_report: bool,
    ) -> Result<InvestigationResult> {
        let start = Utc::now();
        let mut inv = self.begin(objective, constraints)?;
        info!(investigation_id = %inv.id, objective = %inv.objective, "investigation starting");

        let mut plan = self.plan(&mut inv).await;
        let mut queue = plan.action_queue();
        let mut results = Vec::new();
        let batch_size = self.config.batch_size.max(1);

        while !queue.is_empty() && !inv.iterations_exhausted() {
            info!(
                investigation_id = %inv.id,
                "iteration {}/{}",
                inv.iteration + 1,
                inv.max_iterations
            );
            let take = batch_size.min(queue.len());
            let batch: Vec<_> = queue.drain(..take).collect();
            let collected = self.collect_batch(&mut inv, &batch).await;
            results.extend(collected);

            let decision = self.should_continue(&inv, &results).await;
            if !decision.should_continue {
                info!(investigation_id = %inv.id, reason = %decision.reason, "concluding collection");
                break;
            }
            if queue.is_empty() && decision.recommendation == Recommendation::Pivot {
                let adapted = self.adapt_strategy(&inv, &plan, &results).await;
                plan.actions.extend(adapted.iter().cloned());
                queue.extend(adapted);
            }
            inv.advance_iteration();
        }

        let processed_data = self.process(&mut inv, &results).await;
        let analysis = self.analyze(&mut inv, &processed_data, None).await;
        let report = if auto_report {
            let format = self.config.report_format;
            let classification = self.config.classification.clone();
            Some(
                self.generate_report(&mut inv, &analysis, format, &classification)
                    .await,
            )
        } else {
            None
        };
        let evaluation = self.evaluate(&mut inv).await;

        inv.finish(results.iter().any(|r| r.success), !analysis.degraded);
        if inv.status == InvestigationStatus::Failed {
            warn!(investigation_id = %inv.id, "no data gathered and analysis unavailable");
        }
        let end = Utc::now();
        let metadata = RunMetadata {
            start_time: Some(start),
            end_time: Some(end),
            duration_seconds: (end - start).num_milliseconds() as f64 / 1000.0,
            iterations: inv.iteration,
            tools_used: distinct_tools(&results),
            confident_findings: analysis.findings_at_or_above(inv.min_confidence),
            status: inv.status,
        };
        info!(
            investigation_id = %inv.id,
            iterations = inv.iteration,
            results = results.len(),
            findings = analysis.key_findings.len(),
            duration_seconds = metadata.duration_seconds,
            "investigation complete"
        );

        Ok(InvestigationResult {
            investigation_id: inv.id,
            objective: inv.objective,
            plan,
            collection_results: results,
            processed_data,
            analysis,
            report,
            evaluation,
            metadata,
        })
    }

    /// Audit trail for `inv`, newest first. Read failures yield an empty trail.
    async fn history(&self, inv: &Investigation, limit: Option<usize>) -> Vec<AuditEntry> {
        match self.audit.get_by_investigation(&inv.id, limit).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(investigation_id = %inv.id, error = %e, "audit history unavailable");
                Vec::new()
            }
        }
    }

    async fn log_action(&self, inv: &Investigation, phase: Phase, action: &str, data: Value) {
        info!(investigation_id = %inv.id, %phase, action, "audit");
        let entry = AuditEntry::new(&inv.id, phase, action, data);
        if let Err(e) = self.audit.store(entry).await {
            warn!(investigation_id = %inv.id, error = %e, "failed to write audit entry");
        }
    }
}

#[async_trait]
impl Investigator for InvestigationEngine {
    async fn investigate(
        &self,
        objective: &str,
        constraints: Option<Map<String, Value>>,
        auto_report: bool,
    ) -> Result<InvestigationResult> {
        InvestigationEngine::investigate(self, objective, constraints, auto_report).await
    }
}
