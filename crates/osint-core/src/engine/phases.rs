//! One method per lifecycle phase. Each catches its own failure and returns
//! the phase's named fallback so `investigate` always completes.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::{prompts, report, InvestigationEngine};
use crate::audit::AuditEntry;
use crate::error::{OsintError, Result};
use crate::gateway::complete_json;
use crate::intel::{
    ActionErrorKind, ActionResult, Analysis, Decision, Evaluation, Plan, PlannedAction,
    ProcessedData,
};
use crate::investigation::Investigation;
use crate::types::{Phase, ReportFormat};

/// Most results shown to the decision prompt.
const DECISION_WINDOW: usize = 5;
/// Most history entries shown to the analysis prompt.
const ANALYSIS_HISTORY: usize = 10;
/// Most actions accepted from one strategy adaptation.
const MAX_ADAPTED_ACTIONS: usize = 5;

#[derive(Deserialize)]
#[serde(untagged)]
enum AdaptedActions {
    List(Vec<PlannedAction>),
    Wrapped {
        #[serde(alias = "new_actions")]
        actions: Vec<PlannedAction>,
    },
}

fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

impl InvestigationEngine {
    // -----------------------------------------------------------------------
    // Planning
    // -----------------------------------------------------------------------

    pub async fn plan(&self, inv: &mut Investigation) -> Plan {
        inv.enter(Phase::Planning);
        match self.try_plan(inv).await {
            Ok(plan) => {
                self.log_action(inv, Phase::Planning, "investigation_planned", json!(plan))
                    .await;
                plan
            }
            Err(e) => {
                warn!(investigation_id = %inv.id, error = %e, "planning failed, using fallback plan");
                let plan = Plan::fallback(&inv.id, &inv.objective, self.tools.first());
                self.log_action(
                    inv,
                    Phase::Planning,
                    "planning_fallback",
                    json!({"error": e.to_string(), "plan": plan}),
                )
                .await;
                plan
            }
        }
    }

    async fn try_plan(&self, inv: &Investigation) -> Result<Plan> {
        let request = prompts::planning(inv, &self.tools.describe());
        let mut plan: Plan = complete_json(self.gateway.as_ref(), request, Phase::Planning).await?;
        if plan.actions.is_empty() {
            return Err(OsintError::Planning("plan contains no actions".into()));
        }
        plan.investigation_id = inv.id.clone();
        plan.objective = inv.objective.clone();
        plan.created_at = Some(chrono::Utc::now());
        plan.degraded = false;
        Ok(plan)
    }

    // -----------------------------------------------------------------------
    // Collection
    // -----------------------------------------------------------------------

    /// Run one action. Unknown tools and tool errors become failed results.
    pub async fn execute_action(&self, inv: &Investigation, action: &PlannedAction) -> ActionResult {
        let result = match self.tools.lookup(&action.tool) {
            Err(e) => {
                warn!(investigation_id = %inv.id, error = %e, "skipping action");
                ActionResult::failed(
                    &action.tool,
                    action.parameters.clone(),
                    ActionErrorKind::ToolNotFound,
                    format!("Tool '{}' not available", action.tool),
                )
            }
            Ok(tool) => {
                debug!(investigation_id = %inv.id, tool = %action.tool, "executing action");
                match tool.invoke(&action.parameters).await {
                    Ok(data) => {
                        ActionResult::succeeded(&action.tool, action.parameters.clone(), data)
                    }
                    Err(message) => {
                        let err = OsintError::ToolExecution {
                            tool: action.tool.clone(),
                            message,
                        };
                        warn!(investigation_id = %inv.id, tool = %action.tool, error = %err, "tool failed");
                        ActionResult::failed(
                            &action.tool,
                            action.parameters.clone(),
                            ActionErrorKind::ToolExecution,
                            err.to_string(),
                        )
                    }
                }
            }
        };

        let label = if result.success {
            format!("collection_{}", action.tool)
        } else {
            format!("collection_error_{}", action.tool)
        };
        self.log_action(inv, Phase::Collection, &label, json!(result))
            .await;
        result
    }

    /// Execute `actions` strictly in order, pacing between calls.
    pub async fn collect_batch(
        &self,
        inv: &mut Investigation,
        actions: &[PlannedAction],
    ) -> Vec<ActionResult> {
        inv.enter(Phase::Collection);
        let mut results = Vec::with_capacity(actions.len());
        for (i, action) in actions.iter().enumerate() {
            if i > 0 && self.config.pacing_ms > 0 {
                tokio::time::sleep(self.config.pacing()).await;
            }
            info!(
                investigation_id = %inv.id,
                tool = %action.tool,
                "collection action {}/{}",
                i + 1,
                actions.len()
            );
            results.push(self.execute_action(inv, action).await);
        }
        results
    }

    /// Continue/pivot/conclude check. Always stops once iterations are used up.
    pub async fn should_continue(&self, inv: &Investigation, results: &[ActionResult]) -> Decision {
        if inv.iterations_exhausted() {
            return Decision::max_iterations_reached();
        }
        let request = prompts::decision(inv, tail(results, DECISION_WINDOW));
        match complete_json::<Decision>(self.gateway.as_ref(), request, Phase::Collection).await {
            Ok(d) => d,
            Err(e) => {
                warn!(investigation_id = %inv.id, error = %e, "decision failed, using default");
                Decision::fallback(inv.iteration, inv.max_iterations)
            }
        }
    }

    /// Ask for follow-up actions. Never fails; returns nothing on error.
    pub async fn adapt_strategy(
        &self,
        inv: &Investigation,
        plan: &Plan,
        results: &[ActionResult],
    ) -> Vec<PlannedAction> {
        let request = prompts::adaptation(
            inv,
            plan,
            tail(results, DECISION_WINDOW),
            &self.tools.describe(),
        );
        let adapted =
            complete_json::<AdaptedActions>(self.gateway.as_ref(), request, inv.phase).await;
        let mut actions = match adapted {
            Ok(AdaptedActions::List(a)) | Ok(AdaptedActions::Wrapped { actions: a }) => a,
            Err(e) => {
                warn!(investigation_id = %inv.id, error = %e, "strategy adaptation failed");
                return Vec::new();
            }
        };
        actions.truncate(MAX_ADAPTED_ACTIONS);
        self.log_action(inv, inv.phase, "strategy_adapted", json!(actions))
            .await;
        actions
    }

    // -----------------------------------------------------------------------
    // Processing
    // -----------------------------------------------------------------------

    pub async fn process(&self, inv: &mut Investigation, raw: &[ActionResult]) -> ProcessedData {
        inv.enter(Phase::Processing);
        let processed = match self.try_process(inv, raw).await {
            Ok(p) => p,
            Err(e) => {
                warn!(investigation_id = %inv.id, error = %e, "using degraded processed data");
                ProcessedData::degraded(raw.len(), e.to_string())
            }
        };
        self.log_action(inv, Phase::Processing, "data_processed", json!(processed))
            .await;
        processed
    }

    async fn try_process(&self, inv: &Investigation, raw: &[ActionResult]) -> Result<ProcessedData> {
        let request = prompts::processing(inv, raw);
        let mut processed: ProcessedData =
            complete_json(self.gateway.as_ref(), request, Phase::Processing)
                .await
                .map_err(|e| OsintError::Processing(e.to_string()))?;
        if processed.is_empty() {
            return Err(OsintError::Processing("response contained no processed data".into()));
        }
        processed.sources_processed = raw.len();
        processed.degraded = false;
        processed.error = None;
        Ok(processed)
    }

    // -----------------------------------------------------------------------
    // Analysis
    // -----------------------------------------------------------------------

    pub async fn analyze(
        &self,
        inv: &mut Investigation,
        processed: &ProcessedData,
        context: Option<&Value>,
    ) -> Analysis {
        inv.enter(Phase::Analysis);
        let mut history = self.history(inv, Some(ANALYSIS_HISTORY)).await;
        history.reverse();

        let analysis = match self.try_analyze(inv, processed, &history, context).await {
            Ok(a) => a,
            Err(e) => {
                warn!(investigation_id = %inv.id, error = %e, "using degraded analysis");
                Analysis::degraded(e.to_string())
            }
        };
        self.log_action(inv, Phase::Analysis, "intelligence_analyzed", json!(analysis))
            .await;
        analysis
    }

    async fn try_analyze(
        &self,
        inv: &Investigation,
        processed: &ProcessedData,
        history: &[AuditEntry],
        context: Option<&Value>,
    ) -> Result<Analysis> {
        let request = prompts::analysis(inv, processed, history, context);
        let mut analysis: Analysis = complete_json(self.gateway.as_ref(), request, Phase::Analysis)
            .await
            .map_err(|e| OsintError::Analysis(e.to_string()))?;
        if analysis.is_empty() {
            return Err(OsintError::Analysis("response contained no findings".into()));
        }
        analysis.degraded = false;
        analysis.error = None;
        Ok(analysis)
    }

    // -----------------------------------------------------------------------
    // Dissemination
    // -----------------------------------------------------------------------

    /// JSON reports are a plain serialization of `analysis`; other formats
    /// are written by the gateway with a templated fallback.
    pub async fn generate_report(
        &self,
        inv: &mut Investigation,
        analysis: &Analysis,
        format: ReportFormat,
        classification: &str,
    ) -> String {
        inv.enter(Phase::Dissemination);
        let (text, degraded) = if format == ReportFormat::Json {
            (report::analysis_json(analysis), false)
        } else {
            let request = prompts::report(inv, analysis, format, classification);
            match self.gateway.complete(request).await {
                Ok(text) if !text.trim().is_empty() => (text, false),
                Ok(_) => {
                    warn!(investigation_id = %inv.id, "empty report, using template");
                    (report::fallback(inv, analysis, format, classification), true)
                }
                Err(e) => {
                    let e = OsintError::ReportGeneration(e.to_string());
                    warn!(investigation_id = %inv.id, error = %e, "using templated report");
                    (report::fallback(inv, analysis, format, classification), true)
                }
            }
        };
        self.log_action(
            inv,
            Phase::Dissemination,
            "report_generated",
            json!({
                "report": text,
                "format": format,
                "classification": classification,
                "degraded": degraded,
                "generated_at": chrono::Utc::now(),
            }),
        )
        .await;
        text
    }

    // -----------------------------------------------------------------------
    // Feedback
    // -----------------------------------------------------------------------

    pub async fn evaluate(&self, inv: &mut Investigation) -> Evaluation {
        inv.enter(Phase::Feedback);
        let mut history = self.history(inv, None).await;
        history.reverse();

        match self.try_evaluate(inv, &history).await {
            Ok(evaluation) => {
                self.log_action(
                    inv,
                    Phase::Feedback,
                    "investigation_evaluated",
                    json!(evaluation),
                )
                .await;
                evaluation
            }
            Err(e) => {
                warn!(investigation_id = %inv.id, error = %e, "using zero-score evaluation");
                let evaluation = Evaluation::degraded(&e);
                self.log_action(
                    inv,
                    Phase::Feedback,
                    "evaluation_failed",
                    json!({"error": e.to_string(), "evaluation": evaluation}),
                )
                .await;
                evaluation
            }
        }
    }

    async fn try_evaluate(&self, inv: &Investigation, history: &[AuditEntry]) -> Result<Evaluation> {
        let request = prompts::evaluation(inv, history);
        let mut evaluation: Evaluation =
            complete_json(self.gateway.as_ref(), request, Phase::Feedback)
                .await
                .map_err(|e| OsintError::Evaluation(e.to_string()))?;
        if evaluation.is_empty() {
            return Err(OsintError::Evaluation("response contained no scores".into()));
        }
        evaluation.evaluated_at = Some(chrono::Utc::now());
        evaluation.degraded = false;
        Ok(evaluation)
    }
}
