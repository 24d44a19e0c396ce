//! Drives workflows through the investigator: one-shot runs, scheduled and
//! continuous background loops, alerting and change detection.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::alert::{evaluate_conditions, Alert, AlertCondition, AlertStatus};
use super::change::detect_changes;
use super::store::{ImportSummary, WorkflowStore};
use super::{Execution, Workflow, WorkflowSpec, WorkflowStatus, WorkflowSummary, WorkflowType};
use crate::bundle::InvestigationResult;
use crate::config::OrchestratorConfig;
use crate::engine::Investigator;
use crate::error::{OsintError, Result};
use crate::types::Severity;

/// Shortest accepted monitoring period.
const MIN_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// What `execute_workflow` hands back. Never an `Err`: failures are values.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WorkflowOutcome {
    Completed(Box<InvestigationResult>),
    Failed { error: String },
}

impl WorkflowOutcome {
    pub fn result(&self) -> Option<&InvestigationResult> {
        match self {
            WorkflowOutcome::Completed(r) => Some(r),
            WorkflowOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            WorkflowOutcome::Completed(_) => None,
            WorkflowOutcome::Failed { error } => Some(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, WorkflowOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorStats {
    pub total_workflows: usize,
    pub workflows: BTreeMap<WorkflowStatus, usize>,
    pub active_alerts: BTreeMap<Severity, usize>,
    pub total_executions: usize,
    pub background_tasks: usize,
}

struct BackgroundTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl BackgroundTask {
    /// Cancel and wait for the loop to wind down.
    async fn stop(self, workflow_id: &str) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            if !e.is_cancelled() {
                warn!(workflow_id, error = %e, "background task ended abnormally");
            }
        }
    }
}

struct Inner {
    investigator: Arc<dyn Investigator>,
    store: Arc<WorkflowStore>,
    config: OrchestratorConfig,
    tasks: Mutex<HashMap<String, BackgroundTask>>,
}

/// Cheap to clone; clones share registries and background tasks.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    pub fn new(investigator: Arc<dyn Investigator>, config: OrchestratorConfig) -> Self {
        Self::with_store(investigator, Arc::new(WorkflowStore::new()), config)
    }

    pub fn with_store(
        investigator: Arc<dyn Investigator>,
        store: Arc<WorkflowStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                investigator,
                store,
                config,
                tasks: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn store(&self) -> &Arc<WorkflowStore> {
        &self.inner.store
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.inner.config
    }

    pub(crate) fn investigator(&self) -> Arc<dyn Investigator> {
        Arc::clone(&self.inner.investigator)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Register a `pending` workflow. Nothing runs yet.
    pub async fn create_workflow(&self, spec: WorkflowSpec) -> Result<String> {
        let workflow = Workflow::from_spec(spec);
        let name = workflow.name.clone();
        let kind = workflow.kind;
        let id = self.inner.store.insert(workflow).await;
        info!(workflow_id = %id, name = %name, kind = %kind, "workflow created");
        Ok(id)
    }

    /// Run the workflow's investigation once, record the execution and raise
    /// any alerts. A workflow paused while this runs stays paused.
    pub async fn execute_workflow(&self, id: &str) -> WorkflowOutcome {
        let started = self
            .inner
            .store
            .update(id, |wf| {
                wf.status = WorkflowStatus::Running;
                wf.clone()
            })
            .await;
        let Ok(workflow) = started else {
            return WorkflowOutcome::Failed {
                error: format!("Workflow {id} not found"),
            };
        };
        info!(workflow_id = %id, name = %workflow.name, "executing workflow");

        let start = Utc::now();
        let outcome = self
            .inner
            .investigator
            .investigate(&workflow.objective, workflow.constraints.clone(), true)
            .await;
        let limit = self.inner.config.result_history_limit.max(1);

        match outcome {
            Ok(result) => {
                let execution = Execution::completed(start, &result);
                let kept = result.clone();
                let recorded = self
                    .inner
                    .store
                    .update(id, move |wf| {
                        wf.executions.push(execution);
                        wf.results.push(kept);
                        if wf.results.len() > limit {
                            let excess = wf.results.len() - limit;
                            wf.results.drain(..excess);
                        }
                        settle(wf, WorkflowStatus::Completed);
                    })
                    .await;
                if let Err(e) = recorded {
                    warn!(workflow_id = %id, error = %e, "could not record execution");
                }
                info!(
                    workflow_id = %id,
                    investigation_id = %result.investigation_id,
                    findings = result.finding_count(),
                    "workflow execution completed"
                );
                self.check_alert_conditions(&workflow, &result).await;
                WorkflowOutcome::Completed(Box::new(result))
            }
            Err(e) => {
                let error = e.to_string();
                let execution = Execution::failed(start, error.clone());
                let recorded = self
                    .inner
                    .store
                    .update(id, move |wf| {
                        wf.executions.push(execution);
                        settle(wf, WorkflowStatus::Failed);
                    })
                    .await;
                if let Err(e) = recorded {
                    warn!(workflow_id = %id, error = %e, "could not record execution");
                }
                warn!(workflow_id = %id, error = %error, "workflow execution failed");
                WorkflowOutcome::Failed { error }
            }
        }
    }

    /// Evaluate `workflow`'s conditions against `result` and store an alert
    /// per match.
    pub async fn check_alert_conditions(
        &self,
        workflow: &Workflow,
        result: &InvestigationResult,
    ) -> Vec<Alert> {
        let mut raised = Vec::new();
        for trigger in evaluate_conditions(&workflow.alert_conditions, result) {
            let alert = Alert::new(
                workflow,
                trigger.condition,
                trigger.data,
                &result.investigation_id,
            );
            self.record_alert(&alert).await;
            raised.push(alert);
        }
        raised
    }

    async fn record_alert(&self, alert: &Alert) {
        warn!(
            alert_id = %alert.id,
            workflow = %alert.workflow_name,
            severity = %alert.severity,
            condition = %alert.condition,
            "alert triggered"
        );
        self.inner.store.push_alert(alert.clone()).await;
    }

    /// Start the schedule loop: execute, sleep one interval, repeat until
    /// paused. Without an interval the workflow runs once.
    pub async fn schedule_workflow(&self, id: &str) -> Result<()> {
        let workflow = self.inner.store.get(id).await?;
        let interval = workflow.schedule_config.interval.map(|i| i.period());
        info!(
            workflow_id = %id,
            period_secs = interval.map(|p| p.as_secs()),
            "workflow scheduled"
        );
        let cancel = CancellationToken::new();
        let task = self.clone().schedule_loop(id.to_string(), interval, cancel.clone());
        self.supervise(id, cancel, task).await;
        Ok(())
    }

    async fn schedule_loop(self, id: String, interval: Option<Duration>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = self.execute_workflow(&id) => {}
            }
            let Some(period) = interval else { break };
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(period) => {}
            }
        }
        info!(workflow_id = %id, "schedule loop stopped");
    }

    /// Start the monitoring loop. `check_interval` falls back to the period
    /// remembered from an earlier loop, then to the configured default.
    pub async fn continuous_monitoring(&self, id: &str, check_interval: Option<Duration>) -> Result<()> {
        let default = self.inner.config.check_interval();
        let workflow = self.inner.store.get(id).await?;
        let period = check_interval
            .or_else(|| workflow.check_interval_secs.map(Duration::from_secs))
            .unwrap_or(default)
            .max(MIN_CHECK_INTERVAL);
        self.inner
            .store
            .update(id, |wf| wf.check_interval_secs = Some(period.as_secs()))
            .await?;
        info!(workflow_id = %id, period_secs = period.as_secs(), "continuous monitoring started");

        let cancel = CancellationToken::new();
        let task = self.clone().monitor_loop(id.to_string(), period, cancel.clone());
        self.supervise(id, cancel, task).await;
        Ok(())
    }

    async fn monitor_loop(self, id: String, period: Duration, cancel: CancellationToken) {
        // Only successful results are compared.
        let mut baseline = self
            .inner
            .store
            .get(&id)
            .await
            .ok()
            .and_then(|wf| wf.last_result().cloned());
        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                outcome = self.execute_workflow(&id) => outcome,
            };
            if let WorkflowOutcome::Completed(result) = outcome {
                if let Some(previous) = &baseline {
                    self.raise_changes(&id, previous, &result).await;
                }
                baseline = Some(*result);
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(period) => {}
            }
        }
        info!(workflow_id = %id, "monitoring loop stopped");
    }

    async fn raise_changes(&self, id: &str, previous: &InvestigationResult, current: &InvestigationResult) {
        let changes = detect_changes(previous, current);
        if changes.is_empty() {
            return;
        }
        let Ok(workflow) = self.inner.store.get(id).await else {
            return;
        };
        info!(workflow_id = %id, changes = changes.len(), "changes detected");
        let alert = Alert::new(
            &workflow,
            AlertCondition::change_detected(),
            json!({ "changes": changes }),
            &current.investigation_id,
        );
        self.record_alert(&alert).await;
    }

    /// Replace any loop already running for `id` with `task`.
    async fn supervise<F>(&self, id: &str, cancel: CancellationToken, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.inner.tasks.lock().await;
        if let Some(previous) = tasks.remove(id) {
            previous.stop(id).await;
        }
        let handle = tokio::spawn(task);
        tasks.insert(id.to_string(), BackgroundTask { cancel, handle });
    }

    /// Stop the workflow's background loop, if any, then mark it paused.
    pub async fn pause_workflow(&self, id: &str) -> Result<()> {
        if !self.inner.store.contains(id).await {
            return Err(OsintError::WorkflowNotFound(id.to_string()));
        }
        let task = self.inner.tasks.lock().await.remove(id);
        if let Some(task) = task {
            task.stop(id).await;
        }
        self.inner
            .store
            .update(id, |wf| wf.status = WorkflowStatus::Paused)
            .await?;
        info!(workflow_id = %id, "workflow paused");
        Ok(())
    }

    /// Restart the loop matching the workflow's type. One-time and
    /// triggered workflows just go back to `pending`.
    pub async fn resume_workflow(&self, id: &str) -> Result<()> {
        let kind = self
            .inner
            .store
            .update(id, |wf| {
                wf.status = WorkflowStatus::Pending;
                wf.kind
            })
            .await?;
        info!(workflow_id = %id, kind = %kind, "workflow resumed");
        match kind {
            WorkflowType::Scheduled => self.schedule_workflow(id).await,
            WorkflowType::Continuous => self.continuous_monitoring(id, None).await,
            WorkflowType::OneTime | WorkflowType::Triggered => Ok(()),
        }
    }

    /// `true` while a background loop for `id` is alive.
    pub async fn is_active(&self, id: &str) -> bool {
        self.inner
            .tasks
            .lock()
            .await
            .get(id)
            .is_some_and(|t| !t.handle.is_finished())
    }

    /// Cancel and join every background loop.
    pub async fn shutdown(&self) {
        let tasks: Vec<_> = self.inner.tasks.lock().await.drain().collect();
        let count = tasks.len();
        for (id, task) in tasks {
            task.stop(&id).await;
        }
        info!(tasks = count, "orchestrator shut down");
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub async fn get_workflow_status(&self, id: &str) -> Result<Workflow> {
        self.inner.store.get(id).await
    }

    pub async fn get_all_workflows(&self) -> Vec<WorkflowSummary> {
        self.inner.store.summaries().await
    }

    pub async fn get_alerts(&self, severity: Option<Severity>, status: AlertStatus) -> Vec<Alert> {
        self.inner.store.alerts(severity, status).await
    }

    pub async fn acknowledge_alert(&self, id: &str) -> Result<Alert> {
        let alert = self.inner.store.acknowledge_alert(id).await?;
        info!(alert_id = %id, "alert acknowledged");
        Ok(alert)
    }

    pub async fn stats(&self) -> OrchestratorStats {
        let workflows = self.inner.store.workflow_counts().await;
        let background_tasks = self
            .inner
            .tasks
            .lock()
            .await
            .values()
            .filter(|t| !t.handle.is_finished())
            .count();
        OrchestratorStats {
            total_workflows: workflows.values().sum(),
            workflows,
            active_alerts: self.inner.store.active_alert_counts().await,
            total_executions: self.inner.store.total_executions().await,
            background_tasks,
        }
    }

    pub async fn export_workflows(&self, path: &Path) -> Result<()> {
        self.inner.store.export(path).await
    }

    pub async fn import_workflows(&self, path: &Path) -> Result<ImportSummary> {
        self.inner.store.import(path).await
    }
}

fn settle(workflow: &mut Workflow, status: WorkflowStatus) {
    if workflow.status != WorkflowStatus::Paused {
        workflow.status = status;
    }
}
