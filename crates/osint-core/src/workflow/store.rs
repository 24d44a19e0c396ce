//! In-memory registry of workflows and alerts, with JSON export/import.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use super::alert::{Alert, AlertStatus};
use super::{Workflow, WorkflowStatus, WorkflowSummary};
use crate::error::{OsintError, Result};
use crate::types::Severity;

#[derive(Debug, Default)]
struct State {
    workflows: BTreeMap<String, Workflow>,
    alerts: Vec<Alert>,
}

/// Shared registry. All mutation goes through the write lock.
#[derive(Debug, Default)]
pub struct WorkflowStore {
    state: RwLock<State>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowExport {
    #[serde(default)]
    pub workflows: BTreeMap<String, Workflow>,
    #[serde(default)]
    pub alerts: Vec<Alert>,
    pub exported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub workflows: usize,
    pub alerts: usize,
}

impl WorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `workflow`, suffixing its id if it collides. Returns the id.
    pub async fn insert(&self, mut workflow: Workflow) -> String {
        let mut state = self.state.write().await;
        if state.workflows.contains_key(&workflow.id) {
            let base = workflow.id.clone();
            let mut n = 2;
            while state.workflows.contains_key(&format!("{base}_{n}")) {
                n += 1;
            }
            workflow.id = format!("{base}_{n}");
        }
        let id = workflow.id.clone();
        state.workflows.insert(id.clone(), workflow);
        id
    }

    pub async fn get(&self, id: &str) -> Result<Workflow> {
        self.state
            .read()
            .await
            .workflows
            .get(id)
            .cloned()
            .ok_or_else(|| OsintError::WorkflowNotFound(id.to_string()))
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.state.read().await.workflows.contains_key(id)
    }

    /// Mutate one workflow under the write lock.
    pub async fn update<T>(&self, id: &str, f: impl FnOnce(&mut Workflow) -> T) -> Result<T> {
        let mut state = self.state.write().await;
        let wf = state
            .workflows
            .get_mut(id)
            .ok_or_else(|| OsintError::WorkflowNotFound(id.to_string()))?;
        Ok(f(wf))
    }

    pub async fn summaries(&self) -> Vec<WorkflowSummary> {
        self.state
            .read()
            .await
            .workflows
            .values()
            .map(Workflow::summary)
            .collect()
    }

    // -----------------------------------------------------------------------
    // Alerts
    // -----------------------------------------------------------------------

    pub async fn push_alert(&self, alert: Alert) {
        self.state.write().await.alerts.push(alert);
    }

    /// Alerts with `status`, optionally narrowed to one severity, oldest first.
    pub async fn alerts(&self, severity: Option<Severity>, status: AlertStatus) -> Vec<Alert> {
        self.state
            .read()
            .await
            .alerts
            .iter()
            .filter(|a| a.status == status)
            .filter(|a| severity.map_or(true, |s| a.severity == s))
            .cloned()
            .collect()
    }

    pub async fn acknowledge_alert(&self, id: &str) -> Result<Alert> {
        let mut state = self.state.write().await;
        let alert = state
            .alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| OsintError::AlertNotFound(id.to_string()))?;
        alert.acknowledge();
        Ok(alert.clone())
    }

    // -----------------------------------------------------------------------
    // Aggregates
    // -----------------------------------------------------------------------

    pub async fn workflow_counts(&self) -> BTreeMap<WorkflowStatus, usize> {
        let state = self.state.read().await;
        let mut counts = BTreeMap::new();
        for wf in state.workflows.values() {
            *counts.entry(wf.status).or_insert(0) += 1;
        }
        counts
    }

    pub async fn active_alert_counts(&self) -> BTreeMap<Severity, usize> {
        let state = self.state.read().await;
        let mut counts = BTreeMap::new();
        for a in state.alerts.iter().filter(|a| a.status == AlertStatus::Active) {
            *counts.entry(a.severity).or_insert(0) += 1;
        }
        counts
    }

    pub async fn total_executions(&self) -> usize {
        self.state
            .read()
            .await
            .workflows
            .values()
            .map(|w| w.executions.len())
            .sum()
    }

    // -----------------------------------------------------------------------
    // Export / import
    // -----------------------------------------------------------------------

    pub async fn snapshot(&self) -> WorkflowExport {
        let state = self.state.read().await;
        WorkflowExport {
            workflows: state.workflows.clone(),
            alerts: state.alerts.clone(),
            exported_at: Utc::now(),
        }
    }

    pub async fn export(&self, path: &Path) -> Result<()> {
        let snapshot = self.snapshot().await;
        crate::io::write_json(path, &snapshot)?;
        info!(
            path = %path.display(),
            workflows = snapshot.workflows.len(),
            alerts = snapshot.alerts.len(),
            "workflows exported"
        );
        Ok(())
    }

    /// Merge an export back in. Imported workflows replace same-id entries;
    /// `running` ones come back `paused` since their loops did not survive.
    pub async fn import(&self, path: &Path) -> Result<ImportSummary> {
        let data = std::fs::read_to_string(path)?;
        let export: WorkflowExport = serde_json::from_str(&data)?;
        Ok(self.merge(export).await)
    }

    pub async fn merge(&self, export: WorkflowExport) -> ImportSummary {
        let mut state = self.state.write().await;
        let mut summary = ImportSummary::default();
        for (id, mut wf) in export.workflows {
            if wf.status == WorkflowStatus::Running {
                wf.status = WorkflowStatus::Paused;
            }
            state.workflows.insert(id, wf);
            summary.workflows += 1;
        }
        for alert in export.alerts {
            if state.alerts.iter().any(|a| a.id == alert.id) {
                continue;
            }
            state.alerts.push(alert);
            summary.alerts += 1;
        }
        info!(
            workflows = summary.workflows,
            alerts = summary.alerts,
            "workflows imported"
        );
        summary
    }
}
