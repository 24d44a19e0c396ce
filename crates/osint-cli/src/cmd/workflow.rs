use std::path::Path;

use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use osint_core::types::Severity;
use osint_core::workflow::{AlertStatus, WorkflowOutcome, WorkflowSpec, WorkflowType};

use super::parse_alerts;
use crate::output::{print_alerts, print_json, print_result_summary, print_table};
use crate::services::{self, Services};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum WorkflowSubcommand {
    /// Create and execute a one-time workflow
    Run {
        #[arg(long)]
        name: String,
        #[arg(long)]
        objective: String,
        /// Alert rule, e.g. `finding_count:3:high` or `keyword:breach,leak`
        #[arg(long = "alert", value_name = "SPEC")]
        alerts: Vec<String>,
    },

    /// List saved workflows
    List,

    /// List saved alerts
    Alerts {
        /// Only this severity: low, medium, high or critical
        #[arg(long)]
        severity: Option<String>,
        /// Show acknowledged alerts instead of active ones
        #[arg(long)]
        acknowledged: bool,
    },

    /// Acknowledge an alert
    Ack { id: String },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: WorkflowSubcommand, offline: bool, json: bool) -> anyhow::Result<()> {
    let services = services::build(root, services::load_config(root)?, offline)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        services.restore_workflows().await?;
        match subcmd {
            WorkflowSubcommand::Run {
                name,
                objective,
                alerts,
            } => run_once(&services, name, objective, &alerts, json).await,
            WorkflowSubcommand::List => list(&services, json).await,
            WorkflowSubcommand::Alerts {
                severity,
                acknowledged,
            } => alerts(&services, severity.as_deref(), acknowledged, json).await,
            WorkflowSubcommand::Ack { id } => ack(&services, &id, json).await,
        }
    })
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

async fn run_once(
    services: &Services,
    name: String,
    objective: String,
    alert_specs: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let conditions = parse_alerts(alert_specs)?;
    let mut spec = WorkflowSpec::new(name, WorkflowType::OneTime, objective);
    spec.alert_conditions = conditions;

    let orch = &services.orchestrator;
    let id = orch.create_workflow(spec).await?;
    let outcome = orch.execute_workflow(&id).await;

    let raised: Vec<_> = match outcome.result() {
        Some(result) => orch
            .get_alerts(None, AlertStatus::Active)
            .await
            .into_iter()
            .filter(|a| a.workflow_id == id && a.investigation_id == result.investigation_id)
            .collect(),
        None => Vec::new(),
    };
    services.persist_workflows().await?;

    if json {
        print_json(&json!({
            "workflow_id": id,
            "outcome": outcome,
            "alerts": raised,
        }))?;
    } else {
        println!("Workflow: {id}");
        match &outcome {
            WorkflowOutcome::Completed(result) => print_result_summary(result),
            WorkflowOutcome::Failed { error } => println!("Failed: {error}"),
        }
        println!();
        print_alerts(&raised);
    }

    if let Some(error) = outcome.error() {
        anyhow::bail!("workflow {id} failed: {error}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// list / alerts / ack
// ---------------------------------------------------------------------------

async fn list(services: &Services, json: bool) -> anyhow::Result<()> {
    let workflows = services.orchestrator.get_all_workflows().await;
    if json {
        return print_json(&workflows);
    }
    if workflows.is_empty() {
        println!("No workflows.");
        return Ok(());
    }
    let rows = workflows
        .iter()
        .map(|w| {
            vec![
                w.id.clone(),
                w.kind.to_string(),
                w.status.to_string(),
                w.executions.to_string(),
                w.objective.clone(),
            ]
        })
        .collect();
    print_table(&["ID", "TYPE", "STATUS", "RUNS", "OBJECTIVE"], rows);
    Ok(())
}

async fn alerts(
    services: &Services,
    severity: Option<&str>,
    acknowledged: bool,
    json: bool,
) -> anyhow::Result<()> {
    let severity = severity.map(str::parse::<Severity>).transpose()?;
    let status = if acknowledged {
        AlertStatus::Acknowledged
    } else {
        AlertStatus::Active
    };
    let alerts = services.orchestrator.get_alerts(severity, status).await;
    if json {
        return print_json(&alerts);
    }
    print_alerts(&alerts);
    Ok(())
}

async fn ack(services: &Services, id: &str, json: bool) -> anyhow::Result<()> {
    let alert = services
        .orchestrator
        .acknowledge_alert(id)
        .await
        .with_context(|| format!("cannot acknowledge {id}"))?;
    services.persist_workflows().await?;
    if json {
        return print_json(&alert);
    }
    println!("Acknowledged {}", alert.id);
    Ok(())
}
