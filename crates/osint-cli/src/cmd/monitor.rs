use std::path::Path;
use std::time::Duration;

use clap::Args;
use tracing::info;

use osint_core::workflow::{AlertStatus, WorkflowSpec, WorkflowType};

use super::parse_alerts;
use crate::output::{print_alerts, print_json};
use crate::services;

#[derive(Args, Debug)]
pub struct MonitorArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub objective: String,
    /// Seconds between checks (default: orchestrator.check_interval_secs)
    #[arg(long)]
    pub interval: Option<u64>,
    /// Alert rule, e.g. `risk:critical`
    #[arg(long = "alert", value_name = "SPEC")]
    pub alerts: Vec<String>,
}

/// Monitor in the foreground until Ctrl-C, then pause and save state.
pub fn run(root: &Path, args: MonitorArgs, offline: bool, json: bool) -> anyhow::Result<()> {
    let conditions = parse_alerts(&args.alerts)?;
    let services = services::build(root, services::load_config(root)?, offline)?;
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        services.restore_workflows().await?;
        let orch = &services.orchestrator;

        let mut spec = WorkflowSpec::new(args.name, WorkflowType::Continuous, args.objective);
        spec.alert_conditions = conditions;
        let id = orch.create_workflow(spec).await?;
        orch
            .continuous_monitoring(&id, args.interval.map(Duration::from_secs))
            .await?;
        let period = orch.get_workflow_status(&id).await?.check_interval_secs;
        info!(workflow_id = %id, interval_secs = ?period, "monitoring; press Ctrl-C to stop");
        if !json {
            println!("Monitoring {id}. Press Ctrl-C to stop.");
        }

        tokio::signal::ctrl_c().await?;
        orch.pause_workflow(&id).await?;
        orch.shutdown().await;
        services.persist_workflows().await?;

        let workflow = orch.get_workflow_status(&id).await?;
        let raised: Vec<_> = orch
            .get_alerts(None, AlertStatus::Active)
            .await
            .into_iter()
            .filter(|a| a.workflow_id == id)
            .collect();

        if json {
            return print_json(&serde_json::json!({
                "workflow": workflow.summary(),
                "alerts": raised,
            }));
        }
        println!();
        println!(
            "Stopped {id} after {} checks. State saved to {}",
            workflow.executions.len(),
            services.workflows_export().display()
        );
        print_alerts(&raised);
        Ok(())
    })
}
