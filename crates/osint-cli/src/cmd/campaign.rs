use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;

use osint_core::io::write_json;
use osint_core::paths;
use osint_core::workflow::{CampaignOutcome, CampaignTarget, TARGET_PLACEHOLDER};

use crate::output::{print_json, print_table};
use crate::services;

#[derive(Args, Debug)]
pub struct CampaignArgs {
    #[arg(long)]
    pub name: String,
    /// Objective template; `{target}` is replaced by each target
    #[arg(long)]
    pub template: String,
    /// Target, repeatable
    #[arg(long = "target", value_name = "TARGET", required = true)]
    pub targets: Vec<String>,
    /// Investigate all targets concurrently
    #[arg(long)]
    pub parallel: bool,
    /// Where to write the campaign JSON (default: export dir)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(root: &Path, args: CampaignArgs, offline: bool, json: bool) -> anyhow::Result<()> {
    if !args.template.contains(TARGET_PLACEHOLDER) {
        tracing::warn!(template = %args.template, "template has no {{target}} placeholder");
    }
    let services = services::build(root, services::load_config(root)?, offline)?;
    let targets: Vec<CampaignTarget> = args.targets.into_iter().map(CampaignTarget::from).collect();

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(services.orchestrator.run_campaign(
        &args.name,
        targets,
        &args.template,
        args.parallel,
    ));

    let out = args
        .out
        .unwrap_or_else(|| paths::campaign_file(&services.export_dir(), &args.name));
    write_json(&out, &result).with_context(|| format!("failed to write {}", out.display()))?;

    if json {
        return print_json(&result);
    }
    let rows = result
        .targets
        .iter()
        .zip(&result.results)
        .map(|(target, outcome)| match outcome {
            CampaignOutcome::Completed(r) => vec![
                target.name().to_string(),
                "completed".to_string(),
                r.finding_count().to_string(),
                r.investigation_id.clone(),
            ],
            CampaignOutcome::Failed { error, .. } => vec![
                target.name().to_string(),
                "failed".to_string(),
                "-".to_string(),
                error.clone(),
            ],
        })
        .collect();
    print_table(&["TARGET", "STATUS", "FINDINGS", "DETAIL"], rows);
    println!();
    println!(
        "{}: {} completed, {} failed. Saved: {}",
        result.campaign_name,
        result.completed,
        result.failed,
        out.display()
    );
    Ok(())
}
