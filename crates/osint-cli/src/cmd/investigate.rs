use std::path::Path;

use anyhow::Context;
use clap::Args;
use serde_json::{Map, Value};

use osint_core::io::write_json;
use osint_core::paths;
use osint_core::types::ReportFormat;

use crate::output::{print_json, print_result_summary};
use crate::services;

#[derive(Args, Debug)]
pub struct InvestigateArgs {
    /// What to find out, e.g. "map the external footprint of example.com"
    #[arg(required = true, num_args = 1..)]
    pub objective: Vec<String>,

    /// JSON object of constraints passed to planning
    #[arg(long)]
    pub constraints: Option<String>,

    /// Report format: markdown, html, json or text
    #[arg(long)]
    pub format: Option<String>,

    /// Skip the dissemination report
    #[arg(long)]
    pub no_report: bool,

    /// Override engine.max_iterations
    #[arg(long)]
    pub max_iterations: Option<u32>,
}

pub fn run(root: &Path, args: InvestigateArgs, offline: bool, json: bool) -> anyhow::Result<()> {
    let objective = args.objective.join(" ");
    let constraints = args
        .constraints
        .as_deref()
        .map(serde_json::from_str::<Map<String, Value>>)
        .transpose()
        .context("--constraints must be a JSON object")?;

    let mut config = services::load_config(root)?;
    if let Some(format) = args.format.as_deref() {
        config.engine.report_format = format.parse::<ReportFormat>()?;
    }
    if let Some(n) = args.max_iterations {
        config.engine.max_iterations = n;
    }

    let services = services::build(root, config, offline)?;
    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(services.engine.investigate(&objective, constraints, !args.no_report))?;

    let dir = services.config.investigations_dir(root);
    let path = paths::investigation_file(&dir, &result.investigation_id);
    write_json(&path, &result).with_context(|| format!("failed to save {}", path.display()))?;

    if json {
        return print_json(&result);
    }
    print_result_summary(&result);
    if let Some(report) = &result.report {
        println!();
        println!("{report}");
    }
    println!();
    println!("Saved: {}", path.display());
    Ok(())
}
