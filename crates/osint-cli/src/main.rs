mod cmd;
mod output;
mod root;
mod services;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cmd::{
    campaign::CampaignArgs, config::ConfigSubcommand, investigate::InvestigateArgs,
    monitor::MonitorArgs, workflow::WorkflowSubcommand,
};

#[derive(Parser)]
#[command(
    name = "osint",
    about = "Autonomous OSINT investigations, monitoring workflows and campaigns",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .osint/ or .git/)
    #[arg(long, global = true, env = "OSINT_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Use the offline reasoning gateway and no network tools
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one investigation through the full intelligence cycle
    Investigate(InvestigateArgs),

    /// Create and run workflows, inspect saved workflows and alerts
    Workflow {
        #[command(subcommand)]
        subcommand: WorkflowSubcommand,
    },

    /// Continuously monitor an objective until Ctrl-C
    Monitor(MonitorArgs),

    /// Investigate many targets from one objective template
    Campaign(CampaignArgs),

    /// Show the audit trail of an investigation
    Audit {
        investigation_id: String,
        /// Most recent N entries only
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Manage .osint/config.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Serve the dashboard API
    Serve {
        #[arg(long, default_value = "8080")]
        port: u16,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Monitor(_) | Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Investigate(args) => cmd::investigate::run(&root, args, cli.offline, cli.json),
        Commands::Workflow { subcommand } => {
            cmd::workflow::run(&root, subcommand, cli.offline, cli.json)
        }
        Commands::Monitor(args) => cmd::monitor::run(&root, args, cli.offline, cli.json),
        Commands::Campaign(args) => cmd::campaign::run(&root, args, cli.offline, cli.json),
        Commands::Audit {
            investigation_id,
            limit,
        } => cmd::audit::run(&root, &investigation_id, limit, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Serve { port } => cmd::serve::run(&root, port, cli.offline),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
