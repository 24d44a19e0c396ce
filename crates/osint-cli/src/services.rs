//! Wires config, audit log, gateway, tools and orchestrator for one command.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, info};

use osint_core::audit::{AuditLog, RedbAuditLog};
use osint_core::config::Config;
use osint_core::engine::InvestigationEngine;
use osint_core::gateway::ReasoningGateway;
use osint_core::paths;
use osint_core::tool::ToolRegistry;
use osint_core::workflow::Orchestrator;
use osint_cli::tools;

pub struct Services {
    pub root: PathBuf,
    pub config: Config,
    pub audit: Arc<dyn AuditLog>,
    pub engine: Arc<InvestigationEngine>,
    pub orchestrator: Orchestrator,
}

/// `offline` forces the offline gateway and drops the network tools.
pub fn build(root: &Path, config: Config, offline: bool) -> anyhow::Result<Services> {
    let audit_path = config.audit_db_path(root);
    let audit: Arc<dyn AuditLog> = Arc::new(
        RedbAuditLog::open(&audit_path)
            .with_context(|| format!("failed to open audit log {}", audit_path.display()))?,
    );

    let gateway: Arc<dyn ReasoningGateway> = if offline {
        Arc::new(reasoning_client::OfflineGateway)
    } else {
        reasoning_client::from_config(&config.reasoning)
    };

    let registry = if offline {
        ToolRegistry::new()
    } else {
        let http = tools::http_client(Duration::from_secs(config.reasoning.timeout_secs.min(30)))
            .context("failed to build HTTP client")?;
        tools::default_registry(http)
    };
    debug!(tools = ?registry.names(), offline, "tool registry ready");

    let engine = Arc::new(
        InvestigationEngine::new(gateway, registry, audit.clone()).with_config(config.engine.clone()),
    );
    let orchestrator = Orchestrator::new(engine.clone(), config.orchestrator.clone());

    Ok(Services {
        root: root.to_path_buf(),
        config,
        audit,
        engine,
        orchestrator,
    })
}

impl Services {
    pub fn export_dir(&self) -> PathBuf {
        self.config.export_dir(&self.root)
    }

    pub fn workflows_export(&self) -> PathBuf {
        paths::workflows_export(&self.export_dir())
    }

    /// Merge the previous session's workflows and alerts, if any.
    pub async fn restore_workflows(&self) -> anyhow::Result<()> {
        let path = self.workflows_export();
        if !path.exists() {
            return Ok(());
        }
        let summary = self
            .orchestrator
            .import_workflows(&path)
            .await
            .with_context(|| format!("failed to import {}", path.display()))?;
        info!(workflows = summary.workflows, alerts = summary.alerts, "restored workflow state");
        Ok(())
    }

    pub async fn persist_workflows(&self) -> anyhow::Result<()> {
        let path = self.workflows_export();
        self.orchestrator
            .export_workflows(&path)
            .await
            .with_context(|| format!("failed to export {}", path.display()))
    }
}

pub fn load_config(root: &Path) -> anyhow::Result<Config> {
    Config::load(root).context("failed to load config")
}
