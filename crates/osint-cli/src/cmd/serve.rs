use std::path::Path;

use osint_server::AppState;

use crate::services;

/// Run the dashboard API until Ctrl-C. Workflow state is restored on start
/// and saved on exit.
pub fn run(root: &Path, port: u16, offline: bool) -> anyhow::Result<()> {
    let services = services::build(root, services::load_config(root)?, offline)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        services.restore_workflows().await?;
        let state = AppState::new(services.orchestrator.clone(), services.audit.clone());
        osint_server::serve(state, port).await?;
        services.persist_workflows().await
    })
}
