use std::sync::Arc;

use osint_core::audit::AuditLog;
use osint_core::workflow::Orchestrator;

/// Shared handles for every request handler.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub audit: Arc<dyn AuditLog>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, audit: Arc<dyn AuditLog>) -> Self {
        Self {
            orchestrator,
            audit,
        }
    }
}
