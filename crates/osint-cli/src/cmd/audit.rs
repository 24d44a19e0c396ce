use std::path::Path;

use osint_core::audit::{AuditLog, RedbAuditLog};

use crate::output::{print_json, print_table};
use crate::services;

/// Print an investigation's audit trail, newest first.
pub fn run(root: &Path, investigation_id: &str, limit: Option<usize>, json: bool) -> anyhow::Result<()> {
    let config = services::load_config(root)?;
    let log = RedbAuditLog::open(&config.audit_db_path(root))?;
    let rt = tokio::runtime::Runtime::new()?;
    let entries = rt.block_on(log.get_by_investigation(investigation_id, limit))?;

    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No audit entries for {investigation_id}.");
        return Ok(());
    }
    let rows = entries
        .iter()
        .map(|e| {
            vec![
                e.timestamp.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
                e.phase.to_string(),
                e.action.clone(),
            ]
        })
        .collect();
    print_table(&["TIMESTAMP", "PHASE", "ACTION"], rows);
    Ok(())
}
