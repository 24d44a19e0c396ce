//! Append-only log of investigation phase events.

mod db;

pub use db::RedbAuditLog;

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{OsintError, Result};
use crate::types::Phase;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub investigation_id: String,
    pub timestamp: DateTime<Utc>,
    pub phase: Phase,
    pub action: String,
    #[serde(default)]
    pub data: Value,
}

impl AuditEntry {
    pub fn new(
        investigation_id: impl Into<String>,
        phase: Phase,
        action: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            investigation_id: investigation_id.into(),
            timestamp: Utc::now(),
            phase,
            action: action.into(),
            data,
        }
    }
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn store(&self, entry: AuditEntry) -> Result<()>;

    /// Entries for one investigation, most recent first, at most `limit`.
    async fn get_by_investigation(
        &self,
        investigation_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<AuditEntry>>;
}

// ---------------------------------------------------------------------------
// MemoryAuditLog
// ---------------------------------------------------------------------------

/// Process-local audit log.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> OsintError {
    OsintError::AuditStore("audit log lock poisoned".into())
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn store(&self, entry: AuditEntry) -> Result<()> {
        self.entries.lock().map_err(poisoned)?.push(entry);
        Ok(())
    }

    async fn get_by_investigation(
        &self,
        investigation_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<AuditEntry>> {
        let entries = self.entries.lock().map_err(poisoned)?;
        Ok(entries
            .iter()
            .rev()
            .filter(|e| e.investigation_id == investigation_id)
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn memory_log_returns_newest_first_for_one_investigation() {
        let log = MemoryAuditLog::new();
        log.store(AuditEntry::new("a", Phase::Planning, "plan_created", json!({})))
            .await
            .unwrap();
        log.store(AuditEntry::new("b", Phase::Planning, "plan_created", json!({})))
            .await
            .unwrap();
        log.store(AuditEntry::new("a", Phase::Collection, "action_executed", json!({"n": 1})))
            .await
            .unwrap();

        let entries = log.get_by_investigation("a", None).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "action_executed");
        assert_eq!(entries[1].action, "plan_created");

        let limited = log.get_by_investigation("a", Some(1)).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].phase, Phase::Collection);
        assert!(log.get_by_investigation("zzz", None).await.unwrap().is_empty());
    }
}
