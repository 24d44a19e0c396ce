//! Persistent audit log using redb.
//!
//! # Table design
//!
//! A single `AUDIT` table keyed by
//! ```text
//! [ investigation_id bytes | 0x00 | timestamp_us: u64 BE | seq: u64 BE ]
//! ```
//!
//! The `0x00` separator bounds the id, so the half-open range
//! `id‖0x00 .. id‖0x01` covers exactly one investigation. Within it the
//! big-endian timestamp makes byte order equal time order; `seq` keeps
//! entries written in the same microsecond distinct.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, TableDefinition};

use super::{AuditEntry, AuditLog};
use crate::error::{OsintError, Result};

/// Value: JSON-encoded `AuditEntry`.
const AUDIT: TableDefinition<&[u8], &[u8]> = TableDefinition::new("audit");

fn db_err(e: impl std::fmt::Display) -> OsintError {
    OsintError::AuditStore(e.to_string())
}

fn prefix(investigation_id: &str, terminator: u8) -> Vec<u8> {
    let mut key = Vec::with_capacity(investigation_id.len() + 1);
    key.extend_from_slice(investigation_id.as_bytes());
    key.push(terminator);
    key
}

fn entry_key(entry: &AuditEntry, seq: u64) -> Vec<u8> {
    let mut key = prefix(&entry.investigation_id, 0x00);
    let us = entry.timestamp.timestamp_micros().max(0) as u64;
    key.extend_from_slice(&us.to_be_bytes());
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

struct Inner {
    db: Database,
    seq: AtomicU64,
}

impl Inner {
    fn insert(&self, entry: &AuditEntry) -> Result<()> {
        let key = entry_key(entry, self.seq.fetch_add(1, Ordering::Relaxed));
        let value = serde_json::to_vec(entry).map_err(db_err)?;
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(AUDIT).map_err(db_err)?;
            table
                .insert(key.as_slice(), value.as_slice())
                .map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }

    fn scan(&self, investigation_id: &str, limit: Option<usize>) -> Result<Vec<AuditEntry>> {
        let lower = prefix(investigation_id, 0x00);
        let upper = prefix(investigation_id, 0x01);
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(AUDIT).map_err(db_err)?;

        let mut entries = Vec::new();
        for item in table
            .range(lower.as_slice()..upper.as_slice())
            .map_err(db_err)?
            .rev()
        {
            if limit.is_some_and(|l| entries.len() >= l) {
                break;
            }
            let (_, v) = item.map_err(db_err)?;
            let entry: AuditEntry = serde_json::from_slice(v.value()).map_err(db_err)?;
            entries.push(entry);
        }
        Ok(entries)
    }
}

/// redb-backed [`AuditLog`]. Cheap to clone.
#[derive(Clone)]
pub struct RedbAuditLog {
    inner: Arc<Inner>,
}

impl RedbAuditLog {
    /// Open or create the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(db_err)?;
        // Make sure the table exists before the first read.
        let wt = db.begin_write().map_err(db_err)?;
        wt.open_table(AUDIT).map_err(db_err)?;
        wt.commit().map_err(db_err)?;
        Ok(Self {
            inner: Arc::new(Inner {
                db,
                seq: AtomicU64::new(0),
            }),
        })
    }
}

#[async_trait]
impl AuditLog for RedbAuditLog {
    async fn store(&self, entry: AuditEntry) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || inner.insert(&entry))
            .await
            .map_err(db_err)?
    }

    async fn get_by_investigation(
        &self,
        investigation_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<AuditEntry>> {
        let inner = Arc::clone(&self.inner);
        let id = investigation_id.to_string();
        tokio::task::spawn_blocking(move || inner.scan(&id, limit))
            .await
            .map_err(db_err)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Phase;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use tempfile::TempDir;

    fn entry(id: &str, action: &str, offset_ms: i64) -> AuditEntry {
        let mut e = AuditEntry::new(id, Phase::Collection, action, json!({"action": action}));
        e.timestamp = Utc::now() + Duration::milliseconds(offset_ms);
        e
    }

    #[tokio::test]
    async fn scan_is_scoped_and_newest_first() {
        let dir = TempDir::new().unwrap();
        let log = RedbAuditLog::open(&dir.path().join("audit.redb")).unwrap();

        log.store(entry("abc", "second", 10)).await.unwrap();
        log.store(entry("abc", "first", 0)).await.unwrap();
        log.store(entry("abcd", "other", 5)).await.unwrap();
        log.store(entry("abc", "third", 20)).await.unwrap();

        let entries = log.get_by_investigation("abc", None).await.unwrap();
        let actions: Vec<_> = entries.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, vec!["third", "second", "first"]);

        let limited = log.get_by_investigation("abc", Some(2)).await.unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].action, "third");
    }

    #[tokio::test]
    async fn same_instant_entries_are_all_kept() {
        let dir = TempDir::new().unwrap();
        let log = RedbAuditLog::open(&dir.path().join("audit.redb")).unwrap();
        let ts = Utc::now();
        for action in ["a", "b", "c"] {
            let mut e = entry("x", action, 0);
            e.timestamp = ts;
            log.store(e).await.unwrap();
        }
        assert_eq!(log.get_by_investigation("x", None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn entries_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/audit.redb");
        {
            let log = RedbAuditLog::open(&path).unwrap();
            log.store(entry("inv", "plan_created", 0)).await.unwrap();
        }
        let log = RedbAuditLog::open(&path).unwrap();
        let entries = log.get_by_investigation("inv", None).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].data["action"], "plan_created");
    }
}
