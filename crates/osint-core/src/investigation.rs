//! Per-run investigation state.
//!
//! An `Investigation` is created at plan time and owned by the `investigate`
//! call driving it, then mutated through every phase. Keeping it out of the
//! engine lets one engine serve many concurrent investigations.

use crate::types::{ConfidenceLevel, Phase};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

// ---------------------------------------------------------------------------
// InvestigationStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestigationStatus {
    #[default]
    InProgress,
    Collecting,
    Completed,
    Failed,
}

impl fmt::Display for InvestigationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InvestigationStatus::InProgress => "in_progress",
            InvestigationStatus::Collecting => "collecting",
            InvestigationStatus::Completed => "completed",
            InvestigationStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Investigation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investigation {
    pub id: String,
    pub objective: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<serde_json::Map<String, serde_json::Value>>,
    pub phase: Phase,
    /// Completed collection iterations. Never exceeds `max_iterations`.
    pub iteration: u32,
    pub max_iterations: u32,
    pub min_confidence: ConfidenceLevel,
    pub status: InvestigationStatus,
    pub created_at: DateTime<Utc>,
}

impl Investigation {
    pub fn new(
        objective: impl Into<String>,
        constraints: Option<serde_json::Map<String, serde_json::Value>>,
        max_iterations: u32,
        min_confidence: ConfidenceLevel,
    ) -> Self {
        let objective = objective.into();
        let created_at = Utc::now();
        Self {
            id: investigation_id(&objective, created_at),
            objective,
            constraints,
            phase: Phase::Planning,
            iteration: 0,
            max_iterations,
            min_confidence,
            status: InvestigationStatus::InProgress,
            created_at,
        }
    }

    /// Move to `phase`, keeping `status` in step with it.
    pub fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        self.status = match phase {
            Phase::Collection => InvestigationStatus::Collecting,
            _ => InvestigationStatus::InProgress,
        };
    }

    /// Terminal transition. A run that gathered nothing and could not be
    /// analyzed ends `Failed`.
    pub fn finish(&mut self, gathered: bool, analyzed: bool) {
        self.status = if gathered || analyzed {
            InvestigationStatus::Completed
        } else {
            InvestigationStatus::Failed
        };
    }

    /// Count one finished collection iteration. Saturates at `max_iterations`.
    pub fn advance_iteration(&mut self) {
        if self.iteration < self.max_iterations {
            self.iteration += 1;
        }
    }

    pub fn iterations_exhausted(&self) -> bool {
        self.iteration >= self.max_iterations
    }
}

/// Deterministic 12-hex-char id derived from the objective and creation instant.
pub fn investigation_id(objective: &str, created_at: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(objective.as_bytes());
    hasher.update(
        created_at
            .to_rfc3339_opts(SecondsFormat::Nanos, true)
            .as_bytes(),
    );
    let digest = hasher.finalize();
    digest
        .iter()
        .take(6)
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn id_is_deterministic_for_same_inputs() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let a = investigation_id("investigate example.com", ts);
        let b = investigation_id("investigate example.com", ts);
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn id_changes_with_objective_or_instant() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let later = ts + chrono::Duration::nanoseconds(1);
        let base = investigation_id("a", ts);
        assert_ne!(base, investigation_id("b", ts));
        assert_ne!(base, investigation_id("a", later));
    }

    #[test]
    fn iteration_saturates_at_max() {
        let mut inv = Investigation::new("x", None, 2, ConfidenceLevel::Medium);
        inv.advance_iteration();
        inv.advance_iteration();
        inv.advance_iteration();
        assert_eq!(inv.iteration, 2);
        assert!(inv.iterations_exhausted());
    }

    #[test]
    fn entering_collection_marks_collecting() {
        let mut inv = Investigation::new("x", None, 5, ConfidenceLevel::Medium);
        inv.enter(Phase::Collection);
        assert_eq!(inv.status, InvestigationStatus::Collecting);
        inv.enter(Phase::Processing);
        assert_eq!(inv.status, InvestigationStatus::InProgress);
    }

    #[test]
    fn finish_fails_only_when_nothing_was_learned() {
        let mut inv = Investigation::new("x", None, 5, ConfidenceLevel::Medium);
        inv.finish(true, false);
        assert_eq!(inv.status, InvestigationStatus::Completed);
        inv.finish(false, true);
        assert_eq!(inv.status, InvestigationStatus::Completed);
        inv.finish(false, false);
        assert_eq!(inv.status, InvestigationStatus::Failed);
        assert_eq!(inv.status.to_string(), "failed");
    }
}
