use serde::{Deserialize, Serialize};

use crate::bundle::InvestigationResult;

/// One difference between two consecutive results of a monitored workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Change {
    NewEntities {
        count: usize,
        entities: Vec<String>,
    },
    RemovedEntities {
        count: usize,
        entities: Vec<String>,
    },
    /// Only raised for increases.
    NewFindings {
        previous_count: usize,
        current_count: usize,
        delta: usize,
    },
}

/// Compare entity names and finding counts of two results. Entity lists are
/// sorted.
pub fn detect_changes(previous: &InvestigationResult, current: &InvestigationResult) -> Vec<Change> {
    let mut changes = Vec::new();
    let before = previous.entity_names();
    let after = current.entity_names();

    let added: Vec<String> = after.difference(&before).cloned().collect();
    if !added.is_empty() {
        changes.push(Change::NewEntities {
            count: added.len(),
            entities: added,
        });
    }

    let removed: Vec<String> = before.difference(&after).cloned().collect();
    if !removed.is_empty() {
        changes.push(Change::RemovedEntities {
            count: removed.len(),
            entities: removed,
        });
    }

    let (prev, curr) = (previous.finding_count(), current.finding_count());
    if curr > prev {
        changes.push(Change::NewFindings {
            previous_count: prev,
            current_count: curr,
            delta: curr - prev,
        });
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_result;

    fn result(entities: &[&str], findings: usize) -> InvestigationResult {
        sample_result("inv", entities, findings)
    }

    #[test]
    fn entity_set_and_finding_delta() {
        let changes = detect_changes(&result(&["a", "b"], 2), &result(&["b", "c"], 5));
        assert_eq!(
            changes,
            vec![
                Change::NewEntities {
                    count: 1,
                    entities: vec!["c".into()]
                },
                Change::RemovedEntities {
                    count: 1,
                    entities: vec!["a".into()]
                },
                Change::NewFindings {
                    previous_count: 2,
                    current_count: 5,
                    delta: 3
                },
            ]
        );
    }

    #[test]
    fn fewer_findings_is_not_a_change() {
        assert!(detect_changes(&result(&["a"], 4), &result(&["a"], 1)).is_empty());
        assert!(detect_changes(&result(&["a"], 4), &result(&["a"], 4)).is_empty());
    }

    #[test]
    fn serializes_with_type_tag() {
        let v = serde_json::to_value(Change::NewFindings {
            previous_count: 2,
            current_count: 5,
            delta: 3,
        })
        .unwrap();
        assert_eq!(v["type"], "new_findings");
        assert_eq!(v["delta"], 3);
    }
}
