/// Per-run ledger of node outcomes
///
/// The engine's single source of truth for readiness decisions. Created fresh
/// for each run and owned by the caller, so partial results stay available
/// after a failed run.

use std::collections::HashMap;

use serde::Serialize;

use crate::workflow::types::NodeOutput;

/// Terminal status of a node that finished executing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    /// The step produced its output
    Success,
    /// The step failed, `continueOnFail` replaced its output with an error item
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub status: StepStatus,
    pub output: NodeOutput,
}

/// Map from node id to its last recorded outcome for one run
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunLedger {
    entries: HashMap<String, LedgerEntry>,
    /// Node ids in the order they were recorded
    order: Vec<String>,
}

impl RunLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records (or overwrites) the outcome of `node_id`
    pub fn record(&mut self, node_id: impl Into<String>, output: NodeOutput, status: StepStatus) {
        let node_id = node_id.into();
        let entry = LedgerEntry { status, output };
        if self.entries.insert(node_id.clone(), entry).is_none() {
            self.order.push(node_id);
        }
    }

    pub fn get(&self, node_id: &str) -> Option<&LedgerEntry> {
        self.entries.get(node_id)
    }

    /// Whether the node has a terminal entry that satisfies downstream readiness
    pub fn is_resolved(&self, node_id: &str) -> bool {
        matches!(
            self.entries.get(node_id).map(|entry| entry.status),
            Some(StepStatus::Success | StepStatus::Warning)
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Node ids in recording order
    pub fn execution_order(&self) -> &[String] {
        &self.order
    }

    /// Entries in recording order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LedgerEntry)> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).map(|entry| (id.as_str(), entry)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::Item;
    use serde_json::json;

    #[test]
    fn record_and_get() {
        let mut ledger = RunLedger::new();
        assert!(ledger.get("a").is_none());
        assert!(!ledger.is_resolved("a"));

        ledger.record("a", NodeOutput::single(vec![Item::new(json!({ "x": 1 }))]), StepStatus::Success);

        let entry = ledger.get("a").unwrap();
        assert_eq!(entry.status, StepStatus::Success);
        assert_eq!(entry.output.port(0).unwrap()[0].json, json!({ "x": 1 }));
        assert!(ledger.is_resolved("a"));
    }

    #[test]
    fn warning_counts_as_resolved() {
        let mut ledger = RunLedger::new();
        ledger.record("a", NodeOutput::error_item("boom"), StepStatus::Warning);
        assert!(ledger.is_resolved("a"));
    }

    #[test]
    fn overwrite_keeps_first_position() {
        let mut ledger = RunLedger::new();
        ledger.record("a", NodeOutput::default(), StepStatus::Success);
        ledger.record("b", NodeOutput::default(), StepStatus::Success);
        ledger.record("a", NodeOutput::error_item("late"), StepStatus::Warning);

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.execution_order(), ["a".to_string(), "b".to_string()]);
        assert_eq!(ledger.get("a").unwrap().status, StepStatus::Warning);

        let ids: Vec<&str> = ledger.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn snapshot_serializes_statuses() {
        let mut ledger = RunLedger::new();
        ledger.record("a", NodeOutput::error_item("boom"), StepStatus::Warning);

        let snapshot = serde_json::to_value(&ledger).unwrap();
        assert_eq!(snapshot["entries"]["a"]["status"], json!("WARNING"));
        assert_eq!(snapshot["entries"]["a"]["output"][0][0]["json"]["error"], json!("boom"));
    }
}
