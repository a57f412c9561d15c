/// Execution context handed to a step for one node invocation
///
/// Built fresh for every invocation from the current ledger snapshot and
/// never reused across nodes: the input items are a function of which
/// parents have recorded output at the moment the node is dequeued.

use serde_json::Value;

use crate::credentials::{CredentialError, CredentialProvider};
use crate::runtime::error::StepError;
use crate::runtime::ledger::RunLedger;
use crate::workflow::types::{Item, WorkflowConnection, WorkflowNode};

/// Read-only view of everything a step may use while it runs
pub struct ExecutionContext<'a> {
    node: &'a WorkflowNode,
    input: Vec<Item>,
    credentials: Option<&'a dyn CredentialProvider>,
}

impl<'a> ExecutionContext<'a> {
    /// Assemble the context for `node`
    ///
    /// `incoming` are the node's incoming edges in declaration order, including
    /// edges whose source is not a known node. A node without incoming edges
    /// receives the trigger payload as its only item; otherwise each edge
    /// contributes the parent's port `source_output_index`, concatenated in
    /// edge order. Parents without a ledger entry contribute nothing.
    pub fn build(
        node: &'a WorkflowNode,
        incoming: &[&WorkflowConnection],
        trigger: &Value,
        ledger: &RunLedger,
        credentials: Option<&'a dyn CredentialProvider>,
    ) -> Self {
        let input = if incoming.is_empty() {
            vec![Item::new(trigger.clone())]
        } else {
            incoming
                .iter()
                .filter_map(|edge| {
                    ledger
                        .get(&edge.source)
                        .and_then(|entry| entry.output.port(edge.source_output_index))
                })
                .flat_map(|items| items.iter().cloned())
                .collect()
        };

        tracing::debug!(
            "📥 Built context for '{}' with {} input item(s) from {} edge(s)",
            node.id,
            input.len(),
            incoming.len()
        );

        Self {
            node,
            input,
            credentials,
        }
    }

    pub fn node(&self) -> &WorkflowNode {
        self.node
    }

    /// Upstream items, flattened across incoming edges
    pub fn input_data(&self) -> &[Item] {
        &self.input
    }

    /// Whether the node wants its own failures turned into error items
    pub fn continue_on_fail(&self) -> bool {
        self.node.continue_on_fail
    }

    /// Decrypted credential payload stored under `name`
    pub async fn get_credentials(&self, name: &str) -> Result<Value, StepError> {
        let provider = self.credentials.ok_or(CredentialError::NotConfigured)?;
        Ok(provider.credentials(name).await?)
    }

    /// Log sink tagged with the node's display name
    pub fn log(&self, message: impl std::fmt::Display) {
        tracing::info!(node = %self.node.name, node_id = %self.node.id, "{}", message);
    }

    /// Parameter `name` for the item at `item_index`
    ///
    /// Null counts as absent. Falls back to `fallback`, and without one the
    /// lookup is a configuration error. `item_index` is reserved for per-item
    /// expressions; every item currently sees the same value.
    pub fn node_parameter(
        &self,
        name: &str,
        _item_index: usize,
        fallback: Option<Value>,
    ) -> Result<Value, StepError> {
        match self.node.parameters.get(name) {
            Some(value) if !value.is_null() => Ok(value.clone()),
            _ => fallback.ok_or_else(|| StepError::missing(name)),
        }
    }

    /// String parameter; numbers and booleans are rendered as text
    pub fn parameter_str(
        &self,
        name: &str,
        item_index: usize,
        fallback: Option<&str>,
    ) -> Result<String, StepError> {
        match self.node_parameter(name, item_index, fallback.map(Value::from))? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(StepError::invalid(name, format!("expected a string, got {other}"))),
        }
    }

    /// Unsigned integer parameter; numeric strings are accepted
    pub fn parameter_u64(
        &self,
        name: &str,
        item_index: usize,
        fallback: Option<u64>,
    ) -> Result<u64, StepError> {
        let value = self.node_parameter(name, item_index, fallback.map(Value::from))?;
        value
            .as_u64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
            .ok_or_else(|| StepError::invalid(name, format!("expected a non-negative integer, got {value}")))
    }
}
