/// Built-in Step Catalog
///
/// The step types a fresh server knows about. Each one implements the
/// `Step` contract and is registered under the type key workflow nodes use.

// Outbound HTTP calls with optional stored credentials
pub mod http_request;

// Sandboxed Lua transforms
pub mod code;

// Conditional routing onto true/false ports
pub mod branch;

// Join point for several upstream branches
pub mod merge;

// Single-field assignment
pub mod set;

use std::sync::Arc;
use std::time::Duration;

use crate::config::RuntimeConfig;
use crate::runtime::StepRegistry;

pub use branch::IfStep;
pub use code::CodeStep;
pub use http_request::HttpRequestStep;
pub use merge::MergeStep;
pub use set::SetStep;

/// Registry holding every built-in step under its workflow type key
pub fn catalog(config: &RuntimeConfig) -> anyhow::Result<StepRegistry> {
    let mut registry = StepRegistry::new();

    registry.register(
        "httpRequest",
        Arc::new(HttpRequestStep::new(Duration::from_millis(config.http_timeout_ms))?),
    );
    registry.register(
        "code",
        Arc::new(CodeStep::new(Duration::from_millis(config.script_timeout_ms))),
    );
    registry.register("if", Arc::new(IfStep::new()));
    registry.register("merge", Arc::new(MergeStep::new()));
    registry.register("set", Arc::new(SetStep::new()));

    tracing::info!("🧩 Registered {} built-in step types", registry.len());
    Ok(registry)
}

#[cfg(test)]
pub(crate) mod testing {
    use serde_json::Value;

    use crate::runtime::{ExecutionContext, RunLedger, Step, StepError, StepStatus};
    use crate::workflow::types::{Item, NodeOutput, WorkflowConnection, WorkflowNode};

    /// Run `step` as `node` fed by a single upstream node emitting `input`
    pub async fn run_with_input(
        step: &dyn Step,
        node: &WorkflowNode,
        input: Vec<Value>,
    ) -> Result<NodeOutput, StepError> {
        let mut ledger = RunLedger::new();
        ledger.record(
            "upstream",
            NodeOutput::single(input.into_iter().map(Item::new).collect()),
            StepStatus::Success,
        );

        let edge = WorkflowConnection::new("upstream", node.id.clone());
        let ctx = ExecutionContext::build(node, &[&edge], &Value::Null, &ledger, None);
        step.execute(&ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_registers_builtins() {
        let registry = catalog(&RuntimeConfig::default()).unwrap();

        for key in ["httpRequest", "code", "if", "merge", "set"] {
            assert!(registry.contains(key), "missing {key}");
        }
        assert_eq!(registry.len(), 5);

        let described: Vec<_> = registry.descriptions().into_iter().map(|(key, _)| key).collect();
        assert_eq!(described, vec!["code", "httpRequest", "if", "merge", "set"]);
    }
}
