// Shared fixtures for the integration tests: small deterministic steps, a
// registry holding them, and an in-memory credential provider.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use stepflow::credentials::{CredentialError, CredentialProvider, CredentialResult};
use stepflow::runtime::{ExecutionContext, Step, StepDescription, StepError};
use stepflow::workflow::{NodeOutput, WorkflowConnection, WorkflowNode};

/// Node ids in the order the recording steps saw them
pub type Trace = Arc<Mutex<Vec<String>>>;

/// Passes its input through, recording the node id
pub struct PrintStep {
    description: StepDescription,
    trace: Trace,
}

#[async_trait]
impl Step for PrintStep {
    fn description(&self) -> &StepDescription {
        &self.description
    }

    async fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<NodeOutput, StepError> {
        let prefix = ctx.parameter_str("prefix", 0, Some("LOG:"))?;
        ctx.log(format!("{prefix} {} item(s)", ctx.input_data().len()));
        self.trace.lock().unwrap().push(ctx.node().id.clone());
        Ok(NodeOutput::single(ctx.input_data().to_vec()))
    }
}

/// Sets the field named by `addField` to `true` on every item
pub struct TransformStep {
    description: StepDescription,
    trace: Trace,
}

#[async_trait]
impl Step for TransformStep {
    fn description(&self) -> &StepDescription {
        &self.description
    }

    async fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<NodeOutput, StepError> {
        self.trace.lock().unwrap().push(ctx.node().id.clone());
        let mut items = ctx.input_data().to_vec();
        for (index, item) in items.iter_mut().enumerate() {
            let field = ctx.parameter_str("addField", index, None)?;
            item.json_object_mut().insert(field, Value::Bool(true));
        }
        Ok(NodeOutput::single(items))
    }
}

/// Always fails with an ordinary step error
pub struct FailStep {
    description: StepDescription,
    trace: Trace,
}

#[async_trait]
impl Step for FailStep {
    fn description(&self) -> &StepDescription {
        &self.description
    }

    async fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<NodeOutput, StepError> {
        self.trace.lock().unwrap().push(ctx.node().id.clone());
        Err(anyhow::anyhow!("boom").into())
    }
}

/// Requires the `required` parameter, then passes through
pub struct StrictStep {
    description: StepDescription,
}

#[async_trait]
impl Step for StrictStep {
    fn description(&self) -> &StepDescription {
        &self.description
    }

    async fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<NodeOutput, StepError> {
        ctx.node_parameter("required", 0, None)?;
        Ok(NodeOutput::single(ctx.input_data().to_vec()))
    }
}

/// Emits the credential named by `credential` as its only item
pub struct SecretStep {
    description: StepDescription,
}

#[async_trait]
impl Step for SecretStep {
    fn description(&self) -> &StepDescription {
        &self.description
    }

    async fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<NodeOutput, StepError> {
        let name = ctx.parameter_str("credential", 0, None)?;
        let secret = ctx.get_credentials(&name).await?;
        Ok(NodeOutput::single(vec![secret.into()]))
    }
}

/// Registry with print, transform, fail, strict and secret steps sharing one trace
pub fn registry() -> (Arc<stepflow::StepRegistry>, Trace) {
    let trace: Trace = Arc::default();
    let mut registry = stepflow::StepRegistry::new();

    registry.register(
        "print",
        Arc::new(PrintStep {
            description: StepDescription::new("Print", "fa-print"),
            trace: Arc::clone(&trace),
        }),
    );
    registry.register(
        "transform",
        Arc::new(TransformStep {
            description: StepDescription::new("Transform", "fa-magic"),
            trace: Arc::clone(&trace),
        }),
    );
    registry.register(
        "fail",
        Arc::new(FailStep {
            description: StepDescription::new("Fail", "fa-bomb"),
            trace: Arc::clone(&trace),
        }),
    );
    registry.register(
        "strict",
        Arc::new(StrictStep {
            description: StepDescription::new("Strict", "fa-lock"),
        }),
    );
    registry.register(
        "secret",
        Arc::new(SecretStep {
            description: StepDescription::new("Secret", "fa-key"),
        }),
    );

    (Arc::new(registry), trace)
}

/// Credential provider backed by a map
#[derive(Default)]
pub struct MapProvider(pub HashMap<String, Value>);

#[async_trait]
impl CredentialProvider for MapProvider {
    async fn credentials(&self, name: &str) -> CredentialResult<Value> {
        self.0
            .get(name)
            .cloned()
            .ok_or_else(|| CredentialError::NotFound(name.to_string()))
    }
}

pub fn node(id: &str, step_type: &str) -> WorkflowNode {
    WorkflowNode::new(id, id.to_uppercase(), step_type)
}

pub fn edge(source: &str, target: &str) -> WorkflowConnection {
    WorkflowConnection::new(source, target)
}
