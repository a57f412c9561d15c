/// Set step: writes one named field onto every input item
///
/// Expected params: { "propertyName": "status", "propertyValue": "processed" }
///
/// With no input items (start position) a single fresh item is produced.

use async_trait::async_trait;
use serde_json::Value;

use crate::runtime::{ExecutionContext, Step, StepDescription, StepError, StepProperty};
use crate::workflow::types::{Item, NodeOutput};

pub struct SetStep {
    description: StepDescription,
}

impl SetStep {
    pub fn new() -> Self {
        Self {
            description: StepDescription::new("Set", "fa-pen")
                .property(
                    StepProperty::new("propertyName", "string")
                        .required()
                        .describe("The name of the parameter to set"),
                )
                .property(
                    StepProperty::new("propertyValue", "string")
                        .required()
                        .describe("The value to set"),
                ),
        }
    }
}

impl Default for SetStep {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Step for SetStep {
    fn description(&self) -> &StepDescription {
        &self.description
    }

    async fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<NodeOutput, StepError> {
        let items = ctx.input_data();
        let iterations = items.len().max(1);
        let mut output = Vec::with_capacity(iterations);

        for index in 0..iterations {
            let name = ctx.parameter_str("propertyName", index, Some(""))?;
            let value = ctx.parameter_str("propertyValue", index, Some(""))?;

            let mut item = items
                .get(index)
                .cloned()
                .unwrap_or_else(|| Item::new(Value::Object(Default::default())));

            if !name.is_empty() {
                item.json_object_mut().insert(name, Value::String(value));
            }
            output.push(item);
        }

        Ok(NodeOutput::single(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::testing::run_with_input;
    use crate::workflow::types::WorkflowNode;
    use serde_json::json;

    fn node(name: &str, value: &str) -> WorkflowNode {
        WorkflowNode::new("set", "Set", "set")
            .with_parameter("propertyName", name)
            .with_parameter("propertyValue", value)
    }

    #[tokio::test]
    async fn sets_field_on_every_item() {
        let output = run_with_input(&SetStep::new(), &node("status", "done"), vec![json!({ "id": 1 }), json!({ "id": 2 })])
            .await
            .unwrap();

        let values: Vec<Value> = output.port(0).unwrap().iter().map(|item| item.json.clone()).collect();
        assert_eq!(
            values,
            vec![json!({ "id": 1, "status": "done" }), json!({ "id": 2, "status": "done" })]
        );
    }

    #[tokio::test]
    async fn empty_input_produces_one_item() {
        let output = run_with_input(&SetStep::new(), &node("greeting", "hello"), vec![]).await.unwrap();
        assert_eq!(output.port(0).unwrap(), &[Item::new(json!({ "greeting": "hello" }))]);
    }

    #[tokio::test]
    async fn blank_name_passes_items_through() {
        let output = run_with_input(&SetStep::new(), &node("", "ignored"), vec![json!({ "id": 1 })])
            .await
            .unwrap();
        assert_eq!(output.port(0).unwrap(), &[Item::new(json!({ "id": 1 }))]);
    }
}
