/// Merge step: pass-through anchor where several visual lines join
///
/// The engine already concatenates every parent's port into the input, so the
/// step only forwards it once all parents have finished.

use async_trait::async_trait;

use crate::runtime::{ExecutionContext, Step, StepDescription, StepError};
use crate::workflow::types::NodeOutput;

pub struct MergeStep {
    description: StepDescription,
}

impl MergeStep {
    pub fn new() -> Self {
        Self {
            description: StepDescription::new("Merge", "fa-compress-arrows-alt"),
        }
    }
}

impl Default for MergeStep {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Step for MergeStep {
    fn description(&self) -> &StepDescription {
        &self.description
    }

    async fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<NodeOutput, StepError> {
        Ok(NodeOutput::single(ctx.input_data().to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::testing::run_with_input;
    use crate::workflow::types::{Item, WorkflowNode};
    use serde_json::json;

    #[tokio::test]
    async fn forwards_input_unchanged() {
        let node = WorkflowNode::new("merge", "Merge", "merge");
        let output = run_with_input(&MergeStep::new(), &node, vec![json!({ "a": 1 }), json!({ "b": 2 })])
            .await
            .unwrap();

        assert_eq!(
            output,
            NodeOutput::single(vec![Item::new(json!({ "a": 1 })), Item::new(json!({ "b": 2 }))])
        );
    }
}
