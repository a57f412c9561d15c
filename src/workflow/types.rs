/// Core workflow type definitions
///
/// Defines the graph model (workflows, nodes, connections) and the data that
/// flows along edges (items grouped into output ports). Field names are
/// camelCase on the wire so definitions from the visual builder deserialize
/// as-is.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// A complete workflow definition containing nodes and their connections
///
/// Workflows are stored as JSON in SQLite and handed to the execution engine
/// as plain node/connection lists when a run is picked up by a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique workflow identifier (e.g., "wf-grading")
    pub id: String,
    /// Human-readable workflow name
    pub name: String,
    /// Nodes in declaration order
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    /// Directed edges between nodes, in declaration order
    #[serde(default)]
    pub connections: Vec<WorkflowConnection>,
}

impl Workflow {
    /// First node id that appears more than once, if any
    pub fn duplicate_node_id(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        self.nodes
            .iter()
            .map(|node| node.id.as_str())
            .find(|id| !seen.insert(*id))
    }
}

/// A single configured step instance in the workflow graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowNode {
    /// Unique node identifier within the workflow (e.g., "n1")
    pub id: String,
    /// Display label, never used for identity
    pub name: String,
    /// Key into the step registry
    #[serde(rename = "type")]
    pub step_type: String,
    /// Step-specific configuration
    #[serde(default)]
    pub parameters: Map<String, Value>,
    /// Convert this node's failure into a synthetic error item instead of aborting
    #[serde(default)]
    pub continue_on_fail: bool,
}

impl WorkflowNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>, step_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            step_type: step_type.into(),
            parameters: Map::new(),
            continue_on_fail: false,
        }
    }

    /// Builder-style parameter setter, mostly for tests and programmatic graphs
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn continue_on_fail(mut self, enabled: bool) -> Self {
        self.continue_on_fail = enabled;
        self
    }
}

/// Directed edge from one node's output port to another node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowConnection {
    /// Source node ID
    pub source: String,
    /// Target node ID
    pub target: String,
    /// Output port of the source feeding this edge
    #[serde(default)]
    pub source_output_index: usize,
    /// Reserved for multi-input ports, not used by routing
    #[serde(default)]
    pub target_input_index: usize,
}

impl WorkflowConnection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            source_output_index: 0,
            target_input_index: 0,
        }
    }

    pub fn from_port(mut self, index: usize) -> Self {
        self.source_output_index = index;
        self
    }
}

/// Opaque binary attachment carried next to an item's JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryData {
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Base64 payload, never inspected by the engine
    pub data: String,
}

/// The atomic unit of data flowing along an edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub json: Value,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub binary: HashMap<String, BinaryData>,
}

impl Item {
    pub fn new(json: Value) -> Self {
        Self {
            json,
            binary: HashMap::new(),
        }
    }

    /// Mutable access to the item's JSON as an object.
    ///
    /// Scalars and arrays are moved under a `value` key first.
    pub fn json_object_mut(&mut self) -> &mut Map<String, Value> {
        if !self.json.is_object() {
            let previous = self.json.take();
            self.json = if previous.is_null() {
                json!({})
            } else {
                json!({ "value": previous })
            };
        }
        match &mut self.json {
            Value::Object(map) => map,
            _ => unreachable!("item json was just coerced to an object"),
        }
    }
}

impl From<Value> for Item {
    fn from(json: Value) -> Self {
        Item::new(json)
    }
}

/// Output of one step invocation: an ordered set of ports, port 0 is primary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeOutput(pub Vec<Vec<Item>>);

impl NodeOutput {
    /// Single-port output
    pub fn single(items: Vec<Item>) -> Self {
        Self(vec![items])
    }

    /// Multi-port output, e.g. `[true_items, false_items]` for a branch
    pub fn ports(ports: Vec<Vec<Item>>) -> Self {
        Self(ports)
    }

    /// The synthetic output recorded when a failure is suppressed
    pub fn error_item(message: impl Into<String>) -> Self {
        Self::single(vec![Item::new(json!({ "error": message.into() }))])
    }

    pub fn port(&self, index: usize) -> Option<&[Item]> {
        self.0.get(index).map(Vec::as_slice)
    }

    pub fn port_count(&self) -> usize {
        self.0.len()
    }
}
