/// Worklist-driven workflow execution engine
///
/// Indexes the workflow as a petgraph DAG and walks it breadth-first from the
/// nodes without incoming edges. A node is enqueued only once every parent
/// has a ledger entry, and readiness is re-evaluated each time a parent
/// finishes, so diamonds and branches converge without a precomputed order.

use crate::credentials::CredentialProvider;
use crate::runtime::context::ExecutionContext;
use crate::runtime::error::EngineError;
use crate::runtime::ledger::{RunLedger, StepStatus};
use crate::runtime::step::StepRegistry;
use crate::workflow::types::{NodeOutput, Workflow, WorkflowConnection, WorkflowNode};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::Instrument;

/// Executes one workflow graph against trigger payloads
///
/// One engine serves one run at a time; concurrent runs each build their own
/// engine and ledger while sharing the step registry and credential provider.
pub struct ExecutionEngine {
    graph: WorkflowGraph,
    registry: Arc<StepRegistry>,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

/// Internal representation of a workflow as a petgraph DAG
#[derive(Debug)]
struct WorkflowGraph {
    /// Node weights are the declared nodes, edge weights the connections
    graph: DiGraph<WorkflowNode, WorkflowConnection>,
    /// Targets of edges whose source is not a declared node; never ready
    blocked: HashSet<NodeIndex>,
}

impl ExecutionEngine {
    /// Build an engine from node and connection lists
    ///
    /// Fails on duplicate node ids. Edges pointing at unknown targets are
    /// ignored; edges coming from unknown sources keep their target from ever
    /// becoming ready.
    pub fn new(
        nodes: Vec<WorkflowNode>,
        connections: Vec<WorkflowConnection>,
        registry: Arc<StepRegistry>,
    ) -> Result<Self, EngineError> {
        let graph = WorkflowGraph::build(nodes, connections)?;
        Ok(Self {
            graph,
            registry,
            credentials: None,
        })
    }

    /// Build an engine from a stored workflow definition
    pub fn from_workflow(workflow: &Workflow, registry: Arc<StepRegistry>) -> Result<Self, EngineError> {
        Self::new(workflow.nodes.clone(), workflow.connections.clone(), registry)
    }

    /// Credential source exposed to steps through their context
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn node_count(&self) -> usize {
        self.graph.graph.node_count()
    }

    /// Run the graph to completion
    ///
    /// Returns once the worklist drains, or with the first run-fatal error.
    /// Outcomes are recorded in `ledger` as nodes finish, so the caller keeps
    /// partial results on both paths.
    pub async fn run(&self, trigger: &Value, ledger: &mut RunLedger) -> Result<(), EngineError> {
        let run_start_time = std::time::Instant::now();

        let mut queue: VecDeque<NodeIndex> = self.graph.start_nodes().collect();
        let mut processed: HashSet<NodeIndex> = HashSet::new();

        tracing::info!(
            "🚀 Starting run over {} nodes with {} start node(s)",
            self.node_count(),
            queue.len()
        );

        while let Some(index) = queue.pop_front() {
            // Diamond joins are enqueued once per finishing parent
            if processed.contains(&index) {
                continue;
            }

            let node = &self.graph.graph[index];
            let step = self.registry.get(&node.step_type).ok_or_else(|| {
                tracing::error!("❌ Node '{}' uses unknown step type '{}'", node.id, node.step_type);
                EngineError::UnknownStepType {
                    node_id: node.id.clone(),
                    step_type: node.step_type.clone(),
                }
            })?;

            let incoming = self.graph.incoming(index);
            let context = ExecutionContext::build(node, &incoming, trigger, ledger, self.credentials.as_deref());

            tracing::info!("📍 Executing node '{}' (type: {})", node.id, node.step_type);
            let node_start_time = std::time::Instant::now();
            let span = tracing::info_span!("node", id = %node.id, name = %node.name, step_type = %node.step_type);

            match step.execute(&context).instrument(span).await {
                Ok(output) => {
                    tracing::info!("✅ Node '{}' completed in {:?}", node.id, node_start_time.elapsed());
                    ledger.record(node.id.clone(), output, StepStatus::Success);
                }
                Err(err) if err.is_configuration() => {
                    tracing::error!("❌ Node '{}' is misconfigured: {}", node.id, err);
                    return Err(EngineError::Configuration {
                        node_id: node.id.clone(),
                        node_name: node.name.clone(),
                        source: err,
                    });
                }
                Err(err) if node.continue_on_fail => {
                    tracing::warn!("⚠️ Node '{}' failed, continuing with error output: {}", node.id, err);
                    ledger.record(node.id.clone(), NodeOutput::error_item(err.to_string()), StepStatus::Warning);
                }
                Err(err) => {
                    tracing::error!("❌ Node '{}' failed after {:?}: {}", node.id, node_start_time.elapsed(), err);
                    return Err(EngineError::StepFailed {
                        node_id: node.id.clone(),
                        node_name: node.name.clone(),
                        source: err,
                    });
                }
            }

            processed.insert(index);

            let ready = self.graph.ready_children(index, ledger);
            tracing::debug!("🔗 Node '{}' released {} ready child(ren)", node.id, ready.len());
            queue.extend(ready);
        }

        tracing::info!(
            "🎉 Run drained: {} node(s) executed in {:?}",
            processed.len(),
            run_start_time.elapsed()
        );

        Ok(())
    }
}

impl std::fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("graph", &self.graph)
            .field("registry", &self.registry)
            .field("credentials", &self.credentials.is_some())
            .finish()
    }
}

impl WorkflowGraph {
    /// Build a petgraph DiGraph from node and connection lists
    fn build(nodes: Vec<WorkflowNode>, connections: Vec<WorkflowConnection>) -> Result<Self, EngineError> {
        tracing::debug!("🏗️ Building workflow graph with {} nodes and {} connections", nodes.len(), connections.len());

        let mut graph = DiGraph::new();
        let mut node_id_to_index: HashMap<String, NodeIndex> = HashMap::new();
        let mut blocked = HashSet::new();

        for node in nodes {
            if node_id_to_index.contains_key(&node.id) {
                tracing::error!("❌ Duplicate node id '{}'", node.id);
                return Err(EngineError::DuplicateNodeId(node.id));
            }
            let id = node.id.clone();
            let index = graph.add_node(node);
            node_id_to_index.insert(id, index);
        }

        for edge in connections {
            let Some(&to_index) = node_id_to_index.get(&edge.target) else {
                tracing::debug!("⏭️ Ignoring connection '{}' → '{}': unknown target", edge.source, edge.target);
                continue;
            };
            match node_id_to_index.get(&edge.source) {
                Some(&from_index) => {
                    graph.add_edge(from_index, to_index, edge);
                }
                None => {
                    tracing::warn!(
                        "⚠️ Connection from unknown node '{}' blocks '{}' from ever running",
                        edge.source,
                        edge.target
                    );
                    blocked.insert(to_index);
                }
            }
        }

        if is_cyclic_directed(&graph) {
            tracing::warn!("⚠️ Workflow graph contains a cycle; nodes on it will never become ready");
        }

        Ok(Self { graph, blocked })
    }

    /// Nodes without incoming connections, in declaration order
    fn start_nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices().filter(move |&index| {
            !self.blocked.contains(&index)
                && self
                    .graph
                    .edges_directed(index, Direction::Incoming)
                    .next()
                    .is_none()
        })
    }

    /// Incoming connections of `index` in declaration order
    fn incoming(&self, index: NodeIndex) -> Vec<&WorkflowConnection> {
        let mut edges: Vec<_> = self.graph.edges_directed(index, Direction::Incoming).collect();
        // petgraph yields adjacency lists newest-first
        edges.sort_by_key(|edge| edge.id());
        edges.into_iter().map(|edge| edge.weight()).collect()
    }

    /// Every parent of `index` has a Success or Warning entry
    fn is_ready(&self, index: NodeIndex, ledger: &RunLedger) -> bool {
        !self.blocked.contains(&index)
            && self
                .graph
                .edges_directed(index, Direction::Incoming)
                .all(|edge| ledger.is_resolved(&self.graph[edge.source()].id))
    }

    /// Children of `index` whose dependencies are all resolved, in edge order
    fn ready_children(&self, index: NodeIndex, ledger: &RunLedger) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self.graph.edges_directed(index, Direction::Outgoing).collect();
        edges.sort_by_key(|edge| edge.id());
        edges
            .into_iter()
            .map(|edge| edge.target())
            .filter(|&child| self.is_ready(child, ledger))
            .collect()
    }
}
