/// Workflow Management Layer
///
/// Workflow definitions, their persistence, and the hot-reload registry:
/// - Type definitions (Workflow, WorkflowNode, WorkflowConnection, Item)
/// - SQLite persistence with sqlx
/// - Lock-free hot-reload registry using ArcSwap

// Graph model and item types
pub mod types;

// SQLite persistence layer for workflow definitions
pub mod storage;

// Hot-reload registry using ArcSwap for zero-downtime updates
pub mod registry;

// Re-export commonly used types
pub use registry::{validate_workflow, WorkflowRegistry};
pub use storage::{WorkflowMetadata, WorkflowStorage};
pub use types::{BinaryData, Item, NodeOutput, Workflow, WorkflowConnection, WorkflowNode};
