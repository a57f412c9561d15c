/// stepflow: graph workflow execution engine
///
/// Runs user-assembled graphs of typed steps against a trigger payload,
/// propagating per-node items downstream and recording per-node outcomes.
/// Around the engine sit the built-in step catalog, encrypted credentials,
/// hot-reloadable workflow storage, a job queue with workers, and an HTTP API.

// Core configuration and setup
pub mod config;

// Credential vault and encrypted credential storage
pub mod credentials;

// Workflow management layer - definitions, storage, and hot-reload registry
pub mod workflow;

// Runtime execution engine - step contract, context, ledger, graph traversal
pub mod runtime;

// Built-in step types
pub mod steps;

// Job queue and worker pool
pub mod jobs;

// HTTP API layer - run intake, workflow CRUD, step catalog, credentials
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use runtime::{EngineError, ExecutionContext, ExecutionEngine, RunLedger, Step, StepError, StepRegistry, StepStatus};
pub use server::start_server;
pub use workflow::{Item, NodeOutput, Workflow, WorkflowConnection, WorkflowNode};
