/// Runtime Execution Engine
///
/// Everything needed to execute one workflow run:
/// - the step capability contract and registry
/// - the per-run ledger of node outcomes
/// - the per-invocation execution context
/// - the worklist-driven engine tying them together

// Worklist-driven graph traversal
pub mod engine;

// Per-node view handed to steps
pub mod context;

// Per-run outcome ledger
pub mod ledger;

// Step contract and registry
pub mod step;

// Run and step errors
pub mod error;

pub use context::ExecutionContext;
pub use engine::ExecutionEngine;
pub use error::{EngineError, StepError};
pub use ledger::{LedgerEntry, RunLedger, StepStatus};
pub use step::{Step, StepDescription, StepProperty, StepRegistry};
