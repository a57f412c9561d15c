/// Error types for workflow runs

use std::time::Duration;

use thiserror::Error;

use crate::credentials::CredentialError;

/// Failure of a single step invocation
///
/// Whether it aborts the run depends on the node's `continueOnFail` flag,
/// except for configuration errors which are always fatal.
#[derive(Debug, Error)]
pub enum StepError {
    /// A required parameter is absent and no fallback was supplied
    #[error("missing required parameter '{name}'")]
    MissingParameter { name: String },

    /// A parameter is present but unusable
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Credential lookup or decryption failed
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),

    /// The step exceeded its own execution budget
    #[error("execution timed out after {0:?}")]
    Timeout(Duration),

    /// The step's own logic failed
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl StepError {
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Configuration errors abort the run even when the node is fail-open
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingParameter { .. })
    }
}

/// Run-fatal error propagated out of `ExecutionEngine::run`
#[derive(Debug, Error)]
pub enum EngineError {
    /// Two nodes share an id
    #[error("duplicate node id '{0}' in workflow definition")]
    DuplicateNodeId(String),

    /// A node references a step type missing from the registry
    #[error("node '{node_id}' uses unknown step type '{step_type}'")]
    UnknownStepType { node_id: String, step_type: String },

    /// A node is misconfigured (e.g. missing required parameter)
    #[error("node '{node_name}' ({node_id}) is misconfigured: {source}")]
    Configuration {
        node_id: String,
        node_name: String,
        #[source]
        source: StepError,
    },

    /// A node failed and was not allowed to continue
    #[error("node '{node_name}' ({node_id}) failed: {source}")]
    StepFailed {
        node_id: String,
        node_name: String,
        #[source]
        source: StepError,
    },
}

impl EngineError {
    /// Id of the offending node
    pub fn node_id(&self) -> &str {
        match self {
            Self::DuplicateNodeId(id) => id,
            Self::UnknownStepType { node_id, .. }
            | Self::Configuration { node_id, .. }
            | Self::StepFailed { node_id, .. } => node_id,
        }
    }
}
