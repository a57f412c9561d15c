/// Step capability contract and the registry that resolves node types
///
/// A step is the pluggable behavior behind a node type. The engine only knows
/// this contract; concrete steps live in the catalog and are registered once
/// at process start.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::runtime::context::ExecutionContext;
use crate::runtime::error::StepError;
use crate::workflow::types::NodeOutput;

/// Single capability every node type provides
#[async_trait]
pub trait Step: Send + Sync {
    /// Palette metadata for the visual builder
    fn description(&self) -> &StepDescription;

    /// Produce the node's output ports from its context
    async fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<NodeOutput, StepError>;
}

/// What the visual builder needs to render a step in the palette and properties form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepDescription {
    pub name: String,
    pub icon: String,
    pub properties: Vec<StepProperty>,
}

impl StepDescription {
    pub fn new(name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
            properties: Vec::new(),
        }
    }

    pub fn property(mut self, property: StepProperty) -> Self {
        self.properties.push(property);
        self
    }
}

/// One declared parameter in a step's properties form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl StepProperty {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            description: None,
            required: false,
            options: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }
}

/// Mapping from step-type key to step implementation
///
/// Built once before any engine exists and shared read-only across runs.
#[derive(Default, Clone)]
pub struct StepRegistry {
    steps: HashMap<String, Arc<dyn Step>>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `step` under `key`, replacing any previous registration
    pub fn register(&mut self, key: impl Into<String>, step: Arc<dyn Step>) {
        let key = key.into();
        tracing::debug!("🧩 Registered step type '{}'", key);
        self.steps.insert(key, step);
    }

    /// Exact-match lookup
    pub fn get(&self, key: &str) -> Option<Arc<dyn Step>> {
        self.steps.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.steps.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// `(key, description)` pairs sorted by key
    pub fn descriptions(&self) -> Vec<(String, StepDescription)> {
        let mut described: Vec<_> = self
            .steps
            .iter()
            .map(|(key, step)| (key.clone(), step.description().clone()))
            .collect();
        described.sort_by(|a, b| a.0.cmp(&b.0));
        described
    }
}

impl std::fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&String> = self.steps.keys().collect();
        keys.sort();
        f.debug_struct("StepRegistry").field("steps", &keys).finish()
    }
}
