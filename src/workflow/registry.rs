/// Hot-reload workflow registry using ArcSwap
///
/// Lock-free, atomic updates to the in-memory set of active workflows. Each
/// change swaps the whole map pointer, so workers resolving a workflow never
/// block on an API write and in-flight runs keep the definition they started
/// with.

use crate::workflow::{storage::WorkflowStorage, types::Workflow};
use anyhow::Result;
use arc_swap::ArcSwap;
use std::{collections::HashMap, sync::Arc};

/// Lock-free workflow registry
#[derive(Debug)]
pub struct WorkflowRegistry {
    /// workflow_id -> validated definition
    workflows: ArcSwap<HashMap<String, Arc<Workflow>>>,

    /// Source of truth for reloads
    storage: WorkflowStorage,
}

/// Structural checks a definition must pass before it is stored or loaded
pub fn validate_workflow(workflow: &Workflow) -> Result<()> {
    if workflow.id.trim().is_empty() {
        anyhow::bail!("Workflow id must not be empty");
    }
    if workflow.name.trim().is_empty() {
        anyhow::bail!("Workflow name must not be empty");
    }
    if let Some(id) = workflow.duplicate_node_id() {
        anyhow::bail!("Duplicate node id '{}' in workflow '{}'", id, workflow.id);
    }
    Ok(())
}

impl WorkflowRegistry {
    pub fn new(storage: WorkflowStorage) -> Self {
        Self {
            workflows: ArcSwap::new(Arc::new(HashMap::new())),
            storage,
        }
    }

    /// Populate the registry from storage at startup
    ///
    /// Definitions that fail validation are skipped with a warning rather than
    /// keeping the server down.
    pub async fn init_from_storage(&self) -> Result<()> {
        let mut loaded = HashMap::new();
        for workflow in self.storage.load_all_workflows().await? {
            match validate_workflow(&workflow) {
                Ok(()) => {
                    loaded.insert(workflow.id.clone(), Arc::new(workflow));
                }
                Err(e) => tracing::warn!("⚠️ Skipping stored workflow '{}': {}", workflow.id, e),
            }
        }

        let count = loaded.len();
        self.workflows.store(Arc::new(loaded));
        tracing::info!("📚 Initialized workflow registry with {} workflows", count);

        Ok(())
    }

    /// Re-read one workflow from storage and swap it in
    pub async fn reload_workflow(&self, workflow_id: &str) -> Result<()> {
        let workflow = self
            .storage
            .get_workflow(workflow_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Workflow not found: {}", workflow_id))?;
        validate_workflow(&workflow)?;

        let workflow = Arc::new(workflow);
        self.workflows.rcu(|current| {
            let mut next = (**current).clone();
            next.insert(workflow_id.to_string(), Arc::clone(&workflow));
            next
        });

        tracing::info!("🔥 Hot-reloaded workflow: {}", workflow_id);
        Ok(())
    }

    /// Lock-free lookup; the returned definition stays valid after later swaps
    pub fn get_workflow(&self, workflow_id: &str) -> Option<Arc<Workflow>> {
        self.workflows.load().get(workflow_id).cloned()
    }

    pub fn contains(&self, workflow_id: &str) -> bool {
        self.workflows.load().contains_key(workflow_id)
    }

    pub fn list_workflow_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.workflows.load().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn remove_workflow(&self, workflow_id: &str) {
        if !self.contains(workflow_id) {
            return;
        }

        self.workflows.rcu(|current| {
            let mut next = (**current).clone();
            next.remove(workflow_id);
            next
        });
        tracing::info!("🗑️ Removed workflow from registry: {}", workflow_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::storage::tests::{insert_raw, memory_storage, sample};
    use crate::workflow::types::WorkflowNode;

    #[tokio::test]
    async fn reload_picks_up_storage_changes() {
        let storage = memory_storage().await;
        let registry = WorkflowRegistry::new(storage.clone());
        assert!(registry.get_workflow("wf-1").is_none());

        let mut workflow = sample("wf-1");
        storage.create_workflow(&workflow).await.unwrap();
        registry.reload_workflow("wf-1").await.unwrap();
        let before = registry.get_workflow("wf-1").unwrap();

        workflow.name = "Second revision".to_string();
        storage.update_workflow(&workflow).await.unwrap();
        registry.reload_workflow("wf-1").await.unwrap();

        assert_eq!(registry.get_workflow("wf-1").unwrap().name, "Second revision");
        // Holders of the old snapshot are unaffected
        assert_eq!(before.name, "Workflow wf-1");
    }

    #[tokio::test]
    async fn init_skips_invalid_definitions() {
        let storage = memory_storage().await;
        storage.create_workflow(&sample("good")).await.unwrap();

        let mut broken = sample("broken");
        broken.nodes.push(WorkflowNode::new("a", "Duplicate", "set"));
        storage.create_workflow(&broken).await.unwrap();

        let registry = WorkflowRegistry::new(storage);
        registry.init_from_storage().await.unwrap();

        assert_eq!(registry.list_workflow_ids(), vec!["good".to_string()]);
    }

    #[tokio::test]
    async fn init_survives_undecodable_rows() {
        let storage = memory_storage().await;
        storage.create_workflow(&sample("good")).await.unwrap();
        insert_raw(&storage, "corrupt", "{\"id\": ").await;

        let registry = WorkflowRegistry::new(storage);
        registry.init_from_storage().await.unwrap();

        assert_eq!(registry.list_workflow_ids(), vec!["good".to_string()]);
    }

    #[tokio::test]
    async fn remove_and_missing_reload() {
        let storage = memory_storage().await;
        storage.create_workflow(&sample("wf-1")).await.unwrap();
        let registry = WorkflowRegistry::new(storage);
        registry.init_from_storage().await.unwrap();

        registry.remove_workflow("wf-1");
        assert!(!registry.contains("wf-1"));
        assert!(registry.reload_workflow("nope").await.is_err());
    }

    #[test]
    fn validation_rules() {
        assert!(validate_workflow(&sample("ok")).is_ok());

        let mut unnamed = sample("x");
        unnamed.name = " ".to_string();
        assert!(validate_workflow(&unnamed).is_err());

        let mut duplicated = sample("x");
        duplicated.nodes.push(WorkflowNode::new("b", "B again", "merge"));
        let err = validate_workflow(&duplicated).unwrap_err();
        assert!(err.to_string().contains("'b'"));
    }
}
