/// SQLite persistence layer for workflow definitions
///
/// Workflows are stored as one JSON document per row, with the id and name
/// broken out for listing. Run history is never written here.

use crate::workflow::types::Workflow;
use anyhow::{Context, Result};
use sqlx::{sqlite::SqlitePool, Row};

/// SQLite-based workflow storage manager
#[derive(Debug, Clone)]
pub struct WorkflowStorage {
    /// Pool shared with the credential store
    pool: SqlitePool,
}

/// Basic workflow metadata for listing operations
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowMetadata {
    pub id: String,
    pub name: String,
    pub node_count: usize,
    pub created_at: String,
    pub updated_at: String,
}

impl WorkflowStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the workflows table; safe to call on every startup
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workflows (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                definition TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_workflows_name ON workflows(name)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert a new workflow; returns false when the id is already taken
    pub async fn create_workflow(&self, workflow: &Workflow) -> Result<bool> {
        let definition = serde_json::to_string(workflow)?;

        let result = sqlx::query(
            r#"
            INSERT INTO workflows (id, name, definition)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&workflow.id)
        .bind(&workflow.name)
        .bind(&definition)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replace an existing workflow; returns false when it does not exist
    pub async fn update_workflow(&self, workflow: &Workflow) -> Result<bool> {
        let definition = serde_json::to_string(workflow)?;

        let result = sqlx::query(
            r#"
            UPDATE workflows
            SET name = ?, definition = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(&workflow.name)
        .bind(&definition)
        .bind(&workflow.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_workflow(&self, id: &str) -> Result<Option<Workflow>> {
        let row = sqlx::query("SELECT definition FROM workflows WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| decode_definition(&row.get::<String, _>("definition"), id))
            .transpose()
    }

    /// Newest first
    pub async fn list_workflows(&self) -> Result<Vec<WorkflowMetadata>> {
        let rows = sqlx::query(
            "SELECT id, name, definition, created_at, updated_at FROM workflows ORDER BY updated_at DESC, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id: String = row.get("id");
                let workflow = skip_undecodable(decode_definition(&row.get::<String, _>("definition"), &id), &id)?;
                Some(WorkflowMetadata {
                    id,
                    name: row.get("name"),
                    node_count: workflow.nodes.len(),
                    created_at: row.get("created_at"),
                    updated_at: row.get("updated_at"),
                })
            })
            .collect())
    }

    /// Every stored workflow, used to seed the in-memory registry at startup
    pub async fn load_all_workflows(&self) -> Result<Vec<Workflow>> {
        let rows = sqlx::query("SELECT id, definition FROM workflows")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id: String = row.get("id");
                skip_undecodable(decode_definition(&row.get::<String, _>("definition"), &id), &id)
            })
            .collect())
    }

    pub async fn delete_workflow(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM workflows WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn decode_definition(definition: &str, id: &str) -> Result<Workflow> {
    serde_json::from_str(definition).with_context(|| format!("Stored workflow '{id}' is not valid JSON"))
}

/// Bulk reads drop rows that no longer decode instead of failing the whole read
fn skip_undecodable(decoded: Result<Workflow>, id: &str) -> Option<Workflow> {
    match decoded {
        Ok(workflow) => Some(workflow),
        Err(e) => {
            tracing::warn!("⚠️ Skipping stored workflow '{}': {:#}", id, e);
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::workflow::types::{WorkflowConnection, WorkflowNode};
    use sqlx::sqlite::SqlitePoolOptions;

    pub(crate) async fn memory_storage() -> WorkflowStorage {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let storage = WorkflowStorage::new(pool);
        storage.init_schema().await.unwrap();
        storage
    }

    /// Write a definition column verbatim, bypassing serialization
    pub(crate) async fn insert_raw(storage: &WorkflowStorage, id: &str, definition: &str) {
        sqlx::query("INSERT INTO workflows (id, name, definition) VALUES (?, ?, ?)")
            .bind(id)
            .bind(id)
            .bind(definition)
            .execute(&storage.pool)
            .await
            .unwrap();
    }

    pub(crate) fn sample(id: &str) -> Workflow {
        Workflow {
            id: id.to_string(),
            name: format!("Workflow {id}"),
            nodes: vec![
                WorkflowNode::new("a", "Start", "set").with_parameter("propertyName", "seen"),
                WorkflowNode::new("b", "Finish", "merge"),
            ],
            connections: vec![WorkflowConnection::new("a", "b")],
        }
    }

    #[tokio::test]
    async fn create_get_roundtrip() {
        let storage = memory_storage().await;
        let workflow = sample("wf-1");

        assert!(storage.create_workflow(&workflow).await.unwrap());
        assert_eq!(storage.get_workflow("wf-1").await.unwrap(), Some(workflow));
        assert_eq!(storage.get_workflow("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn create_refuses_existing_id() {
        let storage = memory_storage().await;
        let workflow = sample("wf-1");

        assert!(storage.create_workflow(&workflow).await.unwrap());
        assert!(!storage.create_workflow(&workflow).await.unwrap());
    }

    #[tokio::test]
    async fn update_only_touches_existing_rows() {
        let storage = memory_storage().await;
        let mut workflow = sample("wf-1");
        assert!(!storage.update_workflow(&workflow).await.unwrap());

        storage.create_workflow(&workflow).await.unwrap();
        workflow.name = "Renamed".to_string();
        assert!(storage.update_workflow(&workflow).await.unwrap());

        let listed = storage.list_workflows().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Renamed");
        assert_eq!(listed[0].node_count, 2);
    }

    #[tokio::test]
    async fn delete_and_load_all() {
        let storage = memory_storage().await;
        storage.create_workflow(&sample("wf-1")).await.unwrap();
        storage.create_workflow(&sample("wf-2")).await.unwrap();

        assert!(storage.delete_workflow("wf-1").await.unwrap());
        assert!(!storage.delete_workflow("wf-1").await.unwrap());

        let remaining = storage.load_all_workflows().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "wf-2");
    }

    #[tokio::test]
    async fn undecodable_rows_are_skipped_by_bulk_reads() {
        let storage = memory_storage().await;
        storage.create_workflow(&sample("wf-1")).await.unwrap();
        insert_raw(&storage, "broken", "{not json").await;

        let loaded = storage.load_all_workflows().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "wf-1");

        let listed = storage.list_workflows().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "wf-1");

        // Single lookups still surface the decode error
        assert!(storage.get_workflow("broken").await.is_err());
    }
}
