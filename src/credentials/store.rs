/// SQLite-backed credential store
///
/// Only vault tokens are persisted; plaintext secrets exist in memory for the
/// duration of a single step's credential lookup.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{sqlite::SqlitePool, Row};

use super::error::{CredentialError, CredentialResult};
use super::vault::CredentialVault;

/// Resolves a credential name to its decrypted payload
///
/// Handed to the execution engine, which exposes it to steps through the
/// execution context. Implementations must never return an empty or default
/// secret in place of a failed lookup.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn credentials(&self, name: &str) -> CredentialResult<Value>;
}

/// Named credential tokens stored in SQLite and opened with the vault
#[derive(Debug, Clone)]
pub struct CredentialStore {
    pool: SqlitePool,
    vault: Arc<CredentialVault>,
}

impl CredentialStore {
    pub fn new(pool: SqlitePool, vault: Arc<CredentialVault>) -> Self {
        Self { pool, vault }
    }

    /// Creates the credentials table. Safe to call multiple times.
    pub async fn init_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS credentials (
                name TEXT PRIMARY KEY,
                token TEXT NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Encrypts `payload` and stores the token under `name`, replacing any previous value
    pub async fn save(&self, name: &str, payload: &Value) -> CredentialResult<()> {
        let token = self.vault.encrypt(payload)?;

        sqlx::query(
            r#"
            INSERT INTO credentials (name, token, updated_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(name) DO UPDATE SET
                token = excluded.token,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(name)
        .bind(&token)
        .execute(&self.pool)
        .await?;

        tracing::info!("🔐 Stored credential '{}'", name);
        Ok(())
    }

    /// Raw token for `name`, if stored
    pub async fn token(&self, name: &str) -> CredentialResult<Option<String>> {
        let row = sqlx::query("SELECT token FROM credentials WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get("token")))
    }

    pub async fn list_names(&self) -> CredentialResult<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM credentials ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|row| row.get("name")).collect())
    }

    pub async fn delete(&self, name: &str) -> CredentialResult<bool> {
        let result = sqlx::query("DELETE FROM credentials WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CredentialProvider for CredentialStore {
    async fn credentials(&self, name: &str) -> CredentialResult<Value> {
        let token = self
            .token(name)
            .await?
            .ok_or_else(|| CredentialError::NotFound(name.to_string()))?;

        self.vault.decrypt(&token).map_err(|err| {
            tracing::error!("❌ Failed to open credential '{}': {}", name, err);
            err
        })
    }
}
