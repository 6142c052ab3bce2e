//! Key-value persistence
//!
//! Values are stored verbatim; callers own the JSON encoding. A write
//! replaces the previous value atomically (single-row upsert).

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use aria_core::storage::KeyValueStore;

use crate::error::Result;

/// `SQLite`-backed `KeyValueStore`
#[derive(Debug, Clone)]
pub struct SqliteKeyValueStore {
    pool: SqlitePool,
}

impl SqliteKeyValueStore {
    /// Wrap a migrated pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Read a raw value
    pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM key_value_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get::<String, _>("value")))
    }

    /// Insert or replace a raw value
    pub async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            "INSERT INTO key_value_store (key, value, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await?;

        tracing::trace!(key, bytes = value.len(), "Stored value");
        Ok(())
    }

    /// Delete a value
    ///
    /// Returns `true` if a row was removed
    pub async fn delete_value(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM key_value_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All stored keys, sorted
    pub async fn keys(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM key_value_store ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get::<String, _>("key")).collect())
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> aria_core::Result<Option<String>> {
        Ok(self.get_value(key).await?)
    }

    async fn set(&self, key: &str, value: String) -> aria_core::Result<()> {
        Ok(self.set_value(key, &value).await?)
    }

    async fn remove(&self, key: &str) -> aria_core::Result<()> {
        self.delete_value(key).await?;
        Ok(())
    }
}
