//! Durable key-value storage seam
//!
//! The player persists three independent values, all UTF-8 JSON:
//! - `queueState`: the minimized queue and its cursor
//! - `equalizerSettings`: band gains in fixed band order
//! - `playbackPreferences`: repeat mode and shuffle flag
//!
//! Writes are best-effort durability; callers log failures and carry on with
//! the in-memory state.

use crate::error::{AriaError, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Key of the persisted queue snapshot
pub const QUEUE_STATE_KEY: &str = "queueState";

/// Key of the persisted equalizer gains
pub const EQUALIZER_SETTINGS_KEY: &str = "equalizerSettings";

/// Key of the persisted repeat/shuffle preferences
pub const PLAYBACK_PREFERENCES_KEY: &str = "playbackPreferences";

/// Durable string-keyed storage
///
/// Implemented by on-device stores (SQLite in `aria-storage`) and by
/// `MemoryStore` for tests and ephemeral sessions.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a raw value
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a raw value, replacing any previous one
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Delete a value (no-op when absent)
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Read and deserialize a JSON value
pub async fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serialize and write a JSON value
pub async fn save_json<T: Serialize + Sync>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, raw).await
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
    fail_writes: RwLock<bool>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail (for exercising persistence-failure paths)
    pub async fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.write().await = fail;
    }

    /// Number of stored keys
    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    /// Whether the store holds no keys
    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        if *self.fail_writes.read().await {
            return Err(AriaError::storage(format!("write to '{}' rejected", key)));
        }
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}
