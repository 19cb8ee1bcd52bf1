//! # Storage Port
//!
//! Key/value persistence used by the cart store.
//!
//! ## Port & Adapters
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  BookingStore ──► dyn StateStorage (THIS TRAIT)                        │
//! │                        │                                                │
//! │          ┌─────────────┴──────────────┐                                │
//! │          ▼                            ▼                                 │
//! │   MemoryStorage (here)        SqliteStorage (gearent-db)               │
//! │   tests, ephemeral runs       local_storage table, survives restarts   │
//! │                                                                         │
//! │  Semantics match browser localStorage: string keys, string values,     │
//! │  last writer wins, no cross-writer locking.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::StoreResult;

/// Durable string key/value storage.
#[async_trait]
pub trait StateStorage: Send + Sync {
    /// Returns the value stored under `key`, if any.
    async fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Deletes `key`. Deleting an absent key is not an error.
    async fn remove_item(&self, key: &str) -> StoreResult<()>;
}

/// Versioned wrapper written around persisted state.
///
/// ```json
/// { "state": { "items": [], "user": null }, "version": 0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistEnvelope<T> {
    pub state: T,
    pub version: u32,
}

/// In-memory storage.
///
/// Clones share the same map, so a second store built from a clone sees what
/// the first one wrote (a simulated page reload).
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl StateStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get_item("k").await.unwrap(), None);

        storage.set_item("k", "v1").await.unwrap();
        storage.set_item("k", "v2").await.unwrap();
        assert_eq!(storage.get_item("k").await.unwrap().as_deref(), Some("v2"));

        storage.remove_item("k").await.unwrap();
        storage.remove_item("k").await.unwrap();
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let a = MemoryStorage::new();
        let b = a.clone();
        a.set_item("shared", "1").await.unwrap();
        assert_eq!(b.get_item("shared").await.unwrap().as_deref(), Some("1"));
        assert_eq!(b.len().await, 1);
    }
}
