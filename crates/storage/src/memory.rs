//! In-memory record store.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{RecordStore, StoreError, StoreResult};

/// In-memory [`RecordStore`] implementation.
///
/// Used by the test suite and by embedders that do not need
/// persistence across restarts.
pub struct MemoryStore {
    records: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn put(&self, key: &str, data: &[u8]) -> StoreResult<()> {
        let mut records = self.records.write().await;
        records.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        let records = self.records.read().await;
        records
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut records = self.records.write().await;
        if records.remove(key).is_none() {
            return Err(StoreError::KeyNotFound(key.to_string()));
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let records = self.records.read().await;
        Ok(records.contains_key(key))
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let records = self.records.read().await;
        let mut keys: Vec<String> = records
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn base_path(&self) -> Option<PathBuf> {
        None
    }
}
