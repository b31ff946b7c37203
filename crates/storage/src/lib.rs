//! Record storage for the Team DAO governance engine.
//!
//! Governance state is persisted as individually addressed records: one
//! document per team and one per proposal, keyed by a `namespace/name`
//! path. The engine never joins records at the storage level; every
//! cross-record reference is re-resolved by key at call time.
//!
//! Implementations provided here:
//! - [`MemoryStore`] — in-memory map, used by tests and embedders
//! - [`FileStore`] — one JSON file per record on the local filesystem

use std::path::PathBuf;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Storage-related errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Unexpected error: {0}")]
    Other(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() {
            StoreError::Deserialization(err.to_string())
        } else {
            StoreError::Serialization(err.to_string())
        }
    }
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// The core trait every record store must implement.
///
/// Keys are slash-separated paths (`teams/alpha`, `proposals/prize-24`).
/// Each key addresses exactly one record; writes replace the whole
/// record. Callers that need read-modify-write atomicity serialize
/// access per key themselves — the governance engine holds a per-record
/// lock around every mutation.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Store raw record bytes at the given key, replacing any previous value.
    async fn put(&self, key: &str, data: &[u8]) -> StoreResult<()>;

    /// Retrieve the record stored at the given key.
    async fn get(&self, key: &str) -> StoreResult<Vec<u8>>;

    /// Delete the record at the given key.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Check whether a record exists at the given key.
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// List all keys under the given prefix.
    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Base path of the store, if it is filesystem-backed.
    fn base_path(&self) -> Option<PathBuf>;
}

/// Extension trait layering typed JSON documents over a [`RecordStore`].
#[async_trait]
pub trait JsonRecords: RecordStore {
    /// Serialize a value and store it at the given key.
    async fn put_json<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> StoreResult<()> {
        let data = serde_json::to_vec_pretty(value)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.put(key, &data).await
    }

    /// Retrieve and deserialize the value stored at the given key.
    async fn get_json<T: DeserializeOwned + Send>(&self, key: &str) -> StoreResult<T> {
        let data = self.get(key).await?;
        serde_json::from_slice(&data).map_err(|e| StoreError::Deserialization(e.to_string()))
    }

    /// Read-modify-write a JSON record in place.
    ///
    /// The record must already exist. The closure mutates the
    /// deserialized value; if it errors, nothing is written back.
    async fn update_json<T, F>(&self, key: &str, apply: F) -> StoreResult<T>
    where
        T: DeserializeOwned + Serialize + Send,
        F: FnOnce(&mut T) -> StoreResult<()> + Send,
    {
        let data = self.get(key).await?;
        let mut value: T = serde_json::from_slice(&data)
            .map_err(|e| StoreError::Deserialization(e.to_string()))?;

        apply(&mut value)?;

        let data = serde_json::to_vec_pretty(&value)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.put(key, &data).await?;

        Ok(value)
    }
}

// Every record store gets the JSON layer for free.
impl<T: RecordStore + ?Sized> JsonRecords for T {}
