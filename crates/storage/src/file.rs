//! Filesystem-backed record store.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::{RecordStore, StoreError, StoreResult};

/// A [`RecordStore`] keeping one file per record under a base directory.
///
/// Key segments map to directories, so `teams/alpha` lands at
/// `<base>/teams/alpha`. Parent directories are created on demand.
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Create a store rooted at the given directory, creating it if needed.
    pub fn new(base_path: PathBuf) -> StoreResult<Self> {
        std::fs::create_dir_all(&base_path)?;
        Ok(FileStore { base_path })
    }

    fn full_path(&self, key: &str) -> PathBuf {
        let mut path = self.base_path.clone();
        for segment in key.split('/') {
            path.push(segment);
        }
        path
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn put(&self, key: &str, data: &[u8]) -> StoreResult<()> {
        let path = self.full_path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;
        debug!(key, bytes = data.len(), "record written");
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        let path = self.full_path(key);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::KeyNotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let path = self.full_path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::KeyNotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.full_path(key).exists())
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let dir = self.full_path(prefix.trim_end_matches('/'));
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Ok(relative) = path.strip_prefix(&self.base_path) {
                // Keys are slash-separated regardless of platform.
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn base_path(&self) -> Option<PathBuf> {
        Some(self.base_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsonRecords;
    use serde::{Deserialize, Serialize};
    use tempfile::tempdir;

    #[tokio::test]
    async fn basic_operations() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        store.put("teams/alpha", b"record").await.unwrap();
        assert!(dir.path().join("teams").join("alpha").exists());
        assert_eq!(store.get("teams/alpha").await.unwrap(), b"record");

        store.delete("teams/alpha").await.unwrap();
        assert!(!store.exists("teams/alpha").await.unwrap());
        assert!(matches!(
            store.get("teams/alpha").await,
            Err(StoreError::KeyNotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_scoped_to_namespace() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        store.put("teams/alpha", b"a").await.unwrap();
        store.put("teams/beta", b"b").await.unwrap();
        store.put("proposals/prize", b"p").await.unwrap();

        let keys = store.list("teams/").await.unwrap();
        assert_eq!(keys, vec!["teams/alpha".to_string(), "teams/beta".to_string()]);

        // Listing an empty namespace is not an error.
        assert!(store.list("claims/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn json_documents_survive_reopen() {
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct Doc {
            name: String,
        }

        let dir = tempdir().unwrap();
        {
            let store = FileStore::new(dir.path().to_path_buf()).unwrap();
            store
                .put_json("teams/alpha", &Doc { name: "alpha".into() })
                .await
                .unwrap();
        }

        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        let doc: Doc = store.get_json("teams/alpha").await.unwrap();
        assert_eq!(doc.name, "alpha");
    }
}
