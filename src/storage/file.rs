//! JSON-file backed key-value store.
//!
//! All keys live in `<data_dir>/storage.json`. Writes go to a sibling temp
//! file first and are renamed into place, so a crash mid-write leaves the
//! previous document intact.

use super::{KeyValueStore, StorageError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

const STORAGE_FILE: &str = "storage.json";

type Document = BTreeMap<String, String>;

pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Store rooted at `data_dir`. The directory is created on first write.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(STORAGE_FILE),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Document, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Document::new());
        }
        serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    async fn write_document(&self, doc: &Document) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json =
            serde_json::to_string_pretty(doc).map_err(|e| StorageError::Serialize(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn modify(&self, f: impl FnOnce(&mut Document) -> bool + Send) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let (mut doc, recovered) = match self.read_document().await {
            Ok(doc) => (doc, false),
            Err(StorageError::Corrupt(reason)) => {
                tracing::warn!(path = %self.path.display(), "Discarding corrupt storage document: {reason}");
                (Document::new(), true)
            }
            Err(e) => return Err(e),
        };
        // A corrupt document is always rewritten, even when `f` changes nothing.
        if f(&mut doc) || recovered {
            self.write_document(&doc).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_document().await?.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.modify(|doc| {
            doc.insert(key.to_string(), value.to_string());
            true
        })
        .await
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.modify(|doc| doc.remove(key).is_some()).await
    }

    async fn multi_remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        self.modify(|doc| {
            let mut changed = false;
            for key in keys {
                changed |= doc.remove(*key).is_some();
            }
            changed
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        assert!(store.get_item("anything").await.unwrap().is_none());
        store.remove_item("anything").await.unwrap();
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn values_survive_a_new_instance() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("data");

        FileStore::new(&dir).set_item("k", "v").await.unwrap();

        let reopened = FileStore::new(&dir);
        assert_eq!(reopened.get_item("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn multi_remove_keeps_unrelated_keys() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        store.set_item("a", "1").await.unwrap();
        store.set_item("b", "2").await.unwrap();

        store.multi_remove(&["a"]).await.unwrap();
        assert!(store.get_item("a").await.unwrap().is_none());
        assert_eq!(store.get_item("b").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn corrupt_document_is_reported_then_replaced_on_write() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        std::fs::write(store.path(), "{not json").unwrap();

        assert!(matches!(
            store.get_item("k").await,
            Err(StorageError::Corrupt(_))
        ));

        store.set_item("k", "v").await.unwrap();
        assert_eq!(store.get_item("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn removing_from_corrupt_document_rewrites_it() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        std::fs::write(store.path(), "{\"@base_app_user_data\": \"{\\\"id\\\":1").unwrap();

        store.multi_remove(&["@base_app_user_data"]).await.unwrap();
        assert!(store.get_item("@base_app_user_data").await.unwrap().is_none());

        std::fs::write(store.path(), "garbage").unwrap();
        store.remove_item("missing").await.unwrap();
        assert!(store.get_item("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn no_temp_file_left_behind() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        store.set_item("k", "v").await.unwrap();
        assert!(!tmp.path().join("storage.json.tmp").exists());
    }
}
