//! Durable local key-value storage.
//!
//! String values under string keys, the same shape mobile/web key-value
//! stores expose. [`FileStore`] keeps everything in one JSON document on
//! disk; [`MemoryStore`] is the volatile variant. [`SessionStorage`] layers
//! the persisted-user contract on top.

pub mod file;
pub mod memory;
pub mod session;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use session::SessionStorage;

use async_trait::async_trait;

/// Key holding the serialized user of the current session.
pub const USER_DATA_KEY: &str = "@base_app_user_data";

/// Key holding the explicit theme choice (`light` | `dark`).
pub const THEME_MODE_KEY: &str = "@base_app_theme_mode";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage document is corrupt: {0}")]
    Corrupt(String),
    #[error("stored record under '{key}' is invalid: {reason}")]
    InvalidRecord { key: String, reason: String },
    #[error("failed to serialize record: {0}")]
    Serialize(String),
}

/// Minimal async key-value contract. Reading or removing a missing key is
/// not an error.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Remove several keys at once. Default implementation removes one by one.
    async fn multi_remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        for key in keys {
            self.remove_item(key).await?;
        }
        Ok(())
    }
}
