//! Persisted copy of the signed-in user.
//!
//! Only the user record is stored. The session token is an HTTP-only cookie
//! held by the HTTP client and never reaches local storage.

use super::{KeyValueStore, StorageError, USER_DATA_KEY};
use crate::models::User;
use std::sync::Arc;

#[derive(Clone)]
pub struct SessionStorage {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Persist `user` under the well-known key, replacing any previous record.
    pub async fn set_user_data(&self, user: &User) -> Result<(), StorageError> {
        let json =
            serde_json::to_string(user).map_err(|e| StorageError::Serialize(e.to_string()))?;
        self.store.set_item(USER_DATA_KEY, &json).await
    }

    /// The persisted user, `Ok(None)` when nothing is stored.
    ///
    /// A record that no longer parses is an [`StorageError::InvalidRecord`].
    pub async fn get_user_data(&self) -> Result<Option<User>, StorageError> {
        let Some(raw) = self.store.get_item(USER_DATA_KEY).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::InvalidRecord {
                key: USER_DATA_KEY.to_string(),
                reason: e.to_string(),
            })
    }

    /// Remove everything tied to the session. Safe to call repeatedly.
    pub async fn clear_auth_data(&self) -> Result<(), StorageError> {
        self.store.multi_remove(&[USER_DATA_KEY]).await
    }

    /// Whether a readable user record is persisted. Read failures count as no.
    pub async fn is_authenticated(&self) -> bool {
        match self.get_user_data().await {
            Ok(user) => user.is_some(),
            Err(e) => {
                tracing::warn!("Failed to check persisted session: {e}");
                false
            }
        }
    }
}
