//! Session lifecycle: restoration, login, logout and forced logout.

mod controller;
mod state;

pub use controller::SessionController;
pub use state::{AuthState, SessionSnapshot};

use crate::api::ApiError;
use crate::storage::StorageError;

/// Failure of a session operation that the caller has to see.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("failed to save user data: {0}")]
    Storage(#[from] StorageError),
    #[error("no active session")]
    NotAuthenticated,
}

impl SessionError {
    /// One line suitable for showing under a form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) => e.message().to_string(),
            Self::Storage(_) => "Could not save your session on this device.".to_string(),
            Self::NotAuthenticated => "You are not signed in.".to_string(),
        }
    }
}
