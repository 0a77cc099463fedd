//! Login request and response bodies.

use super::user::User;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Login identifier (username or e-mail) plus password.
///
/// Lives only for the duration of a login attempt and is never persisted.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// `POST /auth/login` response body. The session token itself arrives as an
/// HTTP-only cookie and never shows up here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub data: User,
    /// Session lifetime in seconds as reported by the server.
    pub expires_in: f64,
}
