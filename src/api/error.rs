//! Normalized HTTP error.

use serde::{Deserialize, Serialize};

/// Status code reported when the request went out but no response came back.
pub const NETWORK_STATUS: i32 = 0;

/// Status code reported when the request could not be built or sent at all.
pub const REQUEST_STATUS: i32 = -1;

pub(crate) const DEFAULT_SERVER_MESSAGE: &str = "Unexpected server error.";
pub(crate) const NETWORK_MESSAGE: &str = "No connection to the server. Check your internet connection.";
pub(crate) const DEFAULT_REQUEST_MESSAGE: &str = "Failed to perform the request.";

/// A per-field problem reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub path: String,
    pub message: String,
}

/// Error body the backend sends with 4xx/5xx responses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: Option<String>,
    pub issues: Option<Vec<Issue>>,
}

/// Every failure of an [`ApiClient`](super::ApiClient) call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("{message}")]
    Server {
        message: String,
        status: u16,
        issues: Option<Vec<Issue>>,
    },
    /// The request was sent but no response arrived (timeout, connectivity).
    #[error("{message}")]
    Network { message: String },
    /// The request could not be built.
    #[error("{message}")]
    Request { message: String },
}

impl ApiError {
    pub(crate) fn server(status: u16, body: ApiErrorBody) -> Self {
        Self::Server {
            message: body
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SERVER_MESSAGE.to_string()),
            status,
            issues: body.issues,
        }
    }

    pub(crate) fn network() -> Self {
        Self::Network {
            message: NETWORK_MESSAGE.to_string(),
        }
    }

    pub(crate) fn request(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Request {
            message: if message.is_empty() {
                DEFAULT_REQUEST_MESSAGE.to_string()
            } else {
                message
            },
        }
    }

    /// Classify a transport-level `reqwest` failure.
    pub(crate) fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_builder() {
            Self::request(err.to_string())
        } else {
            Self::network()
        }
    }

    /// User-facing message.
    pub fn message(&self) -> &str {
        match self {
            Self::Server { message, .. }
            | Self::Network { message }
            | Self::Request { message } => message,
        }
    }

    /// HTTP status, `0` for network failures and `-1` for request failures.
    pub fn status_code(&self) -> i32 {
        match self {
            Self::Server { status, .. } => i32::from(*status),
            Self::Network { .. } => NETWORK_STATUS,
            Self::Request { .. } => REQUEST_STATUS,
        }
    }

    pub fn issues(&self) -> &[Issue] {
        match self {
            Self::Server {
                issues: Some(issues),
                ..
            } => issues,
            _ => &[],
        }
    }

    /// True for 401/403 responses.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Server { status, .. } if is_auth_failure(*status))
    }
}

pub(crate) fn is_auth_failure(status: u16) -> bool {
    status == 401 || status == 403
}
