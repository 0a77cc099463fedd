//! HTTP client for the backend REST API.
//!
//! Wraps a cookie-aware `reqwest::Client`, so the HTTP-only session cookie set
//! by `POST /auth/login` is replayed automatically and never touched by
//! application code. Every failure is normalized into [`ApiError`].
//!
//! Any 401/403 on a request other than the login call raises the
//! [`AuthFailureHook`] before the error is returned to the caller.

pub mod auth;
pub mod error;
pub mod hook;
pub mod user;

pub use error::{ApiError, Issue};
pub use hook::{AuthFailureHook, AuthFailureListener, ListenerRegistration};

use crate::config::ApiConfig;
use error::{is_auth_failure, ApiErrorBody};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Path of the login endpoint; its 401/403 responses are ordinary login
/// failures and never raise the auth-failure signal.
pub const LOGIN_PATH: &str = "/auth/login";

/// REST client bound to one API base URL.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    auth_failure: AuthFailureHook,
}

impl ApiClient {
    /// Build a client from config with a fresh listener slot.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::with_hook(config, AuthFailureHook::new())
    }

    pub fn with_hook(config: &ApiConfig, auth_failure: AuthFailureHook) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .map_err(|e| ApiError::request(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            auth_failure,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The slot session owners register their listener with.
    pub fn auth_failure_hook(&self) -> &AuthFailureHook {
        &self.auth_failure
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let request = self.http.request(Method::GET, self.url(path)).query(query);
        self.execute(path, request).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.http.request(Method::POST, self.url(path)).json(body);
        self.execute(path, request).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.http.request(Method::PUT, self.url(path)).json(body);
        self.execute(path, request).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.http.request(Method::DELETE, self.url(path));
        self.execute(path, request).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let resp = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(path, "Request failed without response: {e}");
                return Err(ApiError::from_transport(&e));
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let body: ApiErrorBody = serde_json::from_str(&text).unwrap_or_default();
            let err = ApiError::server(status.as_u16(), body);

            if is_auth_failure(status.as_u16()) && path != LOGIN_PATH {
                tracing::info!(path, status = status.as_u16(), "Session rejected by server");
                self.auth_failure.notify().await;
            } else {
                tracing::debug!(path, status = status.as_u16(), "Request failed: {err}");
            }
            return Err(err);
        }

        resp.json::<T>().await.map_err(|e| {
            tracing::warn!(path, "Malformed response body: {e}");
            ApiError::server(
                status.as_u16(),
                ApiErrorBody {
                    message: Some("Invalid response from server.".into()),
                    issues: None,
                },
            )
        })
    }
}
