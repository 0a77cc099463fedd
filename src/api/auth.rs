//! Authentication endpoints.

use super::{ApiClient, ApiError, LOGIN_PATH};
use crate::models::{Credentials, LoginResponse};

/// `POST /auth/login`. On success the backend also sets the session cookie,
/// which the client's cookie jar keeps for later requests.
pub async fn login(api: &ApiClient, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
    api.post(LOGIN_PATH, credentials).await
}
