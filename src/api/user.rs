//! `/user` endpoints. All of them are admin-gated server-side; the client
//! only propagates errors.

use super::{ApiClient, ApiError};
use crate::models::{
    CreateUserPayload, CreateUserResponse, MessageResponse, PaginatedResponse, UpdateUserPayload,
    User, UserResponse,
};

/// `GET /user?page&perPage`. Absent parameters are left to server defaults.
pub async fn get_all_users(
    api: &ApiClient,
    page: Option<u32>,
    per_page: Option<u32>,
) -> Result<PaginatedResponse<User>, ApiError> {
    let mut query = Vec::with_capacity(2);
    if let Some(page) = page {
        query.push(("page", page.to_string()));
    }
    if let Some(per_page) = per_page {
        query.push(("perPage", per_page.to_string()));
    }
    api.get("/user", &query).await
}

/// `GET /user/:id`
pub async fn get_user_by_id(api: &ApiClient, id: i64) -> Result<UserResponse, ApiError> {
    api.get(&format!("/user/{id}"), &[]).await
}

/// `POST /user`
pub async fn create_user(
    api: &ApiClient,
    payload: &CreateUserPayload,
) -> Result<CreateUserResponse, ApiError> {
    api.post("/user", payload).await
}

/// `PUT /user/:id`
pub async fn update_user(
    api: &ApiClient,
    id: i64,
    payload: &UpdateUserPayload,
) -> Result<UserResponse, ApiError> {
    api.put(&format!("/user/{id}"), payload).await
}

/// `DELETE /user/:id` (soft delete on the backend).
pub async fn delete_user(api: &ApiClient, id: i64) -> Result<MessageResponse, ApiError> {
    api.delete(&format!("/user/{id}")).await
}
