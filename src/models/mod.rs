//! Wire and domain records shared by the API client, storage and view-models.

pub mod auth;
pub mod user;

pub use auth::{Credentials, LoginResponse};
pub use user::{
    CreateUserPayload, CreateUserResponse, CreatedUser, MessageResponse, PaginatedResponse,
    Pagination, UpdateUserPayload, User, UserResponse,
};
