pub mod schema;

pub use schema::{
    default_config_path, ApiConfig, Config, SessionConfig, StorageConfig, UsersConfig,
    DEFAULT_API_URL,
};
