use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default API base URL (local development backend).
pub const DEFAULT_API_URL: &str = "http://localhost:3003/api";

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MIN_LOADING_MS: u64 = 400;
const DEFAULT_PER_PAGE: u32 = 5;

// ── Sections ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to.
    pub base_url: String,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for local app data. `~` is expanded. When unset the
    /// platform data directory is used.
    pub data_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Minimum time the startup loading state stays visible.
    pub min_loading_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_loading_ms: DEFAULT_MIN_LOADING_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsersConfig {
    /// Page size for the user list.
    pub per_page: u32,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

// ── Root ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub session: SessionConfig,
    pub users: UsersConfig,
}

impl Config {
    /// Load from an explicit path, or from `<config dir>/config.toml`.
    /// A missing file yields defaults; env overrides are applied after.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path(),
        };

        let mut config = match path {
            Some(ref p) if p.exists() => Self::from_file(p)?,
            Some(ref p) => {
                tracing::debug!(path = %p.display(), "No config file, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// `BASEAPP_API_URL` and `BASEAPP_DATA_DIR` win over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("BASEAPP_API_URL") {
            if !url.trim().is_empty() {
                self.api.base_url = url.trim().to_string();
            }
        }
        if let Ok(dir) = std::env::var("BASEAPP_DATA_DIR") {
            if !dir.trim().is_empty() {
                self.storage.data_dir = Some(dir.trim().to_string());
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.api.base_url.trim();
        if url.is_empty() {
            bail!("api.base_url cannot be empty");
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("api.base_url must start with http:// or https:// (got '{url}')");
        }
        if self.api.timeout_secs == 0 {
            bail!("api.timeout_secs must be at least 1");
        }
        if self.users.per_page == 0 {
            bail!("users.per_page must be at least 1");
        }
        Ok(())
    }

    /// Resolved data directory for local storage.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.storage.data_dir {
            let expanded = shellexpand::tilde(dir);
            return Ok(PathBuf::from(expanded.as_ref()));
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| anyhow::anyhow!("Could not determine a data directory; set storage.data_dir"))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "baseapp", "baseapp")
}

/// `<platform config dir>/config.toml`, if a home directory exists.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}
