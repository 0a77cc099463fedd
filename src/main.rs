use anyhow::{Context, Result};
use baseapp::api::ApiClient;
use baseapp::config::Config;
use baseapp::router::{HistoryNavigator, Route};
use baseapp::session::SessionController;
use baseapp::storage::{FileStore, KeyValueStore, SessionStorage};
use baseapp::theme::{ColorScheme, ThemeController};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

mod shell;

/// Interactive client for the BaseApp REST API.
#[derive(Parser, Debug)]
#[command(name = "baseapp", version, about)]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, env = "BASEAPP_CONFIG")]
    config: Option<PathBuf>,

    /// API base URL, e.g. http://localhost:3003/api
    #[arg(long)]
    api_url: Option<String>,

    /// Directory for persisted session and theme
    #[arg(long)]
    data_dir: Option<String>,

    /// Log filter, overrides RUST_LOG (e.g. debug, baseapp=trace)
    #[arg(long)]
    log_level: Option<String>,
}

fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log level '{level}'"))?,
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("baseapp=info"))?,
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = Some(dir);
    }
    config.validate()?;

    let data_dir = config.data_dir()?;
    tracing::info!(
        api = %config.api.base_url,
        data_dir = %data_dir.display(),
        "Starting baseapp"
    );

    let api = Arc::new(ApiClient::new(&config.api).context("Failed to build HTTP client")?);
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&data_dir));
    let navigator = Arc::new(HistoryNavigator::new(Route::Home));
    let session = SessionController::new(
        api,
        SessionStorage::new(store.clone()),
        navigator.clone(),
        Duration::from_millis(config.session.min_loading_ms),
    );
    let theme = Arc::new(ThemeController::new(store, ColorScheme::detect()));

    shell::Shell::new(session, theme, navigator, config.users.per_page)
        .run()
        .await
}
