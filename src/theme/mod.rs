//! Light/dark theme choice, persisted across runs.
//!
//! An explicit `light`/`dark` choice is stored under [`THEME_MODE_KEY`];
//! following the system scheme is represented by the key being absent.

use crate::storage::{KeyValueStore, THEME_MODE_KEY};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    /// Only explicit choices are honored when read back from storage.
    fn from_stored(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The scheme actually in effect once `System` is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

impl ColorScheme {
    /// Read the terminal's preference from `COLORFGBG` (`fg;bg`, dark when
    /// the background index is below 7). Unknown means light.
    pub fn detect() -> Self {
        std::env::var("COLORFGBG")
            .ok()
            .and_then(|v| v.rsplit(';').next().and_then(|bg| bg.parse::<u8>().ok()))
            .map_or(Self::Light, |bg| if bg < 7 { Self::Dark } else { Self::Light })
    }
}

pub struct ThemeController {
    store: Arc<dyn KeyValueStore>,
    system: ColorScheme,
    mode: Mutex<ThemeMode>,
}

impl ThemeController {
    pub fn new(store: Arc<dyn KeyValueStore>, system: ColorScheme) -> Self {
        Self {
            store,
            system,
            mode: Mutex::new(ThemeMode::System),
        }
    }

    /// Load the stored choice. Anything but `light`/`dark` (including a read
    /// failure) falls back to following the system.
    pub async fn init(&self) -> ThemeMode {
        let mode = match self.store.get_item(THEME_MODE_KEY).await {
            Ok(raw) => raw
                .as_deref()
                .and_then(ThemeMode::from_stored)
                .unwrap_or(ThemeMode::System),
            Err(e) => {
                tracing::warn!("Failed to read saved theme: {e}");
                ThemeMode::System
            }
        };
        *self.mode.lock() = mode;
        tracing::debug!(mode = %mode, "Theme initialized");
        mode
    }

    pub fn mode(&self) -> ThemeMode {
        *self.mode.lock()
    }

    pub fn color_scheme(&self) -> ColorScheme {
        match self.mode() {
            ThemeMode::Light => ColorScheme::Light,
            ThemeMode::Dark => ColorScheme::Dark,
            ThemeMode::System => self.system,
        }
    }

    pub fn is_dark(&self) -> bool {
        self.color_scheme() == ColorScheme::Dark
    }

    /// Flip between light and dark based on what is currently shown, and
    /// remember the explicit choice.
    pub async fn toggle(&self) -> ThemeMode {
        let next = if self.is_dark() {
            ThemeMode::Light
        } else {
            ThemeMode::Dark
        };
        self.set_theme(next).await;
        next
    }

    /// Apply `mode` immediately; persistence failures are logged only.
    pub async fn set_theme(&self, mode: ThemeMode) {
        *self.mode.lock() = mode;
        let result = match mode {
            ThemeMode::System => self.store.remove_item(THEME_MODE_KEY).await,
            explicit => self.store.set_item(THEME_MODE_KEY, explicit.as_str()).await,
        };
        if let Err(e) = result {
            tracing::warn!(mode = %mode, "Failed to save theme: {e}");
        }
    }
}
