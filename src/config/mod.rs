//! Configuration module for the viewer
//!
//! This module handles the persisted viewer configuration:
//! - Session save defaults (filename, indentation, target directory)
//! - Loader settings (kind for delimited text, HTTP timeout)
//! - IR peaks table column preferences
//! - UI preferences
//!
//! # App Data Location
//!
//! Configuration and logs live in the platform-appropriate data directory
//! under `dev.iumview`:
//!
//! - **Linux**: `~/.local/share/dev.iumview/`
//! - **macOS**: `~/Library/Application Support/dev.iumview/`
//! - **Windows**: `%APPDATA%\dev.iumview\`
//!
//! # Files
//!
//! - `config.toml` - Viewer configuration
//! - `logs/` - Daily rolling log files
//!
//! # Example
//!
//! ```ignore
//! use iumview::config::ViewerConfig;
//!
//! let mut config = ViewerConfig::load_or_default();
//! config.session.indent = 2;
//! config.save()?;
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{Result, ResultExt, ViewerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.iumview";

/// Configuration filename
pub const CONFIG_FILE: &str = "config.toml";

/// Log directory name inside the app data directory
pub const LOG_DIR: &str = "logs";

/// Default timeout for remote file-list requests in seconds
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Kind assigned to measurements read from delimited text files
pub const DEFAULT_TEXT_KIND: &str = "generic";

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        ViewerError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            ViewerError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== Viewer Config ====================

/// Persistent viewer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Version for future migration support
    #[serde(default = "default_config_version")]
    pub version: u32,

    /// Session save defaults
    #[serde(default)]
    pub session: SessionConfig,

    /// File loading settings
    #[serde(default)]
    pub loader: LoaderConfig,

    /// IR peaks table columns
    #[serde(default)]
    pub peaks_table: PeaksTablePreferences,

    /// UI preferences
    #[serde(default)]
    pub ui: UiPreferences,
}

fn default_config_version() -> u32 {
    1
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            session: SessionConfig::default(),
            loader: LoaderConfig::default(),
            peaks_table: PeaksTablePreferences::default(),
            ui: UiPreferences::default(),
        }
    }
}

impl ViewerConfig {
    /// Load configuration from the default location
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let path = config_path().ok_or_else(|| {
            ViewerError::Config("Could not determine config path".to_string())
        })?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(ViewerError::from)
            .with_context(|| format!("Failed to read config {:?}", path))?;

        toml::from_str(&content)
            .map_err(|e| ViewerError::Config(format!("Failed to parse config {:?}: {}", path, e)))
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let dir = ensure_app_data_dir()?;
        self.save_to(dir.join(CONFIG_FILE))
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(ViewerError::from)
                .context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ViewerError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(ViewerError::from)
            .with_context(|| format!("Failed to write config {:?}", path))?;

        tracing::debug!("Saved config to {:?}", path);
        Ok(())
    }
}

/// Session save defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Filename without extension
    #[serde(default = "default_session_filename")]
    pub default_filename: String,

    /// Spaces per indentation level, 0 for compact output
    #[serde(default)]
    pub indent: usize,

    /// Where quick saves go; the downloads directory when unset
    #[serde(default)]
    pub save_directory: Option<PathBuf>,
}

fn default_session_filename() -> String {
    crate::session::DEFAULT_SESSION_NAME.to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_filename: default_session_filename(),
            indent: 0,
            save_directory: None,
        }
    }
}

impl SessionConfig {
    /// Directory used for quick saves
    pub fn resolve_directory(&self) -> PathBuf {
        self.save_directory
            .clone()
            .or_else(dirs_next::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// File loading settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Kind given to measurements read from CSV/TSV/TXT files
    #[serde(default = "default_text_kind")]
    pub default_text_kind: String,

    /// Timeout for remote file-list requests
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

fn default_text_kind() -> String {
    DEFAULT_TEXT_KIND.to_string()
}

fn default_fetch_timeout() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            default_text_kind: default_text_kind(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

// ==================== Tests ====================
