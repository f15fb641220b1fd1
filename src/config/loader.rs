//! Configuration structures and loading logic.

use crate::config::backend::StorageBackend;
use crate::error::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the persisted refresh token.
pub const TOKEN_FILE_NAME: &str = "refresh.token";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub google: GoogleConfig,

    #[serde(default)]
    pub options: OptionsConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// OAuth client registration and provider endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// OAuth client ID from the Google Cloud console.
    #[serde(default)]
    pub client_id: String,

    /// OAuth client secret.
    #[serde(default)]
    pub client_secret: String,

    /// Loopback redirect registered with the client. Must match exactly.
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    #[serde(default = "default_scope")]
    pub scope: String,

    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Library API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: default_redirect_uri(),
            scope: default_scope(),
            auth_url: default_auth_url(),
            token_url: default_token_url(),
            api_base: default_api_base(),
        }
    }
}

/// Download options configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Root directory; each year gets a subdirectory.
    #[serde(default = "default_download_directory")]
    pub download_directory: PathBuf,

    /// First year to download. Defaults to the current year.
    #[serde(default)]
    pub start_year: Option<i32>,

    /// Last year to download. Defaults to the current year.
    #[serde(default)]
    pub end_year: Option<i32>,

    /// Simultaneous downloads per year. Unset means no cap.
    #[serde(default)]
    pub concurrency: Option<usize>,

    /// Only download items marked as favourite.
    #[serde(default)]
    pub favorites_only: bool,

    /// Give up waiting for the browser after this many seconds.
    #[serde(default)]
    pub callback_timeout_seconds: Option<u64>,

    /// Launch the system browser for authorization.
    #[serde(default = "default_true")]
    pub open_browser: bool,

    /// Whether to show download progress.
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            download_directory: default_download_directory(),
            start_year: None,
            end_year: None,
            concurrency: None,
            favorites_only: false,
            callback_timeout_seconds: None,
            open_browser: true,
            show_progress: true,
        }
    }
}

/// Where the refresh token is persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Token file for the `file` backend. Defaults to the platform config
    /// directory.
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

fn default_redirect_uri() -> String {
    "http://localhost:5007/Authentication/Callback".to_string()
}

fn default_scope() -> String {
    "https://www.googleapis.com/auth/photoslibrary.readonly".to_string()
}

fn default_auth_url() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_api_base() -> String {
    crate::api::API_BASE.to_string()
}

fn default_download_directory() -> PathBuf {
    PathBuf::from("images")
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}. Create one from config.example.toml",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Years to download, inclusive. Unset bounds default to `current_year`.
    pub fn year_range(&self, current_year: i32) -> (i32, i32) {
        let start = self.options.start_year.unwrap_or(current_year);
        let end = self.options.end_year.unwrap_or(current_year.max(start));
        (start, end)
    }

    /// Effective refresh token file.
    pub fn token_file(&self) -> PathBuf {
        self.storage
            .token_file
            .clone()
            .unwrap_or_else(default_token_file)
    }
}

/// `<platform config dir>/photos-downloader/refresh.token`, or the working
/// directory when no home directory can be determined.
pub fn default_token_file() -> PathBuf {
    ProjectDirs::from("", "", env!("CARGO_PKG_NAME"))
        .map(|dirs| dirs.config_dir().join(TOKEN_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(TOKEN_FILE_NAME))
}
