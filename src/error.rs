//! Error types for the photos-downloader application.

use std::time::Duration;

use thiserror::Error;

use crate::auth::Rejection;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    #[error("Redirect URI cannot be served: {0}")]
    RedirectUri(String),

    // Authorization errors
    #[error("Authorization rejected: {0}")]
    AuthorizationRejected(Rejection),

    #[error("Timed out after {0:?} waiting for the authorization callback")]
    CallbackTimeout(Duration),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Not authenticated: no refresh token available")]
    Unauthenticated,

    // API errors
    #[error("API error: {0}")]
    Api(String),

    #[error("Media index fetch failed: {0}")]
    IndexFetch(String),

    // Download errors
    #[error("Download failed: {0}")]
    Download(String),

    #[error("{0} year(s) failed")]
    SomeYearsFailed(u64),

    // File system errors
    #[error("Invalid filename (path traversal attempt): {0}")]
    InvalidFilename(String),

    // Secret storage errors
    #[error("Token storage error: {0}")]
    Storage(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl From<Rejection> for Error {
    fn from(rejection: Rejection) -> Self {
        Error::AuthorizationRejected(rejection)
    }
}

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const ABORT: i32 = 1;
    pub const API_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const DOWNLOAD_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
    pub const SOME_YEARS_FAILED: i32 = 6;
}
