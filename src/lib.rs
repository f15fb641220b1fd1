//! Photos Downloader - download a Google Photos library year by year.
//!
//! This library authorizes a single local user with the OAuth2
//! authorization-code flow (PKCE, loopback redirect), keeps the refresh
//! token across runs, and downloads the user's media into one directory per
//! year.
//!
//! # Features
//!
//! - Browser-based authorization with PKCE (S256) and state validation
//! - Refresh token persisted to a file or, with the `keyring` feature, the
//!   system keychain
//! - Single-flight access-token derivation
//! - Cursor-paginated media search per calendar year
//! - Concurrent, idempotent downloads (existing files are never refetched)
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use photos_downloader::{App, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("config.toml"))?;
//!     let app = App::from_config(config)?;
//!
//!     app.ensure_authorized(false).await?;
//!     let stats = app.run_years(2020..=2024, true).await;
//!     println!("{} files downloaded", stats.total_downloaded());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod fs;
pub mod media;
pub mod output;

// Re-exports for convenience
pub use api::{PhotosApi, RequestAuthenticator, SearchApi};
pub use app::{download_years, App};
pub use auth::{AuthorizationFlow, TokenState, TokenStore};
pub use config::Config;
pub use download::{BatchReport, DownloadOrchestrator, GlobalState};
pub use error::{Error, Result};
pub use media::{MediaIndexFetcher, MediaItem, MediaType};
