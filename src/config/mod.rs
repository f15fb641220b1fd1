//! Configuration module for the photos-downloader.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Refresh token storage backend selection
//! - Configuration validation

pub mod backend;
pub mod loader;
pub mod validation;

pub use backend::StorageBackend;
pub use loader::{default_token_file, Config, GoogleConfig, OptionsConfig, StorageConfig};
pub use validation::validate_config;
