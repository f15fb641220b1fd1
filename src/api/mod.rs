//! Google Photos Library API module.
//!
//! This module provides:
//! - HTTP client for the Library REST API
//! - Access-token injection for outbound requests
//! - Search request and response types

pub mod authenticator;
pub mod client;
pub mod types;

pub use authenticator::RequestAuthenticator;
pub use client::{PhotosApi, SearchApi, API_BASE, MAX_PAGE_SIZE};
pub use types::*;
