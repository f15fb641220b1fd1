//! OAuth2 authorization for the Google Photos Library API.
//!
//! This module provides:
//! - PKCE verifier/challenge generation
//! - A single-shot loopback listener for the redirect
//! - Token endpoint exchanges (authorization code and refresh grants)
//! - Durable refresh-token storage and the token store state machine

pub mod callback;
pub mod endpoint;
pub mod flow;
pub mod pkce;
pub mod storage;
pub mod store;

pub use callback::{CallbackListener, CallbackParams, Rejection};
pub use endpoint::{TokenEndpoint, TokenResponse};
pub use flow::{AuthorizationFlow, PendingAuthorization, TokenPair};
pub use pkce::Pkce;
#[cfg(feature = "keyring")]
pub use storage::KeyringSecretStorage;
pub use storage::{FileSecretStorage, MemorySecretStorage, SecretStorage};
pub use store::{TokenState, TokenStore};

/// Characters of a secret that may appear in logs.
const VISIBLE_PREFIX: usize = 6;

/// Shorten a secret for log output.
pub fn redact(secret: &str) -> String {
    if secret.chars().count() <= VISIBLE_PREFIX {
        return "***".to_string();
    }
    let prefix: String = secret.chars().take(VISIBLE_PREFIX).collect();
    format!("{}…", prefix)
}
