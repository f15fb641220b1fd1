//! Outbound request interception that injects the current access token.

use std::sync::Arc;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Request;

use crate::auth::TokenStore;

/// Rewrites the `Authorization` header of built requests.
///
/// Requests must be built with a placeholder credential (for example
/// `bearer_auth("pending")`) to opt in; requests without the header are
/// passed through untouched.
#[derive(Clone)]
pub struct RequestAuthenticator {
    store: Arc<TokenStore>,
}

impl RequestAuthenticator {
    pub fn new(store: Arc<TokenStore>) -> Self {
        Self { store }
    }

    /// Replace the credential, keeping the scheme. No retry: if no token can
    /// be derived the request goes out with an empty credential and the API
    /// rejects it.
    pub async fn authenticate(&self, mut request: Request) -> Request {
        let Some(current) = request.headers().get(AUTHORIZATION) else {
            return request;
        };

        let scheme = current
            .to_str()
            .ok()
            .and_then(|value| value.split_whitespace().next())
            .unwrap_or("Bearer")
            .to_string();

        let token = match self.store.get_access_token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!("Could not obtain an access token: {}", e);
                String::new()
            }
        };

        match HeaderValue::from_str(&format!("{} {}", scheme, token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(e) => tracing::warn!("Access token is not a valid header value: {}", e),
        }

        request
    }
}
