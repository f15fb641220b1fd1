//! Browser-based authorization-code flow with PKCE.

use std::time::Duration;

use url::Url;

use crate::auth::callback::CallbackListener;
use crate::auth::endpoint::TokenEndpoint;
use crate::auth::pkce::{Pkce, CHALLENGE_METHOD};
use crate::auth::redact;
use crate::error::Result;

/// Tokens produced by a successful authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    /// Absent when the provider does not reissue one.
    pub refresh_token: Option<String>,
}

/// Everything needed to run the interactive authorization.
#[derive(Debug, Clone)]
pub struct AuthorizationFlow {
    endpoint: TokenEndpoint,
    auth_url: String,
    redirect_uri: String,
    scope: String,
    open_browser: bool,
}

impl AuthorizationFlow {
    pub fn new(
        endpoint: TokenEndpoint,
        auth_url: impl Into<String>,
        redirect_uri: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            endpoint,
            auth_url: auth_url.into(),
            redirect_uri: redirect_uri.into(),
            scope: scope.into(),
            open_browser: true,
        }
    }

    /// Whether [`AuthorizationFlow::present`] launches the system browser.
    #[must_use]
    pub fn with_open_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }

    /// Generate fresh PKCE material, bind the redirect listener and build
    /// the authorization URL.
    pub async fn begin(&self) -> Result<PendingAuthorization> {
        let pkce = Pkce::generate();
        tracing::info!("Redirect URI: {}", self.redirect_uri);

        let listener = CallbackListener::bind(&self.redirect_uri).await?;
        let authorization_url = self.authorization_url(&pkce)?;

        Ok(PendingAuthorization {
            endpoint: self.endpoint.clone(),
            redirect_uri: self.redirect_uri.clone(),
            pkce,
            listener,
            authorization_url,
        })
    }

    /// Send the user to the authorization URL: open the browser, or print
    /// the URL when browser launch is disabled.
    pub fn present(&self, pending: &PendingAuthorization) {
        if let Ok(port) = pending.port() {
            tracing::debug!("Redirect listener bound on port {}", port);
        }

        if self.open_browser {
            pending.open_browser();
        } else {
            crate::output::print_info(&format!(
                "Open this URL in your browser to authorize:\n{}",
                pending.authorization_url()
            ));
        }
    }

    fn authorization_url(&self, pkce: &Pkce) -> Result<String> {
        let mut url = Url::parse(&self.auth_url)?;
        url.query_pairs_mut()
            .append_pair("scope", &self.scope)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("client_id", self.endpoint.client_id())
            .append_pair("state", &pkce.state)
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent")
            .append_pair("code_challenge", &pkce.challenge)
            .append_pair("code_challenge_method", CHALLENGE_METHOD);
        Ok(url.to_string())
    }
}

/// An authorization attempt whose listener is bound and waiting.
pub struct PendingAuthorization {
    endpoint: TokenEndpoint,
    redirect_uri: String,
    pkce: Pkce,
    listener: CallbackListener,
    authorization_url: String,
}

impl PendingAuthorization {
    /// URL the user has to visit.
    pub fn authorization_url(&self) -> &str {
        &self.authorization_url
    }

    /// Nonce the callback must echo back.
    pub fn state(&self) -> &str {
        &self.pkce.state
    }

    /// Port the redirect listener is bound to.
    pub fn port(&self) -> Result<u16> {
        self.listener.port()
    }

    /// Open the authorization URL in the default browser. Failure only
    /// means the user has to open it by hand.
    pub fn open_browser(&self) {
        if let Err(e) = open::that(&self.authorization_url) {
            tracing::warn!("Failed to open browser automatically: {}", e);
            crate::output::print_info(&format!(
                "Please open this URL in your browser:\n{}",
                self.authorization_url
            ));
        }
    }

    /// Wait for the callback, validate it and redeem the code.
    pub async fn complete(self, timeout: Option<Duration>) -> Result<TokenPair> {
        tracing::info!("Waiting for authorization callback...");
        let params = self.listener.accept_one(timeout).await?;

        let code = match params.validate(&self.pkce.state) {
            Ok(code) => code,
            Err(rejection) => {
                tracing::warn!("OAuth authorization rejected: {}", rejection);
                return Err(rejection.into());
            }
        };
        tracing::info!("Authorization code received: {}", redact(&code));

        let response = self
            .endpoint
            .exchange_code(&code, &self.pkce.verifier, &self.redirect_uri)
            .await?;
        if let Some(seconds) = response.expires_in {
            tracing::debug!("Access token expires in {} seconds", seconds);
        }

        Ok(TokenPair {
            access_token: response.access_token,
            refresh_token: response.refresh_token.filter(|t| !t.trim().is_empty()),
        })
    }
}
