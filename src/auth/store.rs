//! Owner of the refresh/access token pair.

use std::fmt;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};

use crate::auth::endpoint::TokenEndpoint;
use crate::auth::flow::{AuthorizationFlow, PendingAuthorization};
use crate::auth::redact;
use crate::auth::storage::SecretStorage;
use crate::error::{Error, Result};

/// Where the store is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// No refresh token anywhere.
    Unauthenticated,
    /// Refresh token known, no access token derived yet.
    Authorized,
    /// Both tokens present.
    Active,
}

impl fmt::Display for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenState::Unauthenticated => write!(f, "unauthenticated"),
            TokenState::Authorized => write!(f, "authorized"),
            TokenState::Active => write!(f, "active"),
        }
    }
}

/// Holds the access token in memory and the refresh token in durable
/// storage. Only this type mutates or persists either value.
pub struct TokenStore {
    storage: Box<dyn SecretStorage>,
    endpoint: TokenEndpoint,
    access_token: RwLock<Option<String>>,
    refresh_token: RwLock<Option<String>>,
    // Serialises refresh-grant exchanges so concurrent callers share one.
    derive_lock: Mutex<()>,
}

impl TokenStore {
    pub fn new(storage: Box<dyn SecretStorage>, endpoint: TokenEndpoint) -> Self {
        Self {
            storage,
            endpoint,
            access_token: RwLock::new(None),
            refresh_token: RwLock::new(None),
            derive_lock: Mutex::new(()),
        }
    }

    /// True iff a non-empty refresh token is available, loading it from
    /// storage the first time.
    pub async fn is_active(&self) -> bool {
        self.current_refresh_token().await.is_some()
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> TokenState {
        if !self.is_active().await {
            TokenState::Unauthenticated
        } else if self.access_token.read().await.is_some() {
            TokenState::Active
        } else {
            TokenState::Authorized
        }
    }

    /// Where the refresh token is persisted.
    pub fn storage_location(&self) -> String {
        self.storage.describe()
    }

    /// The refresh token, if any.
    pub async fn refresh_token(&self) -> Option<String> {
        self.current_refresh_token().await
    }

    /// Return the cached access token or derive one from the refresh token.
    ///
    /// Callers are expected to check [`TokenStore::is_active`] first; with no
    /// refresh token this logs an error and returns `Error::Unauthenticated`.
    pub async fn get_access_token(&self) -> Result<String> {
        if let Some(token) = self.access_token.read().await.clone() {
            return Ok(token);
        }

        let _guard = self.derive_lock.lock().await;

        // Another caller may have finished the exchange while we waited.
        if let Some(token) = self.access_token.read().await.clone() {
            return Ok(token);
        }

        let Some(refresh_token) = self.current_refresh_token().await else {
            tracing::error!("No refresh token available, authorize first");
            return Err(Error::Unauthenticated);
        };

        let response = self.endpoint.refresh(&refresh_token).await?;
        if let Some(seconds) = response.expires_in {
            tracing::debug!("Derived access token expires in {} seconds", seconds);
        }
        self.set_access_token(&response.access_token).await;

        if let Some(rotated) = response.refresh_token.as_deref() {
            if rotated != refresh_token {
                self.set_refresh_token(rotated).await?;
            }
        }

        self.access_token.read().await.clone().ok_or_else(|| {
            Error::TokenExchange("token endpoint returned an empty access token".into())
        })
    }

    /// Cache an access token. Empty values are logged and ignored.
    pub async fn set_access_token(&self, value: &str) {
        if value.trim().is_empty() {
            tracing::error!("Access token is empty");
            return;
        }

        tracing::info!("Setting access token to {}", redact(value));
        *self.access_token.write().await = Some(value.to_string());
    }

    /// Store a refresh token, writing it through to durable storage before
    /// returning. Empty values are logged and ignored.
    pub async fn set_refresh_token(&self, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            tracing::error!("Refresh token is empty");
            return Ok(());
        }

        tracing::info!("Setting refresh token to {}", redact(value));
        self.storage.save(value)?;
        *self.refresh_token.write().await = Some(value.to_string());

        Ok(())
    }

    /// Run the interactive authorization flow and keep its tokens.
    ///
    /// Moves the store straight to [`TokenState::Active`].
    pub async fn authorize(
        &self,
        flow: &AuthorizationFlow,
        timeout: Option<Duration>,
    ) -> Result<()> {
        tracing::info!("Authorizing with Google");
        let pending = flow.begin().await?;
        flow.present(&pending);
        self.complete_authorization(pending, timeout).await
    }

    /// Wait for an already started authorization and keep its tokens.
    ///
    /// A response without a refresh token keeps the stored one. With nothing
    /// stored the attempt fails, since the next run could not sign in.
    pub async fn complete_authorization(
        &self,
        pending: PendingAuthorization,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let tokens = pending.complete(timeout).await?;

        match tokens.refresh_token.as_deref() {
            Some(refresh_token) => self.set_refresh_token(refresh_token).await?,
            None if self.is_active().await => {
                tracing::info!("Provider did not reissue a refresh token, keeping the stored one");
            }
            None => {
                return Err(Error::TokenExchange(
                    "the provider did not issue a refresh token. Remove this app under \
                     https://myaccount.google.com/permissions and run again with --reauthorize"
                        .to_string(),
                ));
            }
        }

        self.set_access_token(&tokens.access_token).await;
        Ok(())
    }

    /// Forget both tokens and remove the persisted refresh token.
    pub async fn clear(&self) -> Result<()> {
        self.storage.clear()?;
        *self.refresh_token.write().await = None;
        *self.access_token.write().await = None;
        tracing::info!("Removed stored refresh token from {}", self.storage.describe());
        Ok(())
    }

    async fn current_refresh_token(&self) -> Option<String> {
        if let Some(token) = self.refresh_token.read().await.clone() {
            return Some(token);
        }

        match self.storage.load() {
            Ok(Some(token)) => {
                tracing::info!(
                    "Using cached refresh token {} from {}",
                    redact(&token),
                    self.storage.describe()
                );
                *self.refresh_token.write().await = Some(token.clone());
                Some(token)
            }
            Ok(None) => {
                tracing::warn!("No cached refresh token");
                None
            }
            Err(e) => {
                tracing::error!("Failed to load refresh token: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::Client;
    use tempfile::TempDir;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::storage::{FileSecretStorage, MemorySecretStorage};

    fn endpoint(url: &str) -> TokenEndpoint {
        TokenEndpoint::new(Client::new(), format!("{}/token", url), "id", "secret")
    }

    fn offline_store(storage: Box<dyn SecretStorage>) -> TokenStore {
        TokenStore::new(storage, endpoint("http://127.0.0.1:1"))
    }

    #[tokio::test]
    async fn test_inactive_until_refresh_token_set() {
        let store = offline_store(Box::new(MemorySecretStorage::new()));
        assert!(!store.is_active().await);
        assert_eq!(store.state().await, TokenState::Unauthenticated);

        store.set_refresh_token("1//refresh-token-value").await.unwrap();
        assert!(store.is_active().await);
        assert_eq!(store.state().await, TokenState::Authorized);
    }

    #[tokio::test]
    async fn test_active_survives_restart() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("refresh.token");

        let first = offline_store(Box::new(FileSecretStorage::new(&path)));
        assert!(!first.is_active().await);
        first.set_refresh_token("1//persisted").await.unwrap();
        drop(first);

        let second = offline_store(Box::new(FileSecretStorage::new(&path)));
        assert!(second.is_active().await);
        assert_eq!(second.refresh_token().await.as_deref(), Some("1//persisted"));
    }

    #[tokio::test]
    async fn test_empty_refresh_token_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("refresh.token");
        let store = offline_store(Box::new(FileSecretStorage::new(&path)));

        store.set_refresh_token("").await.unwrap();
        store.set_refresh_token("   ").await.unwrap();
        assert!(!store.is_active().await);
        assert!(!path.exists());

        store.set_refresh_token("1//kept").await.unwrap();
        store.set_refresh_token("  ").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1//kept");
        assert_eq!(store.refresh_token().await.as_deref(), Some("1//kept"));
    }

    #[tokio::test]
    async fn test_empty_access_token_ignored() {
        let store = offline_store(Box::new(MemorySecretStorage::new()));
        store.set_access_token("ya29.first").await;
        store.set_access_token(" ").await;
        assert_eq!(store.get_access_token().await.unwrap(), "ya29.first");
    }

    #[tokio::test]
    async fn test_get_access_token_without_refresh_token() {
        let store = offline_store(Box::new(MemorySecretStorage::new()));
        assert!(matches!(
            store.get_access_token().await,
            Err(Error::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_derives_access_token_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access_token": "ya29.derived" }))
                    .set_delay(Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let storage = MemorySecretStorage::new();
        storage.save("1//refresh").unwrap();
        let store = Arc::new(TokenStore::new(Box::new(storage), endpoint(&server.uri())));
        assert_eq!(store.state().await, TokenState::Authorized);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.get_access_token().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "ya29.derived");
        }
        assert_eq!(store.state().await, TokenState::Active);
    }

    #[tokio::test]
    async fn test_rotated_refresh_token_persisted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.new",
                "refresh_token": "1//rotated"
            })))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("refresh.token");
        std::fs::write(&path, "1//old").unwrap();

        let store = TokenStore::new(
            Box::new(FileSecretStorage::new(&path)),
            endpoint(&server.uri()),
        );
        assert_eq!(store.get_access_token().await.unwrap(), "ya29.new");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1//rotated");
    }

    async fn authorize_with_response(store: &TokenStore, server: &MockServer, body: serde_json::Value) -> Result<()> {
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;

        let flow = AuthorizationFlow::new(
            endpoint(&server.uri()),
            "https://accounts.example.com/auth",
            "http://127.0.0.1:0/cb",
            "scope",
        )
        .with_open_browser(false);
        let pending = flow.begin().await.unwrap();
        let callback = format!(
            "http://127.0.0.1:{}/cb?code=auth-code&state={}",
            pending.port().unwrap(),
            pending.state()
        );

        let (result, _) = tokio::join!(
            store.complete_authorization(pending, Some(Duration::from_secs(5))),
            reqwest::get(callback)
        );
        result
    }

    #[tokio::test]
    async fn test_authorize_goes_straight_to_active() {
        let server = MockServer::start().await;
        let store = TokenStore::new(Box::new(MemorySecretStorage::new()), endpoint(&server.uri()));
        assert_eq!(store.state().await, TokenState::Unauthenticated);

        authorize_with_response(
            &store,
            &server,
            serde_json::json!({ "access_token": "ya29.fresh", "refresh_token": "1//fresh" }),
        )
        .await
        .unwrap();

        assert_eq!(store.state().await, TokenState::Active);
        assert_eq!(store.refresh_token().await.as_deref(), Some("1//fresh"));
        assert_eq!(store.get_access_token().await.unwrap(), "ya29.fresh");
    }

    #[tokio::test]
    async fn test_authorize_keeps_stored_refresh_token() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("refresh.token");
        std::fs::write(&path, "1//stored").unwrap();
        let store = TokenStore::new(Box::new(FileSecretStorage::new(&path)), endpoint(&server.uri()));

        authorize_with_response(&store, &server, serde_json::json!({ "access_token": "ya29.only" }))
            .await
            .unwrap();

        assert_eq!(store.state().await, TokenState::Active);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1//stored");
    }

    #[tokio::test]
    async fn test_authorize_without_any_refresh_token_fails() {
        let server = MockServer::start().await;
        let store = TokenStore::new(Box::new(MemorySecretStorage::new()), endpoint(&server.uri()));

        let result =
            authorize_with_response(&store, &server, serde_json::json!({ "access_token": "ya29.only" }))
                .await;

        match result {
            Err(Error::TokenExchange(message)) => assert!(message.contains("--reauthorize")),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(store.state().await, TokenState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("refresh.token");
        let store = offline_store(Box::new(FileSecretStorage::new(&path)));
        store.set_refresh_token("1//gone").await.unwrap();
        store.set_access_token("ya29.gone").await;

        store.clear().await.unwrap();
        assert!(!path.exists());
        assert!(!store.is_active().await);
    }
}
