//! Token endpoint client for the authorization-code and refresh grants.

use reqwest::Client;
use serde::Deserialize;

use crate::auth::redact;
use crate::error::{Error, Result};

/// Token endpoint response. Only `access_token` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// OAuth client credentials plus the token endpoint URL.
#[derive(Debug, Clone)]
pub struct TokenEndpoint {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl TokenEndpoint {
    pub fn new(
        client: Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Redeem an authorization code. The verifier, never the challenge,
    /// goes with the exchange.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse> {
        tracing::info!("Exchanging authorization code for tokens...");

        let params = [
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code_verifier", code_verifier),
            ("grant_type", "authorization_code"),
        ];

        self.post(&params).await
    }

    /// Derive a new access token from a refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        tracing::info!(
            "Using refresh token {} to get a new access token",
            redact(refresh_token)
        );

        let params = [
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ];

        self.post(&params).await
    }

    async fn post(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .client
            .post(&self.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| Error::TokenExchange(format!("request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::TokenExchange(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            tracing::error!("Token endpoint returned HTTP {}: {}", status, text);
            return Err(Error::TokenExchange(format!("HTTP {}: {}", status, text)));
        }

        serde_json::from_str(&text).map_err(|e| {
            Error::TokenExchange(format!("failed to parse token response: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn endpoint(server: &MockServer) -> TokenEndpoint {
        TokenEndpoint::new(
            Client::new(),
            format!("{}/token", server.uri()),
            "client-id",
            "client-secret",
        )
    }

    #[tokio::test]
    async fn test_exchange_code_sends_verifier() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code_verifier=the-verifier"))
            .and(body_string_contains("client_secret=client-secret"))
            .and(body_string_contains("code=the-code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.access",
                "refresh_token": "1//refresh",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = endpoint(&server)
            .exchange_code("the-code", "the-verifier", "http://localhost:5007/cb")
            .await
            .unwrap();

        assert_eq!(tokens.access_token, "ya29.access");
        assert_eq!(tokens.refresh_token.as_deref(), Some("1//refresh"));
        assert_eq!(tokens.expires_in, Some(3599));
    }

    #[tokio::test]
    async fn test_refresh_token_optional() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access_token": "ya29.only" })),
            )
            .mount(&server)
            .await;

        let tokens = endpoint(&server).refresh("1//refresh").await.unwrap();
        assert_eq!(tokens.access_token, "ya29.only");
        assert!(tokens.refresh_token.is_none());
    }

    #[tokio::test]
    async fn test_protocol_error_surfaces_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#))
            .mount(&server)
            .await;

        let err = endpoint(&server).refresh("revoked").await.unwrap_err();
        match err {
            Error::TokenExchange(message) => assert!(message.contains("invalid_grant")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_access_token_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token_type": "Bearer" })),
            )
            .mount(&server)
            .await;

        assert!(matches!(
            endpoint(&server).refresh("r").await,
            Err(Error::TokenExchange(_))
        ));
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let endpoint = TokenEndpoint::new(Client::new(), "http://127.0.0.1:1/token", "id", "secret");
        assert!(matches!(
            endpoint.exchange_code("c", "v", "http://localhost/cb").await,
            Err(Error::TokenExchange(_))
        ));
    }
}
