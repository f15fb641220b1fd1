//! Google Photos Library API HTTP client.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};

use crate::api::authenticator::RequestAuthenticator;
use crate::api::types::{SearchRequest, SearchResponse};
use crate::auth::TokenStore;
use crate::error::{Error, Result};

/// Library API base URL.
pub const API_BASE: &str = "https://photoslibrary.googleapis.com";

/// Largest page the search endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Credential the authenticator swaps out before a request is sent.
const PLACEHOLDER_CREDENTIAL: &str = "pending";

/// Paginated search over the user's library.
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// Fetch one page. `Ok(None)` means the API answered with no page object.
    async fn search(&self, request: &SearchRequest) -> Result<Option<SearchResponse>>;
}

/// Library API client. Every bearer-scoped call passes through the
/// [`RequestAuthenticator`].
#[derive(Clone)]
pub struct PhotosApi {
    client: Client,
    api_base: String,
    authenticator: RequestAuthenticator,
}

impl PhotosApi {
    pub fn new(client: Client, api_base: impl Into<String>, store: Arc<TokenStore>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            authenticator: RequestAuthenticator::new(store),
        }
    }

    /// Build, authenticate and send a request.
    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let request = builder.build()?;
        let request = self.authenticator.authenticate(request).await;

        tracing::debug!("{} {}", request.method(), request.url());
        let response = self.client.execute(request).await?;
        tracing::debug!("Response status: {}", response.status());

        Ok(response)
    }

    /// POST `/v1/mediaItems:search`.
    pub async fn search_media_items(
        &self,
        request: &SearchRequest,
    ) -> Result<Option<SearchResponse>> {
        let url = format!("{}/v1/mediaItems:search", self.api_base);
        let builder = self
            .client
            .post(&url)
            .bearer_auth(PLACEHOLDER_CREDENTIAL)
            .json(request);

        let response = self.send(builder).await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::error!("Search failed with HTTP {}: {}", status, text);
            return Err(Error::Api(format!("HTTP {}: {}", status, text)));
        }

        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str::<Option<SearchResponse>>(&text).map_err(|e| {
            Error::Api(format!(
                "Failed to parse search response: {} - Response: {}",
                e,
                excerpt(&text, 500)
            ))
        })
    }

    /// GET a signed content URL. These URLs need no bearer token, so the
    /// request carries no authorization header.
    pub async fn fetch_content(&self, url: &str) -> Result<Response> {
        let response = self.send(self.client.get(url)).await?;

        if !response.status().is_success() {
            return Err(Error::Download(format!(
                "Failed to download file: HTTP {}",
                response.status()
            )));
        }

        Ok(response)
    }
}

/// At most `max_chars` characters of a response body, for error messages.
fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[async_trait]
impl SearchApi for PhotosApi {
    async fn search(&self, request: &SearchRequest) -> Result<Option<SearchResponse>> {
        self.search_media_items(request).await
    }
}
