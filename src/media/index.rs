//! Cursor-paginated walk over the library search endpoint.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::api::{SearchApi, SearchRequest};
use crate::auth::TokenStore;
use crate::error::{Error, Result};
use crate::media::MediaItem;

/// Items requested per page. The endpoint allows up to 100.
pub const PAGE_SIZE: u32 = 25;

/// Collects every item in a date range, one page at a time.
pub struct MediaIndexFetcher {
    api: Arc<dyn SearchApi>,
    store: Arc<TokenStore>,
    favorites_only: bool,
}

impl MediaIndexFetcher {
    pub fn new(api: Arc<dyn SearchApi>, store: Arc<TokenStore>) -> Self {
        Self {
            api,
            store,
            favorites_only: false,
        }
    }

    /// Only return items the user marked as favourite.
    #[must_use]
    pub fn with_favorites_only(mut self, favorites_only: bool) -> Self {
        self.favorites_only = favorites_only;
        self
    }

    /// Every item created from `start` to `end` inclusive, in provider order.
    ///
    /// Each call walks from the first page again. Pages are requested one
    /// after another since each cursor comes from the previous response. A
    /// missing page object fails the whole call and nothing collected so far
    /// is returned.
    pub async fn fetch_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MediaItem>> {
        tracing::debug!("Fetching media items from {} to {}", start, end);

        if !self.store.is_active().await {
            tracing::error!("Need an access token first");
            return Err(Error::Unauthenticated);
        }

        let mut items = Vec::new();
        let mut cursor = String::new();
        let mut pages = 0usize;

        loop {
            tracing::trace!("Requesting page with token '{}'", cursor);
            let request =
                SearchRequest::date_range(start, end, PAGE_SIZE, &cursor, self.favorites_only);

            let page = self.api.search(&request).await?.ok_or_else(|| {
                Error::IndexFetch(format!(
                    "search returned no response for page {}",
                    pages + 1
                ))
            })?;
            pages += 1;

            tracing::debug!("Adding {} items to result set", page.media_items.len());
            items.extend(page.media_items);

            match page.next_page_token {
                Some(token) if !token.is_empty() => cursor = token,
                _ => break,
            }
        }

        tracing::info!(
            "Found {} items between {} and {} ({} pages)",
            items.len(),
            start,
            end,
            pages
        );

        Ok(items)
    }

    /// Every item created in a calendar year.
    pub async fn fetch_year(&self, year: i32) -> Result<Vec<MediaItem>> {
        let (start, end) = year_bounds(year)?;
        self.fetch_by_date_range(start, end).await
    }
}

/// First and last day of a year.
pub fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let end = NaiveDate::from_ymd_opt(year, 12, 31);

    start
        .zip(end)
        .ok_or_else(|| Error::Config(format!("year {} is out of range", year)))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use reqwest::Client;

    use super::*;
    use crate::api::SearchResponse;
    use crate::auth::{MemorySecretStorage, TokenEndpoint};

    /// Replays canned pages and records the cursors it was asked for.
    struct ScriptedSearch {
        pages: Mutex<VecDeque<Option<SearchResponse>>>,
        cursors: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedSearch {
        fn new(pages: Vec<Option<SearchResponse>>) -> Arc<Self> {
            Arc::new(Self {
                pages: Mutex::new(pages.into()),
                cursors: Mutex::new(Vec::new()),
            })
        }

        fn cursors(&self) -> Vec<Option<String>> {
            self.cursors.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SearchApi for ScriptedSearch {
        async fn search(&self, request: &SearchRequest) -> Result<Option<SearchResponse>> {
            self.cursors.lock().unwrap().push(request.page_token.clone());
            Ok(self
                .pages
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected extra page request"))
        }
    }

    fn page(prefix: &str, count: usize, next: Option<&str>) -> Option<SearchResponse> {
        Some(SearchResponse {
            media_items: (0..count)
                .map(|i| MediaItem {
                    id: format!("{}-{}", prefix, i),
                    filename: format!("{}-{}.jpg", prefix, i),
                    ..Default::default()
                })
                .collect(),
            next_page_token: next.map(str::to_string),
        })
    }

    async fn active_store() -> Arc<TokenStore> {
        let storage = MemorySecretStorage::new();
        crate::auth::SecretStorage::save(&storage, "1//refresh").unwrap();
        let endpoint = TokenEndpoint::new(Client::new(), "http://127.0.0.1:1/token", "id", "secret");
        Arc::new(TokenStore::new(Box::new(storage), endpoint))
    }

    #[tokio::test]
    async fn test_walks_all_pages_in_order() {
        let api = ScriptedSearch::new(vec![
            page("a", 25, Some("p1")),
            page("b", 25, Some("p2")),
            page("c", 7, Some("")),
        ]);
        let fetcher = MediaIndexFetcher::new(api.clone(), active_store().await);

        let items = fetcher.fetch_year(2019).await.unwrap();

        assert_eq!(items.len(), 57);
        assert_eq!(items[0].id, "a-0");
        assert_eq!(items[25].id, "b-0");
        assert_eq!(items[56].id, "c-6");
        assert_eq!(
            api.cursors(),
            vec![None, Some("p1".to_string()), Some("p2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_absent_token_ends_walk() {
        let api = ScriptedSearch::new(vec![page("a", 3, None)]);
        let fetcher = MediaIndexFetcher::new(api.clone(), active_store().await);

        assert_eq!(fetcher.fetch_year(2020).await.unwrap().len(), 3);
        assert_eq!(api.cursors().len(), 1);
    }

    #[tokio::test]
    async fn test_unauthenticated_makes_no_calls() {
        let api = ScriptedSearch::new(vec![]);
        let endpoint = TokenEndpoint::new(Client::new(), "http://127.0.0.1:1/token", "id", "secret");
        let store = Arc::new(TokenStore::new(Box::new(MemorySecretStorage::new()), endpoint));
        let fetcher = MediaIndexFetcher::new(api.clone(), store);

        assert!(matches!(
            fetcher.fetch_year(2020).await,
            Err(Error::Unauthenticated)
        ));
        assert!(api.cursors().is_empty());
    }

    #[tokio::test]
    async fn test_null_page_discards_everything() {
        let api = ScriptedSearch::new(vec![page("a", 25, Some("p1")), None]);
        let fetcher = MediaIndexFetcher::new(api.clone(), active_store().await);

        assert!(matches!(
            fetcher.fetch_year(2021).await,
            Err(Error::IndexFetch(_))
        ));
        assert_eq!(api.cursors().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicates_kept() {
        let api = ScriptedSearch::new(vec![page("a", 2, Some("p1")), page("a", 2, None)]);
        let fetcher = MediaIndexFetcher::new(api, active_store().await);

        let ids: Vec<_> = fetcher
            .fetch_year(2021)
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.id)
            .collect();
        assert_eq!(ids, vec!["a-0", "a-1", "a-0", "a-1"]);
    }

    #[test]
    fn test_year_bounds() {
        let (start, end) = year_bounds(2024).unwrap();
        assert_eq!(start.to_string(), "2024-01-01");
        assert_eq!(end.to_string(), "2024-12-31");
    }
}
