//! Wiring of the token store, API client, index fetcher and downloader, and
//! the per-year download loop.

use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::api::PhotosApi;
use crate::auth::{
    AuthorizationFlow, FileSecretStorage, SecretStorage, TokenEndpoint, TokenState, TokenStore,
};
use crate::config::{Config, StorageBackend};
use crate::download::{DownloadOrchestrator, GlobalState};
use crate::error::{Error, Result};
use crate::fs::create_year_directory;
use crate::media::MediaIndexFetcher;
use crate::output::{print_batch_stats, print_error, print_info, print_success};

/// Keychain entry holding the refresh token.
#[cfg(feature = "keyring")]
const KEYRING_SERVICE: &str = "photos-downloader";
#[cfg(feature = "keyring")]
const KEYRING_USER: &str = "refresh_token";

/// Everything a run needs, built from the configuration.
pub struct App {
    config: Config,
    store: Arc<TokenStore>,
    flow: AuthorizationFlow,
    api: Arc<PhotosApi>,
}

impl App {
    pub fn from_config(config: Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Api(format!("Failed to create HTTP client: {}", e)))?;

        let google = &config.google;
        let endpoint = TokenEndpoint::new(
            client.clone(),
            &google.token_url,
            &google.client_id,
            &google.client_secret,
        );

        let storage = secret_storage(&config)?;
        tracing::debug!("Refresh token storage: {}", storage.describe());
        let store = Arc::new(TokenStore::new(storage, endpoint.clone()));

        let flow = AuthorizationFlow::new(
            endpoint,
            &google.auth_url,
            &google.redirect_uri,
            &google.scope,
        )
        .with_open_browser(config.options.open_browser);

        let api = Arc::new(PhotosApi::new(client, &google.api_base, Arc::clone(&store)));

        Ok(Self {
            config,
            store,
            flow,
            api,
        })
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Run the browser flow unless a refresh token is already stored.
    pub async fn ensure_authorized(&self, force: bool) -> Result<()> {
        let state = self.store.state().await;
        tracing::debug!("Token state: {}", state);

        if !force && state != TokenState::Unauthenticated {
            return Ok(());
        }

        let timeout = self
            .config
            .options
            .callback_timeout_seconds
            .map(Duration::from_secs);

        print_info("Authorization required, complete the sign-in in your browser");
        self.store.authorize(&self.flow, timeout).await?;

        if !self.store.is_active().await {
            return Err(Error::Unauthenticated);
        }

        print_success("Authorized");
        Ok(())
    }

    /// Forget the stored refresh token.
    pub async fn logout(&self) -> Result<()> {
        self.store.clear().await
    }

    /// Download every year in `years` into `<download_directory>/<year>`.
    pub async fn run_years(&self, years: RangeInclusive<i32>, show_stats: bool) -> GlobalState {
        let options = &self.config.options;

        let api: Arc<dyn crate::api::SearchApi> = self.api.clone();
        let fetcher = MediaIndexFetcher::new(api, Arc::clone(&self.store))
            .with_favorites_only(options.favorites_only);
        let orchestrator = DownloadOrchestrator::new(Arc::clone(&self.api))
            .with_concurrency(options.concurrency)
            .with_progress(options.show_progress);

        download_years(
            &fetcher,
            &orchestrator,
            &options.download_directory,
            years,
            show_stats,
        )
        .await
    }
}

/// Pick the refresh token backend.
fn secret_storage(config: &Config) -> Result<Box<dyn SecretStorage>> {
    match config.storage.backend {
        StorageBackend::File => Ok(Box::new(FileSecretStorage::new(config.token_file()))),
        #[cfg(feature = "keyring")]
        StorageBackend::Keyring => Ok(Box::new(crate::auth::KeyringSecretStorage::new(
            KEYRING_SERVICE,
            KEYRING_USER,
        ))),
        #[cfg(not(feature = "keyring"))]
        StorageBackend::Keyring => Err(Error::Config(
            "storage backend 'keyring' needs a build with the 'keyring' feature".to_string(),
        )),
    }
}

/// Fetch and download each year in turn. A failing year is reported and
/// the loop moves on to the next one.
pub async fn download_years(
    fetcher: &MediaIndexFetcher,
    orchestrator: &DownloadOrchestrator,
    root: &Path,
    years: RangeInclusive<i32>,
    show_stats: bool,
) -> GlobalState {
    let mut global = GlobalState::default();

    for year in years {
        tracing::info!("Starting {}", year);

        let directory = match create_year_directory(root, year) {
            Ok(directory) => directory,
            Err(e) => {
                print_error(&format!("Failed to create directory for {}: {}", year, e));
                global.mark_year_failed();
                continue;
            }
        };

        let items = match fetcher.fetch_year(year).await {
            Ok(items) => items,
            Err(e) => {
                print_error(&format!("Failed to list media for {}: {}", year, e));
                global.mark_year_failed();
                continue;
            }
        };
        tracing::info!("Found {} in {}", items.len(), year);

        let started = std::time::Instant::now();
        let report = orchestrator.download_all(&items, &directory).await;
        tracing::debug!(
            "Completed {} took {:.1} seconds",
            year,
            started.elapsed().as_secs_f64()
        );

        if show_stats {
            print_batch_stats(year, &report);
        }
        global.add_batch_stats(&report);
    }

    global
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use tempfile::TempDir;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::{SearchApi, SearchRequest, SearchResponse};
    use crate::auth::MemorySecretStorage;
    use crate::media::MediaItem;

    /// One page per year; years without an entry get a null page.
    struct YearlySearch {
        pages: HashMap<i32, Vec<MediaItem>>,
    }

    #[async_trait]
    impl SearchApi for YearlySearch {
        async fn search(&self, request: &SearchRequest) -> Result<Option<SearchResponse>> {
            let year = request.filters.date_filter.as_ref().unwrap().ranges[0]
                .start_date
                .year;
            Ok(self.pages.get(&year).map(|items| SearchResponse {
                media_items: items.clone(),
                next_page_token: None,
            }))
        }
    }

    fn active_store() -> Arc<TokenStore> {
        let storage = MemorySecretStorage::new();
        storage.save("1//refresh").unwrap();
        let endpoint = TokenEndpoint::new(Client::new(), "http://127.0.0.1:1/token", "id", "secret");
        Arc::new(TokenStore::new(Box::new(storage), endpoint))
    }

    #[tokio::test]
    async fn test_failed_year_does_not_stop_later_years() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pixels".to_vec()))
            .mount(&server)
            .await;

        let items = vec![
            MediaItem {
                id: "1".into(),
                filename: "one.jpg".into(),
                mime_type: "image/jpeg".into(),
                base_url: format!("{}/one", server.uri()),
                ..Default::default()
            },
            MediaItem {
                id: "2".into(),
                filename: "two.mp4".into(),
                mime_type: "video/mp4".into(),
                base_url: format!("{}/two", server.uri()),
                ..Default::default()
            },
        ];
        let search = Arc::new(YearlySearch {
            pages: HashMap::from([(2021, items)]),
        });

        let store = active_store();
        let api = Arc::new(PhotosApi::new(Client::new(), server.uri(), Arc::clone(&store)));
        let fetcher = MediaIndexFetcher::new(search, store);
        let orchestrator = DownloadOrchestrator::new(api);

        let root = TempDir::new().unwrap();
        let global = download_years(&fetcher, &orchestrator, root.path(), 2020..=2021, false).await;

        assert_eq!(global.years_failed, 1);
        assert_eq!(global.years_processed, 1);
        assert_eq!(global.pic_count, 1);
        assert_eq!(global.vid_count, 1);
        assert!(root.path().join("2021").join("one.jpg").is_file());
        assert!(root.path().join("2021").join("two.mp4").is_file());
        assert!(root.path().join("2020").is_dir());

        let requests = server.received_requests().await.unwrap();
        let mut paths: Vec<_> = requests.iter().map(|r| r.url.path().to_string()).collect();
        paths.sort();
        assert_eq!(paths, vec!["/one=d", "/two=dv"]);
    }

    #[tokio::test]
    async fn test_rerun_skips_existing_files() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pixels".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let search = Arc::new(YearlySearch {
            pages: HashMap::from([(
                2022,
                vec![MediaItem {
                    id: "1".into(),
                    filename: "one.jpg".into(),
                    base_url: format!("{}/one", server.uri()),
                    ..Default::default()
                }],
            )]),
        });
        let store = active_store();
        let api = Arc::new(PhotosApi::new(Client::new(), server.uri(), Arc::clone(&store)));
        let fetcher = MediaIndexFetcher::new(search, store);
        let orchestrator = DownloadOrchestrator::new(api);
        let root = TempDir::new().unwrap();

        let first = download_years(&fetcher, &orchestrator, root.path(), 2022..=2022, false).await;
        let second = download_years(&fetcher, &orchestrator, root.path(), 2022..=2022, false).await;

        assert_eq!(first.total_downloaded(), 1);
        assert_eq!(second.total_downloaded(), 0);
        assert_eq!(second.skipped_count, 1);
    }

    #[test]
    fn test_keyring_backend_selection() {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Keyring;
        let result = secret_storage(&config);
        if cfg!(feature = "keyring") {
            assert!(result.is_ok());
        } else {
            assert!(matches!(result, Err(Error::Config(_))));
        }
    }

    #[tokio::test]
    async fn test_already_authorized_skips_flow() {
        let dir = TempDir::new().unwrap();
        let token_file = dir.path().join("refresh.token");
        std::fs::write(&token_file, "1//stored").unwrap();

        let mut config = Config::default();
        config.storage.token_file = Some(token_file.clone());
        // Unservable redirect: reaching the flow would fail
        config.google.redirect_uri = "https://localhost:1/cb".into();

        let app = App::from_config(config).unwrap();
        app.ensure_authorized(false).await.unwrap();
        assert!(matches!(
            app.ensure_authorized(true).await,
            Err(Error::RedirectUri(_))
        ));

        app.logout().await.unwrap();
        assert!(!token_file.exists());
    }
}
