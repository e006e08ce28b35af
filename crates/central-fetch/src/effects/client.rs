use std::sync::Arc;

use bytes::Bytes;
use central_query::{Coordinate, FetchRequest, Page, Query, QueryError};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use super::cache::ResponseCache;
use super::http::HttpClient;
use super::iterator::PagedIterator;
use super::limiter::RateLimiter;
use super::transport::Transport;
use crate::data::{ClientConfig, OperationClass};
use crate::error::{FetchError, Result};

struct Inner<C> {
    transport: Transport<C>,
    config: ClientConfig,
    search_url: Url,
    file_url: Url,
}

/// Entry point for searching the catalog and downloading files from it.
///
/// Cloning is cheap: clones share one HTTP client, one [`ResponseCache`] and
/// one [`RateLimiter`]. Separately constructed clients share nothing unless
/// built with [`CatalogClient::with_shared`].
pub struct CatalogClient<C> {
    inner: Arc<Inner<C>>,
}

impl<C> Clone for CatalogClient<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(feature = "reqwest")]
impl CatalogClient<super::http::ReqwestClient> {
    /// Build a client backed by `reqwest` with its own cache and limiter.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let http = super::http::ReqwestClient::new(&config)?;
        Self::new(http, config)
    }
}

impl<C: HttpClient> CatalogClient<C> {
    /// Build a client over `http` with a fresh cache and limiter.
    pub fn new(http: C, config: ClientConfig) -> Result<Self> {
        let cache = Arc::new(ResponseCache::new());
        let limiter = Arc::new(RateLimiter::new(config.rate.clone()));
        Self::with_shared(http, config, cache, limiter)
    }

    /// Build a client that uses the given cache and limiter instances.
    ///
    /// The limiter's own settings apply; `config.rate` is ignored.
    pub fn with_shared(
        http: C,
        config: ClientConfig,
        cache: Arc<ResponseCache>,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self> {
        let search_url = parse_base(&config.search_url)?;
        let mut file_url = parse_base(&config.file_url)?;
        if !file_url.path().ends_with('/') {
            let path = format!("{}/", file_url.path());
            file_url.set_path(&path);
        }

        let transport = Transport::new(
            http,
            cache,
            limiter,
            config.retry.clone(),
            config.cache.clone(),
        );

        Ok(Self {
            inner: Arc::new(Inner {
                transport,
                config,
                search_url,
                file_url,
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig { &self.inner.config }

    pub fn cache(&self) -> &Arc<ResponseCache> { self.inner.transport.cache() }

    pub fn limiter(&self) -> &Arc<RateLimiter> { self.inner.transport.limiter() }

    /// Drop every cached response.
    pub fn clear_cache(&self) { self.cache().clear() }

    /// The exact URL a search request is sent to. Also its cache key.
    pub fn search_url(&self, request: &FetchRequest) -> Url {
        request.to_url(&self.inner.search_url)
    }

    /// The URL a repository path is downloaded from.
    pub fn file_url(&self, path: &str) -> Result<Url> {
        self.inner
            .file_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| FetchError::InvalidRequest(format!("bad file path `{path}`: {e}")))
    }

    /// Fetch one page of search results.
    ///
    /// # Errors
    ///
    /// Fails with [`FetchError::InvalidRequest`] for a zero page size, with
    /// an HTTP-derived kind once retries are spent, or with
    /// [`FetchError::Decode`] / [`FetchError::Api`] for unusable bodies.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        request: &FetchRequest,
        cancel: &CancellationToken,
    ) -> Result<Page<T>> {
        request.validate()?;
        let url = self.search_url(request);
        let page: Page<T> = self
            .inner
            .transport
            .get_decoded(&url, url.as_str(), OperationClass::Search, cancel, |body| {
                Ok(Page::from_json(body)?)
            })
            .await?;

        debug!(
            url = %url,
            num_found = page.num_found,
            docs = page.docs.len(),
            "search page decoded"
        );
        Ok(page)
    }

    /// Lazily walk every result of `request`, starting at its `start`.
    ///
    /// No I/O happens until the iterator is first polled.
    pub fn iterate<T: DeserializeOwned>(&self, request: FetchRequest) -> PagedIterator<T, C> {
        PagedIterator::new(self.clone(), request)
    }

    /// Total number of documents matching `query`.
    pub async fn count(&self, query: &Query, cancel: &CancellationToken) -> Result<u64> {
        let request = FetchRequest::new(query.clone()).rows(1);
        let page: Page<serde_json::Value> = self.fetch(&request, cancel).await?;
        Ok(page.num_found)
    }

    /// Download the file a coordinate points at.
    ///
    /// # Errors
    ///
    /// [`FetchError::InvalidRequest`] without any I/O when a part of the
    /// coordinate is not a usable path segment.
    pub async fn download(
        &self,
        coordinate: &Coordinate,
        cancel: &CancellationToken,
    ) -> Result<Bytes> {
        coordinate.validate()?;
        self.download_path(&coordinate.path(), cancel).await
    }

    /// Download a file by its path relative to the repository root.
    ///
    /// The path is also the cache key.
    pub async fn download_path(&self, path: &str, cancel: &CancellationToken) -> Result<Bytes> {
        let url = self.file_url(path)?;
        self.inner
            .transport
            .get(&url, path, OperationClass::Download, cancel)
            .await
    }
}

fn parse_base(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| QueryError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(QueryError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: "not a hierarchical URL".to_string(),
        }
        .into());
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use central_query::ArtifactDoc;

    use super::*;
    use crate::data::{RateSettings, RetryPolicy};
    use crate::effects::mock::{MockClient, solr_page};

    fn config() -> ClientConfig {
        ClientConfig::default()
            .search_url("http://search.test/solrsearch/select")
            .file_url("http://repo.test/maven2")
            .retry(RetryPolicy::none())
            .rate(RateSettings {
                search: 0.0,
                download: 0.0,
                default: 0.0,
                statistics: false,
            })
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = CatalogClient::new(
            MockClient::fixed(200, ""),
            config().search_url("not a url"),
        );
        assert!(matches!(result, Err(FetchError::InvalidRequest(_))));

        let result = CatalogClient::new(
            MockClient::fixed(200, ""),
            config().file_url("mailto:someone@example.org"),
        );
        assert!(matches!(result, Err(FetchError::InvalidRequest(_))));
    }

    #[test]
    fn test_file_urls_keep_the_base_path() {
        let client = CatalogClient::new(MockClient::fixed(200, ""), config()).unwrap();
        let url = client.file_url("/org/x/y/1.0/y-1.0.jar").unwrap();
        assert_eq!(url.as_str(), "http://repo.test/maven2/org/x/y/1.0/y-1.0.jar");
    }

    #[tokio::test]
    async fn test_fetch_decodes_page() {
        let mock = MockClient::fixed(200, r#"{
            "responseHeader": {"status": 0, "QTime": 2},
            "response": {"numFound": 1, "start": 0, "docs": [
                {"id": "com.google.inject:guice:7.0.0", "g": "com.google.inject",
                 "a": "guice", "v": "7.0.0", "p": "jar", "timestamp": 1}
            ]}
        }"#);
        let client = CatalogClient::new(mock.clone(), config()).unwrap();
        let token = CancellationToken::new();

        let request = FetchRequest::new(Query::new().field("a", "guice")).rows(5);
        let page: Page<ArtifactDoc> = client.fetch(&request, &token).await.unwrap();

        assert_eq!(page.num_found, 1);
        assert_eq!(page.docs[0].artifact, "guice");
        assert_eq!(mock.call_count(), 1);
        assert!(mock.calls()[0].starts_with("http://search.test/solrsearch/select?q=a%3Aguice"));
    }

    #[tokio::test]
    async fn test_fetch_rejects_zero_rows_without_io() {
        let mock = MockClient::fixed(200, "{}");
        let client = CatalogClient::new(mock.clone(), config()).unwrap();
        let token = CancellationToken::new();

        let request = FetchRequest::new(Query::new()).rows(0);
        let result: Result<Page<ArtifactDoc>> = client.fetch(&request, &token).await;

        assert!(matches!(result, Err(FetchError::InvalidRequest(_))));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_api_error_body_is_permanent() {
        let mock = MockClient::fixed(
            200,
            r#"{"responseHeader":{"status":400},"error":{"msg":"undefined field zz","code":400}}"#,
        );
        let client = CatalogClient::new(
            mock.clone(),
            config().retry(RetryPolicy::default().initial_backoff(Duration::ZERO)),
        )
        .unwrap();
        let token = CancellationToken::new();

        let result: Result<Page<ArtifactDoc>> = client
            .fetch(&FetchRequest::new(Query::raw("zz:1")), &token)
            .await;

        assert!(matches!(result, Err(FetchError::Api { code: Some(400), .. })));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_error_body_is_not_replayed_from_cache() {
        let mock = MockClient::new(|_, n| {
            Ok(crate::effects::http::HttpResponse::new(
                200,
                match n {
                    0 => r#"{"error":{"msg":"overloaded","code":500}}"#.to_string(),
                    _ => solr_page(1, 0, [0]),
                },
            ))
        });
        let client = CatalogClient::new(mock.clone(), config()).unwrap();
        let token = CancellationToken::new();
        let request = FetchRequest::new(Query::raw("g:org.x"));

        let first: Result<Page<serde_json::Value>> = client.fetch(&request, &token).await;
        assert!(matches!(first, Err(FetchError::Api { code: Some(500), .. })));
        assert!(client.cache().is_empty());

        let second: Page<serde_json::Value> = client.fetch(&request, &token).await.unwrap();
        assert_eq!(second.num_found, 1);
        assert_eq!(mock.call_count(), 2);

        // Only the good page was stored; a third fetch is a cache hit.
        client.fetch::<serde_json::Value>(&request, &token).await.unwrap();
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_count_reads_num_found() {
        let mock = MockClient::new(|_, _| {
            Ok(crate::effects::http::HttpResponse::new(200, solr_page(42, 0, [0])))
        });
        let client = CatalogClient::new(mock.clone(), config()).unwrap();
        let token = CancellationToken::new();

        let total = client.count(&Query::new().field("g", "org.x"), &token).await.unwrap();
        assert_eq!(total, 42);
        assert!(mock.calls()[0].contains("rows=1"));
    }

    #[tokio::test]
    async fn test_download_uses_path_as_cache_key() {
        let mock = MockClient::fixed(200, "PK\x03\x04");
        let client = CatalogClient::new(mock.clone(), config()).unwrap();
        let token = CancellationToken::new();
        let coordinate = Coordinate::new("org.x", "y", "1.0");

        let first = client.download(&coordinate, &token).await.unwrap();
        let second = client.download(&coordinate, &token).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(mock.calls(), vec!["http://repo.test/maven2/org/x/y/1.0/y-1.0.jar"]);
        assert!(client.cache().get("org/x/y/1.0/y-1.0.jar").is_some());

        client.clear_cache();
        client.download(&coordinate, &token).await.unwrap();
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_download_rejects_traversal_without_io() {
        let mock = MockClient::fixed(200, "secret");
        let client = CatalogClient::new(mock.clone(), config()).unwrap();
        let token = CancellationToken::new();

        let result = client.download(&Coordinate::new("g", "..", ".."), &token).await;
        assert!(matches!(result, Err(FetchError::InvalidRequest(_))));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_clones_share_cache() {
        let mock = MockClient::fixed(200, "bytes");
        let client = CatalogClient::new(mock.clone(), config()).unwrap();
        let clone = client.clone();
        let token = CancellationToken::new();

        client.download_path("a/b.pom", &token).await.unwrap();
        clone.download_path("a/b.pom", &token).await.unwrap();

        assert_eq!(mock.call_count(), 1);
        assert!(Arc::ptr_eq(client.cache(), clone.cache()));
    }

    #[tokio::test]
    async fn test_separate_clients_share_only_when_injected() {
        let cache = Arc::new(ResponseCache::new());
        let limiter = Arc::new(RateLimiter::new(config().rate));
        let mock = MockClient::fixed(200, "bytes");
        let token = CancellationToken::new();

        let a = CatalogClient::with_shared(
            mock.clone(),
            config(),
            Arc::clone(&cache),
            Arc::clone(&limiter),
        )
        .unwrap();
        let b = CatalogClient::with_shared(mock.clone(), config(), cache, limiter).unwrap();
        a.download_path("x.jar", &token).await.unwrap();
        b.download_path("x.jar", &token).await.unwrap();
        assert_eq!(mock.call_count(), 1);

        let c = CatalogClient::new(mock.clone(), config()).unwrap();
        c.download_path("x.jar", &token).await.unwrap();
        assert_eq!(mock.call_count(), 2);
    }
}
