//! One logical GET: cache, then rate limit and retry around the wire call.

use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use super::cache::ResponseCache;
use super::http::HttpClient;
use super::limiter::RateLimiter;
use super::retry::with_retry;
use crate::core::destination_of;
use crate::data::{CacheSettings, OperationClass, RetryPolicy};
use crate::error::{FetchError, Result};

// Longest slice of an error body kept as detail.
const DETAIL_LIMIT: usize = 256;

/// Composes the cache, limiter and retry loop over an [`HttpClient`].
///
/// Every attempt, retries included, goes through the limiter. Only successful
/// bodies that decode are cached.
pub struct Transport<C> {
    client: C,
    cache: Arc<ResponseCache>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    cache_settings: CacheSettings,
}

impl<C: HttpClient> Transport<C> {
    pub fn new(
        client: C,
        cache: Arc<ResponseCache>,
        limiter: Arc<RateLimiter>,
        retry: RetryPolicy,
        cache_settings: CacheSettings,
    ) -> Self {
        Self {
            client,
            cache,
            limiter,
            retry,
            cache_settings,
        }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> { &self.cache }

    pub fn limiter(&self) -> &Arc<RateLimiter> { &self.limiter }

    /// Fetch `url`, serving and storing the body under `cache_key`.
    pub async fn get(
        &self,
        url: &Url,
        cache_key: &str,
        class: OperationClass,
        cancel: &CancellationToken,
    ) -> Result<Bytes> {
        self.get_decoded(url, cache_key, class, cancel, |body| Ok(body.clone()))
            .await
    }

    /// Like [`get`](Self::get), but the body is stored only once `decode`
    /// accepts it. A decode failure is returned as is and never retried.
    pub async fn get_decoded<T>(
        &self,
        url: &Url,
        cache_key: &str,
        class: OperationClass,
        cancel: &CancellationToken,
        decode: impl FnOnce(&Bytes) -> Result<T>,
    ) -> Result<T> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        if self.cache_settings.enabled
            && let Some(body) = self.cache.get(cache_key)
        {
            return decode(&body);
        }

        let destination = destination_of(url);
        let destination = destination.as_str();
        let headers = request_headers(class);
        let headers = headers.as_slice();

        let body = with_retry(&self.retry, cancel, |attempt| async move {
            self.limiter.acquire(destination, class, cancel).await?;
            debug!(url = %url, attempt, %class, "sending request");

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                response = self.client.get(url.as_str(), headers) => {
                    response.map_err(Into::<FetchError>::into)?
                }
            };

            if !response.is_success() {
                debug!(url = %url, status = response.status, "request failed");
                return Err(FetchError::from_status(
                    response.status,
                    error_detail(&response.body),
                ));
            }
            Ok(response.body)
        })
        .await?;

        let value = decode(&body)?;
        if self.cache_settings.enabled {
            self.cache.put(cache_key, body, self.cache_settings.ttl());
        }
        Ok(value)
    }
}

fn request_headers(class: OperationClass) -> Vec<(String, String)> {
    match class {
        OperationClass::Search => vec![("Accept".to_string(), "application/json".to_string())],
        OperationClass::Download | OperationClass::Default => Vec::new(),
    }
}

/// A short, single-line excerpt of an error body, if it has any text.
fn error_detail(body: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(body);
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return None;
    }
    Some(match text.char_indices().nth(DETAIL_LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text,
    })
}
