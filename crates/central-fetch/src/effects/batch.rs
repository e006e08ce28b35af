//! Concurrent fan-out of independent searches and downloads.
//!
//! Each request runs as its own task; a semaphore bounds how many run at
//! once. Results are keyed by the caller's key, so completion order does not
//! matter. One failing request never affects the others.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use bytes::Bytes;
use central_query::{Coordinate, FetchRequest, Page};
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::client::CatalogClient;
use super::http::HttpClient;
use crate::error::{FetchError, Result};

impl<C: HttpClient + 'static> CatalogClient<C> {
    /// Fetch one page for each request concurrently.
    ///
    /// At most `batch_concurrency` requests are in flight. Every key in the
    /// input appears in the output exactly once; duplicate keys keep the
    /// result of whichever finished last.
    pub async fn fetch_batch<K, T>(
        &self,
        requests: impl IntoIterator<Item = (K, FetchRequest)>,
        cancel: &CancellationToken,
    ) -> HashMap<K, Result<Page<T>>>
    where
        K: Eq + Hash + Send + 'static,
        T: DeserializeOwned + Send + 'static,
    {
        self.fan_out(requests, cancel, |client, request, cancel| async move {
            client.fetch(&request, &cancel).await
        })
        .await
    }

    /// Download each coordinate concurrently.
    pub async fn download_batch<K>(
        &self,
        coordinates: impl IntoIterator<Item = (K, Coordinate)>,
        cancel: &CancellationToken,
    ) -> HashMap<K, Result<Bytes>>
    where
        K: Eq + Hash + Send + 'static,
    {
        self.fan_out(coordinates, cancel, |client, coordinate, cancel| async move {
            client.download(&coordinate, &cancel).await
        })
        .await
    }

    async fn fan_out<K, I, R, F, Fut>(
        &self,
        inputs: impl IntoIterator<Item = (K, I)>,
        cancel: &CancellationToken,
        run: F,
    ) -> HashMap<K, Result<R>>
    where
        K: Eq + Hash + Send + 'static,
        I: Send + 'static,
        R: Send + 'static,
        F: Fn(CatalogClient<C>, I, CancellationToken) -> Fut,
        Fut: Future<Output = Result<R>> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.config().batch_concurrency.max(1)));
        let mut tasks = FuturesUnordered::new();

        for (key, input) in inputs {
            let semaphore = Arc::clone(&semaphore);
            let work = run(self.clone(), input, cancel.clone());
            let handle = tokio::spawn(async move {
                match semaphore.acquire_owned().await {
                    Ok(_permit) => work.await,
                    // The semaphore is owned here and never closed.
                    Err(_) => Err(FetchError::Cancelled),
                }
            });
            tasks.push(async move { (key, handle.await) });
        }

        debug!(tasks = tasks.len(), "batch started");

        let mut results = HashMap::with_capacity(tasks.len());
        while let Some((key, joined)) = tasks.next().await {
            let result = joined.unwrap_or_else(|e| {
                warn!(error = %e, "batch task did not complete");
                Err(FetchError::Task(e.to_string()))
            });
            results.insert(key, result);
        }
        results
    }
}
