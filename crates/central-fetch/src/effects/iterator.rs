//! Demand-driven pagination over a search.
//!
//! The iterator holds at most one page in memory and fetches the next page
//! only when the buffer runs dry and the server reported more matches.

use std::collections::VecDeque;

use central_query::FetchRequest;
use futures_util::Stream;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::client::CatalogClient;
use super::http::HttpClient;
use crate::error::{FetchError, Result};

#[derive(Debug)]
enum State {
    /// Nothing fetched yet.
    Uninitialized,
    /// At least one page fetched; `next_start` is where the next page begins.
    Buffering { total: u64, next_start: u64 },
    /// No further pages will be requested. Buffered items may remain.
    Exhausted,
    /// A fetch failed; every later call returns this error.
    Failed(FetchError),
}

/// Items gathered by [`PagedIterator::drain`] and the failure that stopped
/// it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Drained<T> {
    pub items: Vec<T>,
    pub error: Option<FetchError>,
}

impl<T> Drained<T> {
    /// Discard partial results on failure.
    pub fn into_result(self) -> Result<Vec<T>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.items),
        }
    }
}

/// Cursor over every result of one [`FetchRequest`].
///
/// Pages are requested at offsets `start, start + len(page 0), ...` until the
/// reported total is reached. A page that comes back empty before that ends
/// iteration without an error. Ordering across pages is whatever the server
/// returns.
pub struct PagedIterator<T, C> {
    client: CatalogClient<C>,
    request: FetchRequest,
    buffer: VecDeque<T>,
    state: State,
    total: Option<u64>,
    pages_fetched: u64,
    yielded: u64,
}

impl<T: DeserializeOwned, C: HttpClient> PagedIterator<T, C> {
    pub(crate) fn new(client: CatalogClient<C>, request: FetchRequest) -> Self {
        Self {
            client,
            request,
            buffer: VecDeque::new(),
            state: State::Uninitialized,
            total: None,
            pages_fetched: 0,
            yielded: 0,
        }
    }

    /// Whether [`next`](Self::next) will return an item.
    ///
    /// The first call performs the first fetch. Later calls fetch only when
    /// the buffer is empty and the server reported more matches, so calling
    /// this repeatedly without consuming never issues a second request.
    pub async fn has_next(&mut self, cancel: &CancellationToken) -> Result<bool> {
        if let State::Failed(err) = &self.state {
            return Err(err.clone());
        }
        if self.buffer.is_empty() {
            self.fill(cancel).await?;
        }
        Ok(!self.buffer.is_empty())
    }

    /// The next item, fetching a page first if the buffer is empty.
    ///
    /// # Errors
    ///
    /// [`FetchError::IteratorExhausted`] once every item was returned, or the
    /// latched fetch error.
    pub async fn next(&mut self, cancel: &CancellationToken) -> Result<T> {
        if !self.has_next(cancel).await? {
            return Err(FetchError::IteratorExhausted);
        }
        let item = self.buffer.pop_front().ok_or(FetchError::IteratorExhausted)?;
        self.yielded += 1;
        Ok(item)
    }

    /// Collect every remaining item.
    ///
    /// Holds the whole result set in memory; prefer [`next`](Self::next) or
    /// [`into_stream`](Self::into_stream) for large queries. On failure the
    /// items gathered so far are returned alongside the error.
    pub async fn drain(&mut self, cancel: &CancellationToken) -> Drained<T> {
        let mut items = Vec::new();
        loop {
            match self.next(cancel).await {
                Ok(item) => items.push(item),
                Err(FetchError::IteratorExhausted) => {
                    return Drained { items, error: None };
                }
                Err(err) => {
                    return Drained {
                        items,
                        error: Some(err),
                    };
                }
            }
        }
    }

    /// Adapt into a [`Stream`] that ends after the last item or after
    /// yielding the first error.
    pub fn into_stream(self, cancel: CancellationToken) -> impl Stream<Item = Result<T>> {
        futures_util::stream::unfold(Some((self, cancel)), |state| async move {
            let (mut iter, cancel) = state?;
            match iter.next(&cancel).await {
                Ok(item) => Some((Ok(item), Some((iter, cancel)))),
                Err(FetchError::IteratorExhausted) => None,
                Err(err) => Some((Err(err), None)),
            }
        })
    }

    /// Server-reported match count; `None` before the first fetch.
    pub fn total(&self) -> Option<u64> { self.total }

    /// Items returned by `next` so far.
    pub fn yielded(&self) -> u64 { self.yielded }

    pub fn pages_fetched(&self) -> u64 { self.pages_fetched }

    pub fn is_failed(&self) -> bool { matches!(self.state, State::Failed(_)) }

    /// Fetch the next page into the empty buffer, or settle into a terminal
    /// state when none is due.
    async fn fill(&mut self, cancel: &CancellationToken) -> Result<()> {
        let start = match self.state {
            State::Uninitialized => self.request.start,
            State::Buffering { total, next_start } if next_start < total => next_start,
            State::Buffering { .. } => {
                self.state = State::Exhausted;
                return Ok(());
            }
            State::Exhausted => return Ok(()),
            State::Failed(ref err) => return Err(err.clone()),
        };

        let request = self.request.clone().start(start);
        let page = match self.client.fetch::<T>(&request, cancel).await {
            Ok(page) => page,
            Err(err) => {
                self.state = State::Failed(err.clone());
                return Err(err);
            }
        };
        self.pages_fetched += 1;
        self.total = Some(page.num_found);

        let mut docs = page.docs;
        if docs.is_empty() {
            if start < page.num_found {
                warn!(
                    start,
                    num_found = page.num_found,
                    "empty page before reported total; ending iteration"
                );
            }
            self.state = State::Exhausted;
            return Ok(());
        }

        // Never hand out more than the reported total, even if the page overruns it.
        let room = page.num_found.saturating_sub(start);
        if docs.len() as u64 > room {
            warn!(
                start,
                num_found = page.num_found,
                docs = docs.len(),
                "page overruns reported total; truncating"
            );
            docs.truncate(usize::try_from(room).unwrap_or(usize::MAX));
        }

        let len = docs.len() as u64;
        self.buffer.extend(docs);
        self.state = if len == 0 {
            State::Exhausted
        } else {
            State::Buffering {
                total: page.num_found,
                next_start: start + len,
            }
        };
        Ok(())
    }
}
