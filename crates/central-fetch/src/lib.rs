//! Resilient paged search and file download against a Solr-backed catalog.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration and types
//! - [`core`] - Pure computations (backoff schedule, destination keys)
//! - [`effects`] - Cache, rate limiter, retry loop and HTTP behind a trait
//!
//! # Key Features
//!
//! - **Lazy pagination**: [`PagedIterator`] fetches one page at a time, on demand
//! - **Retry with backoff**: transient failures (429, 5xx, network) are retried
//! - **Per-host spacing**: [`RateLimiter`] keeps each destination under its rate
//! - **Response cache**: TTL-bounded, shared by every clone of a client
//! - **Cancellation**: every wait and request races a `CancellationToken`
//!
//! # Example
//!
//! ```no_run
//! use central_fetch::{ArtifactDoc, CatalogClient, ClientConfig, FetchRequest, Query};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> central_fetch::Result<()> {
//! let client = CatalogClient::from_config(ClientConfig::default())?;
//! let cancel = CancellationToken::new();
//!
//! let request = FetchRequest::new(Query::new().field("g", "com.google.inject")).rows(50);
//! let mut hits = client.iterate::<ArtifactDoc>(request);
//! while hits.has_next(&cancel).await? {
//!     let doc = hits.next(&cancel).await?;
//!     println!("{}:{}", doc.group, doc.artifact);
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use self::core::{backoff_delay, destination_of};
pub use data::{CacheSettings, ClientConfig, OperationClass, RateSettings, RetryPolicy};
pub use effects::{
    CacheStats, CatalogClient, Drained, HttpClient, HttpResponse, LimiterStats, PagedIterator,
    RateLimiter, ResponseCache, Transport, with_retry,
};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;

pub use error::{FetchError, Result};

pub use central_query::{
    ArtifactDoc, Coordinate, DEFAULT_ROWS, FacetCounts, FacetValue, FetchRequest, Highlighting,
    Page, Query, QueryError, Sort,
};
