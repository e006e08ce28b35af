//! I/O and effectful components.
//!
//! Everything that touches the network, the clock or shared mutable state
//! lives here. The HTTP layer sits behind the [`HttpClient`] trait so the
//! rest can be driven by scripted clients in tests.

mod batch;
mod cache;
mod client;
mod http;
mod iterator;
mod limiter;
mod retry;
mod transport;

#[cfg(test)]
mod mock;

pub use cache::{CacheStats, ResponseCache};
pub use client::CatalogClient;
pub use http::{HttpClient, HttpResponse};
pub use iterator::{Drained, PagedIterator};
pub use limiter::{LimiterStats, RateLimiter};
pub use retry::with_retry;
pub use transport::Transport;

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
