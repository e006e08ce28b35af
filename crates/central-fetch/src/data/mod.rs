//! Immutable configuration types for the fetch core.
//!
//! These are plain values: deserializable from the client's config file and
//! cloned into each component at construction time.

mod class;
mod config;

pub use class::OperationClass;
pub use config::{CacheSettings, ClientConfig, MAX_INTERVAL, RateSettings, RetryPolicy};
