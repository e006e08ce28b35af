//! Exponential-backoff retry around a fallible async operation.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::core::backoff_delay;
use crate::data::RetryPolicy;
use crate::error::{FetchError, Result};

/// Run `operation` until it succeeds, fails permanently, or the retry budget
/// is spent.
///
/// The closure receives the zero-based attempt number. Attempt 0 runs
/// immediately; attempt `i > 0` first sleeps [`backoff_delay`]`(policy, i)`.
/// Only [`FetchError::is_transient`] errors are retried. When every attempt
/// fails transiently the last error is returned unchanged.
///
/// Cancellation is checked before each attempt and raced against every
/// sleep; it surfaces as [`FetchError::Cancelled`] and is never retried.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let err = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_transient() {
            return Err(err);
        }
        if attempt >= policy.max_retries {
            warn!(
                attempts = attempt + 1,
                error = %err,
                "giving up after transient failures"
            );
            return Err(err);
        }

        attempt += 1;
        let delay = backoff_delay(policy, attempt);
        warn!(
            attempt,
            max_retries = policy.max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "transient failure, retrying"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
