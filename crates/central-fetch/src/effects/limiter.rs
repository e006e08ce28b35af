//! Per-destination request spacing.
//!
//! The limiter is proactive: it spaces outbound requests so a burst never
//! exceeds the configured steady-state rate, before the server has to push
//! back with 429s. Spacing is `1s / requests_per_second(class)`.
//!
//! The last-request time is tracked per destination, not per
//! (destination, class). A wait computed for a search request therefore
//! delays a download to the same host as well, which bounds total load on
//! each host regardless of which class issues requests.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::data::{OperationClass, RateSettings};
use crate::error::{FetchError, Result};

/// Running totals for one (destination, class) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LimiterStats {
    pub requests: u64,
    pub total_wait: Duration,
}

impl LimiterStats {
    pub fn average_wait(&self) -> Duration {
        if self.requests == 0 {
            return Duration::ZERO;
        }
        self.total_wait / u32::try_from(self.requests).unwrap_or(u32::MAX)
    }
}

#[derive(Debug, Default)]
struct LimiterState {
    /// Next free slot per destination. May lie in the future while a
    /// reserved wait is still being slept.
    last_request: HashMap<String, Instant>,
    stats: HashMap<(String, OperationClass), LimiterStats>,
}

/// Minimum-interval gate keyed by destination host.
///
/// All bookkeeping is behind a single mutex that is never held across the
/// sleep. Concurrent callers each reserve the next free slot, so simultaneous
/// acquires come out spaced rather than bunched.
#[derive(Debug)]
pub struct RateLimiter {
    settings: RateSettings,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    pub fn new(settings: RateSettings) -> Self {
        Self {
            settings,
            state: Mutex::new(LimiterState::default()),
        }
    }

    pub fn settings(&self) -> &RateSettings { &self.settings }

    /// Wait until a request of `class` to `destination` may be sent.
    ///
    /// Returns how long the caller was held back; zero when no wait was
    /// needed. Cancellation during the wait returns [`FetchError::Cancelled`].
    pub async fn acquire(
        &self,
        destination: &str,
        class: OperationClass,
        cancel: &CancellationToken,
    ) -> Result<Duration> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let wait = self.reserve(destination, class);

        if !wait.is_zero() {
            debug!(
                destination,
                %class,
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                "rate limiter holding request"
            );
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
        }

        if self.settings.statistics {
            self.record(destination, class, wait);
        }
        Ok(wait)
    }

    /// Claim the next slot for `destination` and return the time until it opens.
    fn reserve(&self, destination: &str, class: OperationClass) -> Duration {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let previous = state.last_request.get(destination).copied();
        let wait = match (previous, self.settings.min_interval(class)) {
            (Some(last), Some(interval)) => (last + interval).saturating_duration_since(now),
            _ => Duration::ZERO,
        };

        let slot = match previous {
            Some(last) if last > now + wait => last,
            _ => now + wait,
        };
        state.last_request.insert(destination.to_string(), slot);
        wait
    }

    fn record(&self, destination: &str, class: OperationClass, wait: Duration) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = state
            .stats
            .entry((destination.to_string(), class))
            .or_default();
        entry.requests += 1;
        entry.total_wait += wait;
    }

    /// Statistics for one pair; `None` when nothing was recorded or
    /// statistics are disabled.
    pub fn stats(&self, destination: &str, class: OperationClass) -> Option<LimiterStats> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.stats.get(&(destination.to_string(), class)).copied()
    }

    /// Statistics for every recorded pair.
    pub fn all_stats(&self) -> Vec<(String, OperationClass, LimiterStats)> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<_> = state
            .stats
            .iter()
            .map(|((dest, class), stats)| (dest.clone(), *class, *stats))
            .collect();
        out.sort_by(|a, b| (&a.0, a.1).cmp(&(&b.0, b.1)));
        out
    }
}
