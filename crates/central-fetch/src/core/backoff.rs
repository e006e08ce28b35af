use std::time::Duration;

use crate::data::RetryPolicy;

/// Delay to sleep before retry number `retry` (1 = first retry).
///
/// The formula is `min(initial_backoff * backoff_factor^(retry-1), backoff_ceiling)`.
/// Retry `0` is the initial attempt and never waits.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use central_fetch::{RetryPolicy, backoff_delay};
///
/// let policy = RetryPolicy::default()
///     .initial_backoff(Duration::from_millis(100))
///     .backoff_factor(2.0)
///     .backoff_ceiling(Duration::from_millis(350));
///
/// assert_eq!(backoff_delay(&policy, 0), Duration::ZERO);
/// assert_eq!(backoff_delay(&policy, 1), Duration::from_millis(100));
/// assert_eq!(backoff_delay(&policy, 2), Duration::from_millis(200));
/// assert_eq!(backoff_delay(&policy, 3), Duration::from_millis(350));
/// ```
pub fn backoff_delay(policy: &RetryPolicy, retry: u32) -> Duration {
    if retry == 0 {
        return Duration::ZERO;
    }

    let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
    let factor = policy.backoff_factor.max(0.0);
    let secs = policy.initial_backoff.as_secs_f64() * factor.powi(exponent);

    // Saturate instead of letting from_secs_f64 panic on overflow or NaN.
    if !secs.is_finite() || secs >= policy.backoff_ceiling.as_secs_f64() {
        return policy.backoff_ceiling;
    }
    Duration::from_secs_f64(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(initial_ms: u64, factor: f64, ceiling_ms: u64) -> RetryPolicy {
        RetryPolicy::default()
            .initial_backoff(Duration::from_millis(initial_ms))
            .backoff_factor(factor)
            .backoff_ceiling(Duration::from_millis(ceiling_ms))
    }

    #[test]
    fn test_backoff_exponential_growth() {
        let p = policy(10, 2.0, 10_000);
        let delays: Vec<Duration> = (1..6).map(|i| backoff_delay(&p, i)).collect();

        assert_eq!(delays[0], Duration::from_millis(10));
        for i in 1..delays.len() {
            assert_eq!(delays[i], delays[i - 1] * 2);
        }
    }

    #[test]
    fn test_backoff_respects_ceiling() {
        let p = policy(1_000, 3.0, 5_000);
        assert_eq!(backoff_delay(&p, 1), Duration::from_secs(1));
        assert_eq!(backoff_delay(&p, 2), Duration::from_secs(3));
        assert_eq!(backoff_delay(&p, 3), Duration::from_secs(5));
        assert_eq!(backoff_delay(&p, 30), Duration::from_secs(5));
    }

    #[test]
    fn test_backoff_overflow_protection() {
        let p = policy(1, 10.0, 60_000);
        assert_eq!(backoff_delay(&p, u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn test_backoff_zero_base_stays_zero() {
        let p = policy(0, 2.0, 1_000);
        assert_eq!(backoff_delay(&p, 1), Duration::ZERO);
        assert_eq!(backoff_delay(&p, 10), Duration::ZERO);
    }

    #[test]
    fn test_backoff_constant_factor() {
        let p = policy(250, 1.0, 1_000);
        assert_eq!(backoff_delay(&p, 1), Duration::from_millis(250));
        assert_eq!(backoff_delay(&p, 4), Duration::from_millis(250));
    }

    proptest::proptest! {
        #[test]
        fn prop_backoff_bounded_and_monotonic(
            initial_ms in 0u64..5_000,
            factor in 1.5f64..8.0,
            ceiling_ms in 0u64..120_000,
            retry in 1u32..64,
        ) {
            let p = policy(initial_ms, factor, ceiling_ms);
            let current = backoff_delay(&p, retry);
            let next = backoff_delay(&p, retry + 1);
            proptest::prop_assert!(current <= p.backoff_ceiling);
            proptest::prop_assert!(next >= current);
        }
    }
}
