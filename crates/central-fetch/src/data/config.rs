use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::OperationClass;

/// Exponential backoff parameters for transient failures.
///
/// The delay before retry `i` (1-based) is
/// `min(initial_backoff * backoff_factor^(i-1), backoff_ceiling)`.
/// Total attempts are at most `1 + max_retries`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    ///
    /// Default: 3
    pub max_retries: u32,

    /// Delay before the first retry.
    ///
    /// Default: 500ms
    #[serde(rename = "initial_backoff_ms", with = "millis")]
    pub initial_backoff: Duration,

    /// Multiplier applied to the delay after each retry.
    ///
    /// Default: 2.0
    pub backoff_factor: f64,

    /// Upper bound on any single delay.
    ///
    /// Default: 30s
    #[serde(rename = "backoff_ceiling_ms", with = "millis")]
    pub backoff_ceiling: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            backoff_factor: 2.0,
            backoff_ceiling: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    #[must_use]
    pub fn backoff_factor(mut self, backoff_factor: f64) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    #[must_use]
    pub fn backoff_ceiling(mut self, backoff_ceiling: Duration) -> Self {
        self.backoff_ceiling = backoff_ceiling;
        self
    }
}

/// Response cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    /// Freshness window; zero disables storing.
    pub ttl_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 300,
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration { Duration::from_secs(self.ttl_seconds) }
}

/// Longest spacing [`RateSettings::min_interval`] will return.
pub const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Requests-per-second budget for each operation class.
///
/// A rate of zero (or below) disables spacing for that class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateSettings {
    pub search: f64,
    pub download: f64,
    pub default: f64,
    /// Keep per-destination request counts and wait totals.
    pub statistics: bool,
}

impl Default for RateSettings {
    fn default() -> Self {
        Self {
            search: 2.0,
            download: 10.0,
            default: 5.0,
            statistics: false,
        }
    }
}

impl RateSettings {
    pub fn requests_per_second(&self, class: OperationClass) -> f64 {
        match class {
            OperationClass::Search => self.search,
            OperationClass::Download => self.download,
            OperationClass::Default => self.default,
        }
    }

    /// Minimum spacing between requests of `class`, or `None` when unlimited.
    ///
    /// Rates slower than one request per [`MAX_INTERVAL`] are clamped to it.
    pub fn min_interval(&self, class: OperationClass) -> Option<Duration> {
        let rps = self.requests_per_second(class);
        if !(rps.is_finite() && rps > 0.0) {
            return None;
        }
        Some(
            Duration::try_from_secs_f64(rps.recip())
                .map_or(MAX_INTERVAL, |interval| interval.min(MAX_INTERVAL)),
        )
    }
}

/// Everything the fetch core needs to talk to a catalog.
///
/// Every field has a default pointing at Maven Central, so an empty config
/// file is valid.
///
/// # Examples
///
/// ```
/// use central_fetch::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .search_url("http://localhost:8983/solr/select")
///     .timeout(Duration::from_secs(5))
///     .cache_ttl(Duration::from_secs(60));
/// assert!(config.cache.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Solr `select` endpoint.
    pub search_url: String,

    /// Root of the static file repository.
    pub file_url: String,

    /// Per-request HTTP timeout.
    ///
    /// Default: 30s
    #[serde(rename = "timeout_ms", with = "millis")]
    pub timeout: Duration,

    pub user_agent: String,

    pub retry: RetryPolicy,

    pub cache: CacheSettings,

    pub rate: RateSettings,

    /// Upper bound on concurrently running batch tasks.
    ///
    /// Default: 4
    pub batch_concurrency: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            search_url: "https://search.maven.org/solrsearch/select".to_string(),
            file_url: "https://repo1.maven.org/maven2".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("central/", env!("CARGO_PKG_VERSION")).to_string(),
            retry: RetryPolicy::default(),
            cache: CacheSettings::default(),
            rate: RateSettings::default(),
            batch_concurrency: 4,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }

    #[must_use]
    pub fn file_url(mut self, url: impl Into<String>) -> Self {
        self.file_url = url.into();
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Enable the response cache with the given TTL.
    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = CacheSettings {
            enabled: true,
            ttl_seconds: ttl.as_secs(),
        };
        self
    }

    #[must_use]
    pub fn without_cache(mut self) -> Self {
        self.cache.enabled = false;
        self
    }

    #[must_use]
    pub fn rate(mut self, rate: RateSettings) -> Self {
        self.rate = rate;
        self
    }

    #[must_use]
    pub fn batch_concurrency(mut self, n: usize) -> Self {
        self.batch_concurrency = n.max(1);
        self
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
