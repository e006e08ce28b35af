//! TTL-keyed response cache.
//!
//! Entries are raw response bodies keyed by request identity (the full search
//! URL, or the repository path for downloads). Expired entries are never
//! purged on read; they read as absent until overwritten or [`ResponseCache::clear`]ed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;
use tracing::debug;

// Stand-in expiry when `now + ttl` does not fit in an Instant.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Bytes,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool { now < self.expires_at }
}

/// Point-in-time counters for a [`ResponseCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Stored entries, expired ones included.
    pub total_entries: usize,
    pub live_entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Concurrent byte-blob cache with per-entry expiry.
///
/// Readers share a read lock; `put` and `clear` take the write lock only for
/// the duration of the map mutation.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    pub fn new() -> Self { Self::default() }

    /// Look up `key`, returning its bytes only while the entry is fresh.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let now = Instant::now();
        let found = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            entries
                .get(key)
                .filter(|e| e.is_fresh(now))
                .map(|e| e.data.clone())
        };

        match found {
            Some(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key, "cache hit");
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key, "cache miss");
            }
        }
        found
    }

    /// Store `data` under `key` for `ttl`, replacing any previous entry.
    ///
    /// A zero `ttl` stores nothing.
    pub fn put(&self, key: impl Into<String>, data: Bytes, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }

        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.into(), CacheEntry { data, expires_at });
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        CacheStats {
            total_entries: entries.len(),
            live_entries: entries.values().filter(|e| e.is_fresh(now)).count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_put_then_get_until_expiry() {
        let cache = ResponseCache::new();
        cache.put("k", Bytes::from_static(b"payload"), Duration::from_secs(10));

        assert_eq!(cache.get("k"), Some(Bytes::from_static(b"payload")));

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(cache.get("k").is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("k"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_is_exclusive() {
        let cache = ResponseCache::new();
        cache.put("k", Bytes::from_static(b"x"), Duration::from_secs(5));
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cache.get("k"), None);
    }

    #[tokio::test]
    async fn test_zero_ttl_stores_nothing() {
        let cache = ResponseCache::new();
        cache.put("k", Bytes::from_static(b"x"), Duration::ZERO);
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entries_are_kept_until_overwritten() {
        let cache = ResponseCache::new();
        cache.put("k", Bytes::from_static(b"old"), Duration::from_secs(1));
        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.len(), 1);

        cache.put("k", Bytes::from_static(b"new"), Duration::from_secs(1));
        assert_eq!(cache.get("k"), Some(Bytes::from_static(b"new")));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_discards_everything() {
        let cache = ResponseCache::new();
        cache.put("a", Bytes::from_static(b"1"), Duration::from_secs(60));
        cache.put("b", Bytes::from_static(b"2"), Duration::from_secs(60));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_track_hits_misses_and_liveness() {
        let cache = ResponseCache::new();
        cache.put("short", Bytes::from_static(b"1"), Duration::from_secs(1));
        cache.put("long", Bytes::from_static(b"2"), Duration::from_secs(60));
        tokio::time::advance(Duration::from_secs(5)).await;

        cache.get("long");
        cache.get("short");
        cache.get("absent");

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.live_entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_readers_and_writers() {
        let cache = Arc::new(ResponseCache::new());
        let mut handles = Vec::new();

        for i in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                for j in 0..100 {
                    let key = format!("k{}", j % 10);
                    cache.put(key.clone(), Bytes::from(vec![i as u8]), Duration::from_secs(60));
                    assert!(cache.get(&key).is_some());
                }
            }));
        }

        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(cache.len(), 10);
    }
}
