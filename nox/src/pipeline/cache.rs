use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self) -> bool {
        self.created_at.elapsed() < self.ttl
    }
}

/// TTL memo for expensive stage outputs, keyed by `(stage, input)`.
///
/// Only successful computations are stored. Expired entries are treated as
/// absent and replaced on the next computation; there is no capacity bound.
pub struct PipelineCache<V> {
    entries: Mutex<HashMap<(String, String), CacheEntry<V>>>,
}

impl<V: Clone> PipelineCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fresh value for the key, if any.
    pub fn get(&self, stage: &str, key: &str) -> Option<V> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&(stage.to_string(), key.to_string()))
            .filter(|entry| entry.is_fresh())
            .map(|entry| entry.value.clone())
    }

    pub fn insert(&self, stage: &str, key: &str, ttl: Duration, value: V) {
        let entry = CacheEntry {
            value,
            created_at: Instant::now(),
            ttl,
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((stage.to_string(), key.to_string()), entry);
    }

    /// Return the cached value if still fresh, otherwise run `compute` and
    /// store its `Ok` result. Errors pass through uncached.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        stage: &str,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(stage, key) {
            debug!(stage, "cache hit");
            return Ok(value);
        }
        let value = compute().await?;
        self.insert(stage, key, ttl, value.clone());
        Ok(value)
    }

    /// Drop expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh());
        before - entries.len()
    }

    /// Stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for PipelineCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(200);

    async fn counted(cache: &PipelineCache<String>, calls: &AtomicUsize, key: &str) -> String {
        cache
            .get_or_compute("search", key, TTL, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(format!("results for {}", key))
            })
            .await
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_key_within_ttl_computes_once() {
        let cache = PipelineCache::new();
        let calls = AtomicUsize::new(0);

        assert_eq!(counted(&cache, &calls, "q").await, "results for q");
        tokio::time::advance(Duration::from_secs(199)).await;
        assert_eq!(counted(&cache, &calls, "q").await, "results for q");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_recomputed() {
        let cache = PipelineCache::new();
        let calls = AtomicUsize::new(0);

        counted(&cache, &calls, "q").await;
        tokio::time::advance(TTL).await;
        assert!(cache.get("search", "q").is_none());
        counted(&cache, &calls, "q").await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_and_stages_are_distinct() {
        let cache = PipelineCache::new();
        let calls = AtomicUsize::new(0);

        counted(&cache, &calls, "a").await;
        counted(&cache, &calls, "b").await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        cache.insert("scrape", "a", TTL, "scraped".to_string());
        assert_eq!(cache.get("scrape", "a").as_deref(), Some("scraped"));
        assert_eq!(cache.get("search", "a").as_deref(), Some("results for a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_are_not_cached() {
        let cache: PipelineCache<String> = PipelineCache::new();
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_compute("search", "q", TTL, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>("engine down")
            })
            .await;
        assert_eq!(first, Err("engine down"));
        assert!(cache.is_empty());

        counted(&cache, &calls, "q").await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = PipelineCache::new();
        cache.insert("search", "old", Duration::from_secs(10), "x".to_string());
        cache.insert("search", "new", TTL, "y".to_string());
        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }
}
