use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::RwLock;

use crate::services::ServiceResult;

/// Path-like cache key, e.g. `["students", "me", "ana"]`
pub type QueryKey = Vec<String>;

pub fn query_key(parts: &[&str]) -> QueryKey {
    parts.iter().map(|p| p.to_string()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    /// The query is disabled and was never run
    Idle,
    Success,
    Error,
}

/// Snapshot of one query: its status plus either data or an error message.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult<T> {
    pub status: QueryStatus,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> QueryResult<T> {
    pub fn idle() -> Self {
        Self { status: QueryStatus::Idle, data: None, error: None }
    }

    pub fn success(data: T) -> Self {
        Self { status: QueryStatus::Success, data: Some(data), error: None }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { status: QueryStatus::Error, data: None, error: Some(message.into()) }
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }
}

struct CacheEntry<T> {
    value: Arc<T>,
    stored_at: Instant,
}

/// Keyed cache of successful query results. Failures are reported to the
/// caller and never stored, so the next read retries.
///
/// Entries older than `ttl` read as misses and are purged on the next
/// insert. Past `capacity` entries the oldest one is evicted.
pub struct QueryCache<T> {
    entries: RwLock<HashMap<QueryKey, CacheEntry<T>>>,
    ttl: Option<Duration>,
    capacity: Option<usize>,
}

impl<T> Default for QueryCache<T> {
    fn default() -> Self {
        Self { entries: RwLock::new(HashMap::new()), ttl: None, capacity: None }
    }
}

impl<T: Clone + Send + Sync> QueryCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache whose entries expire after `ttl` and never number more than `capacity`.
    pub fn bounded(ttl: Duration, capacity: usize) -> Self {
        Self { entries: RwLock::new(HashMap::new()), ttl: Some(ttl), capacity: Some(capacity) }
    }

    fn is_fresh(&self, entry: &CacheEntry<T>, now: Instant) -> bool {
        self.ttl.map_or(true, |ttl| now.duration_since(entry.stored_at) < ttl)
    }

    /// Cached value for `key`, running `fetcher` on a miss.
    pub async fn fetch<F, Fut>(&self, key: QueryKey, fetcher: F) -> QueryResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
    {
        if let Some(hit) = self.entries.read().await.get(&key) {
            if self.is_fresh(hit, Instant::now()) {
                return QueryResult::success(T::clone(&hit.value));
            }
        }
        self.load(key, fetcher).await
    }

    /// Drop whatever is cached for `key` and fetch again.
    pub async fn refetch<F, Fut>(&self, key: QueryKey, fetcher: F) -> QueryResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
    {
        self.invalidate(&key).await;
        self.load(key, fetcher).await
    }

    async fn load<F, Fut>(&self, key: QueryKey, fetcher: F) -> QueryResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
    {
        match fetcher().await {
            Ok(value) => {
                let result = QueryResult::success(value.clone());
                self.store(key, value).await;
                result
            }
            Err(e) => {
                tracing::warn!("Query {:?} failed: {}", key, e);
                QueryResult::error(e.to_string())
            }
        }
    }

    async fn store(&self, key: QueryKey, value: T) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| self.is_fresh(entry, now));

        if let Some(capacity) = self.capacity {
            while !entries.contains_key(&key) && entries.len() >= capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.stored_at)
                    .map(|(k, _)| k.clone());
                match oldest {
                    Some(oldest) => entries.remove(&oldest),
                    None => break,
                };
            }
        }

        if entries.len() < before {
            tracing::debug!("Evicted {} cached queries", before - entries.len());
        }
        if self.capacity != Some(0) {
            entries.insert(key, CacheEntry { value: Arc::new(value), stored_at: now });
        }
    }

    pub async fn invalidate(&self, key: &QueryKey) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// Whether a fresh entry is held for `key`
    pub async fn contains(&self, key: &QueryKey) -> bool {
        let now = Instant::now();
        self.entries.read().await.get(key).map_or(false, |entry| self.is_fresh(entry, now))
    }

    /// Number of entries held, expired ones included until the next insert
    pub async fn size(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ServiceError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn hits_skip_the_fetcher() {
        let cache = QueryCache::<u32>::new();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let fetch = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        };

        assert_eq!(cache.fetch(query_key(&["n"]), fetch).await.data, Some(7));
        assert_eq!(cache.fetch(query_key(&["n"]), fetch).await.data, Some(7));
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        cache.refetch(query_key(&["n"]), fetch).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache = QueryCache::<u32>::new();
        let failed = cache
            .fetch(query_key(&["n"]), || async { Err(ServiceError::NotFound("Thing".to_string())) })
            .await;
        assert_eq!(failed.status, QueryStatus::Error);
        assert_eq!(failed.error.as_deref(), Some("Thing not found"));
        assert!(!cache.contains(&query_key(&["n"])).await);

        let ok = cache.fetch(query_key(&["n"]), || async { Ok(1) }).await;
        assert!(ok.is_success());
    }

    #[tokio::test]
    async fn capacity_evicts_the_oldest_entry() {
        let cache = QueryCache::<u32>::bounded(Duration::from_secs(3600), 2);
        for (n, name) in ["ana", "bia", "caio"].iter().enumerate() {
            cache.fetch(query_key(&[*name]), || async move { Ok(n as u32) }).await;
        }

        assert_eq!(cache.size().await, 2);
        assert!(!cache.contains(&query_key(&["ana"])).await);
        assert!(cache.contains(&query_key(&["bia"])).await);
        assert!(cache.contains(&query_key(&["caio"])).await);
    }

    #[tokio::test]
    async fn expired_entries_are_refetched_and_purged() {
        let cache = QueryCache::<u32>::bounded(Duration::from_millis(50), 10);
        cache.fetch(query_key(&["ana"]), || async { Ok(1) }).await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!cache.contains(&query_key(&["ana"])).await);

        let refreshed = cache.fetch(query_key(&["ana"]), || async { Ok(2) }).await;
        assert_eq!(refreshed.data, Some(2));

        cache.fetch(query_key(&["bia"]), || async { Ok(3) }).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        cache.fetch(query_key(&["caio"]), || async { Ok(4) }).await;
        assert_eq!(cache.size().await, 1);
    }

    #[test]
    fn snapshots_serialize_with_lowercase_status() {
        let idle = serde_json::to_value(QueryResult::<u32>::idle()).unwrap();
        assert_eq!(idle, serde_json::json!({ "status": "idle", "data": null, "error": null }));
    }
}
