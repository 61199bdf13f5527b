//! Result cache over a retriever.
//!
//! Keyed by the exact (query, mode, top_k) triple; no query normalization,
//! so "Docker" and "docker" occupy separate entries. Expiry is lazy: an
//! entry older than the TTL is dropped at lookup time, there is no sweeper.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;
use parking_lot::RwLock;
use serde::Serialize;

use crate::models::{RetrievedChunk, SearchMode};

/// The retrieval seam the cache wraps.
pub trait Retrieve {
    fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        mode: SearchMode,
    ) -> impl Future<Output = Result<Vec<RetrievedChunk>>> + Send;
}

type CacheKey = (String, SearchMode, usize);

struct CacheEntry {
    results: Vec<RetrievedChunk>,
    stored_at: Instant,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

pub struct CachedRetriever<R> {
    inner: R,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    /// None means entries never expire.
    ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<R: Retrieve> CachedRetriever<R> {
    pub fn new(inner: R, ttl: Option<Duration>) -> Self {
        Self {
            inner,
            entries: RwLock::new(HashMap::new()),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Serve from cache when a live entry exists, otherwise delegate and
    /// store the result. Failed delegations are never cached.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        mode: SearchMode,
    ) -> Result<Vec<RetrievedChunk>> {
        let key: CacheKey = (query.to_string(), mode, top_k);

        if let Some(results) = self.lookup(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Cache hit for query '{query}'");
            return Ok(results);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let results = self.inner.retrieve(query, top_k, mode).await?;

        self.entries.write().insert(
            key,
            CacheEntry {
                results: results.clone(),
                stored_at: Instant::now(),
            },
        );

        Ok(results)
    }

    fn lookup(&self, key: &CacheKey) -> Option<Vec<RetrievedChunk>> {
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if !self.expired(entry) => return Some(entry.results.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // Entry exists but is stale; drop it under the write lock.
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get(key) {
            if self.expired(entry) {
                entries.remove(key);
            } else {
                return Some(entry.results.clone());
            }
        }
        None
    }

    fn expired(&self, entry: &CacheEntry) -> bool {
        match self.ttl {
            Some(ttl) => entry.stored_at.elapsed() >= ttl,
            None => false,
        }
    }

    /// Drop all cached entries. Hit/miss counters survive.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.read().len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct CountingRetriever {
        calls: AtomicUsize,
    }

    impl CountingRetriever {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Retrieve for CountingRetriever {
        async fn retrieve(
            &self,
            query: &str,
            top_k: usize,
            _mode: SearchMode,
        ) -> Result<Vec<RetrievedChunk>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![RetrievedChunk {
                document_id: query.to_string(),
                chunk_id: 0,
                filename: "f.txt".to_string(),
                source_url: String::new(),
                content: format!("top_k={top_k}"),
                score: 1.0,
                signals: Vec::new(),
            }])
        }
    }

    #[tokio::test]
    async fn test_identical_queries_hit_cache() {
        let cache = CachedRetriever::new(CountingRetriever::new(), None);

        let first = cache.retrieve("docker", 5, SearchMode::FullHybrid).await.unwrap();
        let second = cache.retrieve("docker", 5, SearchMode::FullHybrid).await.unwrap();

        assert_eq!(cache.inner.call_count(), 1);
        assert_eq!(first.len(), second.len());
        assert_eq!(first[0].document_id, second[0].document_id);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn test_differing_parameters_miss() {
        let cache = CachedRetriever::new(CountingRetriever::new(), None);

        cache.retrieve("docker", 5, SearchMode::FullHybrid).await.unwrap();
        cache.retrieve("docker", 10, SearchMode::FullHybrid).await.unwrap();
        cache.retrieve("docker", 5, SearchMode::LexicalOnly).await.unwrap();
        cache.retrieve("Docker", 5, SearchMode::FullHybrid).await.unwrap();

        assert_eq!(cache.inner.call_count(), 4);
    }

    #[tokio::test]
    async fn test_clear_empties_cache() {
        let cache = CachedRetriever::new(CountingRetriever::new(), None);

        cache.retrieve("docker", 5, SearchMode::FullHybrid).await.unwrap();
        cache.clear();
        cache.retrieve("docker", 5, SearchMode::FullHybrid).await.unwrap();

        assert_eq!(cache.inner.call_count(), 2);
    }

    #[tokio::test]
    async fn test_ttl_expires_entries() {
        let cache = CachedRetriever::new(
            CountingRetriever::new(),
            Some(Duration::from_millis(50)),
        );

        cache.retrieve("docker", 5, SearchMode::FullHybrid).await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        cache.retrieve("docker", 5, SearchMode::FullHybrid).await.unwrap();

        assert_eq!(cache.inner.call_count(), 2);
    }

    #[tokio::test]
    async fn test_live_entry_survives_within_ttl() {
        let cache = CachedRetriever::new(
            CountingRetriever::new(),
            Some(Duration::from_secs(60)),
        );

        cache.retrieve("docker", 5, SearchMode::FullHybrid).await.unwrap();
        cache.retrieve("docker", 5, SearchMode::FullHybrid).await.unwrap();

        assert_eq!(cache.inner.call_count(), 1);
    }
}
