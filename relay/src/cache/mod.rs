//! Normalized response cache
//!
//! Two layers queried in order: a fixed table of curated answers, then a
//! bounded LRU of previously computed answers. Both are keyed by
//! [`normalize`]d question text.

mod curated;

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;

/// Capacity of the LRU layer when none (or zero) is configured
pub const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1000) {
    Some(n) => n,
    None => unreachable!(),
};

/// Cache key normalization: trim surrounding whitespace and lowercase.
pub fn normalize(question: &str) -> String {
    question.trim().to_lowercase()
}

/// Which layer answered a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLayer {
    Curated,
    Memo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHit {
    pub answer: String,
    pub layer: CacheLayer,
}

/// Curated table plus LRU memoization, with hit/miss tracking
pub struct ResponseCache {
    curated: HashMap<String, String>,
    memo: Mutex<LruCache<String, String>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    /// Create a cache with the built-in curated table and an LRU of `capacity`
    pub fn new(capacity: usize) -> Self {
        let curated = curated::CURATED_ANSWERS
            .iter()
            .map(|(q, a)| (normalize(q), a.to_string()));
        Self::with_curated(capacity, curated)
    }

    /// Create a cache with a caller-supplied curated table
    pub fn with_curated(
        capacity: usize,
        curated: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(DEFAULT_CAPACITY);
        Self {
            curated: curated
                .into_iter()
                .map(|(q, a)| (normalize(&q), a))
                .collect(),
            memo: Mutex::new(LruCache::new(cap)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a question in the curated table, then the LRU layer.
    ///
    /// An LRU hit refreshes that key's recency.
    pub fn lookup(&self, question: &str) -> Option<CacheHit> {
        let key = normalize(question);

        if let Some(answer) = self.curated.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Some(CacheHit {
                answer: answer.clone(),
                layer: CacheLayer::Curated,
            });
        }

        let mut memo = self.memo.lock();
        match memo.get(&key) {
            Some(answer) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(CacheHit {
                    answer: answer.clone(),
                    layer: CacheLayer::Memo,
                })
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Record a computed answer in the LRU layer.
    ///
    /// Questions covered by the curated table are never written.
    pub fn record(&self, question: &str, answer: &str) {
        let key = normalize(question);
        if self.curated.contains_key(&key) {
            return;
        }

        let mut memo = self.memo.lock();
        match memo.push(key.clone(), answer.to_string()) {
            Some((evicted, _)) if evicted != key => {
                tracing::debug!("Evicted least recently used cache entry {:?}", evicted);
            }
            _ => {}
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let memo = self.memo.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: memo.len(),
            capacity: memo.cap().get(),
            curated: self.curated.len(),
        }
    }

    /// Clear the LRU layer and counters; the curated table is untouched
    pub fn clear(&self) {
        let mut memo = self.memo.lock();
        memo.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY.get())
    }
}

/// Cache statistics
#[derive(Clone, Debug, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries currently held by the LRU layer
    pub size: usize,
    pub capacity: usize,
    pub curated: usize,
}

impl CacheStats {
    /// Calculate hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_cache(capacity: usize) -> ResponseCache {
        ResponseCache::with_curated(capacity, std::iter::empty())
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Hello World\t\n"), "hello world");
        assert_eq!(normalize("Hello, World!"), "hello, world!");
    }

    #[test]
    fn test_curated_hit() {
        let cache = ResponseCache::default();
        let hit = cache.lookup("  HELLO ").unwrap();
        assert_eq!(hit.layer, CacheLayer::Curated);
        assert!(hit.answer.starts_with("👋 Hello!"));
        assert!(cache.lookup("مرحبا").is_some());
    }

    #[test]
    fn test_curated_table_is_never_overwritten() {
        let cache = ResponseCache::default();
        let original = cache.lookup("hello").unwrap().answer;
        cache.record("Hello", "something else");
        assert_eq!(cache.lookup("hello").unwrap().answer, original);
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_record_then_lookup() {
        let cache = empty_cache(10);
        assert!(cache.lookup("What time is it?").is_none());
        cache.record("What time is it?", "Noon.");

        let hit = cache.lookup("  what time is it?").unwrap();
        assert_eq!(hit.answer, "Noon.");
        assert_eq!(hit.layer, CacheLayer::Memo);
    }

    #[test]
    fn test_record_overwrites_with_latest_answer() {
        let cache = empty_cache(10);
        cache.record("q", "first");
        cache.record("Q", "second");
        assert_eq!(cache.lookup("q").unwrap().answer, "second");
        assert_eq!(cache.stats().size, 1);
    }

    #[test]
    fn test_evicts_least_recently_used_beyond_capacity() {
        let cache = empty_cache(1000);
        for i in 0..1000 {
            cache.record(&format!("question {}", i), &format!("answer {}", i));
        }
        assert_eq!(cache.stats().size, 1000);

        // One more distinct key pushes out the oldest.
        cache.record("question 1000", "answer 1000");
        assert_eq!(cache.stats().size, 1000);
        assert!(cache.lookup("question 0").is_none());
        assert!(cache.lookup("question 1").is_some());
        assert!(cache.lookup("question 1000").is_some());
    }

    #[test]
    fn test_access_refreshes_recency() {
        let cache = empty_cache(1000);
        for i in 0..1000 {
            cache.record(&format!("question {}", i), "a");
        }

        // Touch the oldest entry so "question 1" becomes the eviction candidate.
        assert!(cache.lookup("question 0").is_some());
        cache.record("question 1000", "a");

        assert!(cache.lookup("question 0").is_some());
        assert!(cache.lookup("question 1").is_none());
    }

    #[test]
    fn test_write_refreshes_recency() {
        let cache = empty_cache(2);
        cache.record("a", "1");
        cache.record("b", "2");
        cache.record("a", "1 again");
        cache.record("c", "3");

        assert!(cache.lookup("a").is_some());
        assert!(cache.lookup("b").is_none());
    }

    #[test]
    fn test_zero_capacity_falls_back_to_default() {
        let cache = empty_cache(0);
        assert_eq!(cache.stats().capacity, DEFAULT_CAPACITY.get());
    }

    #[test]
    fn test_stats_and_clear() {
        let cache = empty_cache(10);
        cache.record("a", "1");
        cache.lookup("a");
        cache.lookup("b");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate(), 50.0);

        cache.clear();
        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.hits, 0);
        assert!(cache.lookup("a").is_none());
    }
}
