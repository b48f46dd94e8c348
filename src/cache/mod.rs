//! Bounded, TTL-aware store of raw HTML keyed by URL.
//!
//! The cache is an ordinary value: create one at startup and share it behind an
//! `Arc`. Every get/evict/set sequence runs under one mutex, so concurrent parse
//! calls never observe a half-applied eviction.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

pub const DEFAULT_CAPACITY: usize = 100;
pub const DEFAULT_TTL_MS: i64 = 3_600_000;

/// djb2 over the URL's characters. Collisions are possible; LRU/TTL churn keeps
/// them rare enough for a page cache.
pub fn url_hash(url: &str) -> u32 {
    url.chars().fold(5381u32, |hash, c| {
        hash.wrapping_shl(5).wrapping_add(hash).wrapping_add(c as u32)
    })
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub html: String,
    pub cached_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.cached_at) > self.ttl
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<u32, CacheEntry>,
    // least recently used at the front
    order: VecDeque<u32>,
}

impl Inner {
    fn touch(&mut self, key: u32) {
        if let Some(pos) = self.order.iter().position(|k| *k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(key);
    }

    fn remove(&mut self, key: u32) {
        self.entries.remove(&key);
        if let Some(pos) = self.order.iter().position(|k| *k == key) {
            self.order.remove(pos);
        }
    }
}

#[derive(Debug)]
pub struct HtmlCache {
    inner: Mutex<Inner>,
    capacity: usize,
    default_ttl: Duration,
}

impl Default for HtmlCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl HtmlCache {
    pub fn new(capacity: usize) -> Self {
        Self::with_ttl(capacity, Duration::milliseconds(DEFAULT_TTL_MS))
    }

    pub fn with_ttl(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: capacity.max(1),
            default_ttl,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // a panic while holding the lock cannot leave the map and order inconsistent
        // for longer than one operation, so recover the guard
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, url: &str) -> Option<String> {
        self.get_at(url, Utc::now())
    }

    pub(crate) fn get_at(&self, url: &str, now: DateTime<Utc>) -> Option<String> {
        let key = url_hash(url);
        let mut inner = self.lock();

        let entry = inner.entries.get(&key)?;
        if entry.is_expired(now) {
            debug!(url, "cache entry expired");
            inner.remove(key);
            return None;
        }

        let html = entry.html.clone();
        inner.touch(key);
        Some(html)
    }

    pub fn set(&self, url: &str, html: impl Into<String>) {
        self.set_at(url, html.into(), self.default_ttl, Utc::now());
    }

    pub fn set_with_ttl(&self, url: &str, html: impl Into<String>, ttl: Duration) {
        self.set_at(url, html.into(), ttl, Utc::now());
    }

    pub(crate) fn set_at(&self, url: &str, html: String, ttl: Duration, now: DateTime<Utc>) {
        let key = url_hash(url);
        let mut inner = self.lock();

        if !inner.entries.contains_key(&key)
            && inner.entries.len() >= self.capacity
            && let Some(evicted) = inner.order.pop_front()
        {
            inner.entries.remove(&evicted);
            debug!(evicted, "evicted least recently used cache entry");
        }

        inner.entries.insert(
            key,
            CacheEntry {
                html,
                cached_at: now,
                ttl,
            },
        );
        inner.touch(key);
    }

    /// Same expiry semantics as `get`, without promoting the entry.
    pub fn contains(&self, url: &str) -> bool {
        self.contains_at(url, Utc::now())
    }

    pub(crate) fn contains_at(&self, url: &str, now: DateTime<Utc>) -> bool {
        let key = url_hash(url);
        let mut inner = self.lock();

        let expired = match inner.entries.get(&key) {
            Some(entry) => entry.is_expired(now),
            None => return false,
        };
        if expired {
            inner.remove(key);
        }
        !expired
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    /// Resident entries, including expired ones nobody has looked up yet.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn url(i: usize) -> String {
        format!("https://docs.example.com/page/{i}")
    }

    #[test]
    fn test_url_hash_is_stable() {
        assert_eq!(url_hash(""), 5381);
        assert_eq!(url_hash("a"), 5381 * 33 + 97);
        assert_eq!(url_hash("https://a.com"), url_hash("https://a.com"));
        assert_ne!(url_hash("https://a.com"), url_hash("https://b.com"));
    }

    #[test]
    fn test_set_then_get() {
        let cache = HtmlCache::default();
        cache.set("https://a.com/docs", "<html>a</html>");

        assert_eq!(cache.get("https://a.com/docs").as_deref(), Some("<html>a</html>"));
        assert!(cache.contains("https://a.com/docs"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("https://b.com/docs"), None);
    }

    #[test]
    fn test_expired_entry_is_removed_lazily() {
        let cache = HtmlCache::default();
        let start = Utc::now();
        cache.set_at("https://a.com", "html".to_string(), Duration::milliseconds(1000), start);

        assert!(cache.get_at("https://a.com", start + Duration::milliseconds(1000)).is_some());

        // still counted until someone looks it up
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_at("https://a.com", start + Duration::milliseconds(1001)), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_default_ttl_is_one_hour() {
        let cache = HtmlCache::default();
        let start = Utc::now();
        cache.set_at("https://a.com", "html".to_string(), cache.default_ttl, start);

        assert!(cache.contains_at("https://a.com", start + Duration::minutes(59)));
        assert!(!cache.contains_at("https://a.com", start + Duration::minutes(61)));
    }

    #[test]
    fn test_evicts_single_least_recently_used() {
        let cache = HtmlCache::new(100);
        for i in 0..100 {
            cache.set(&url(i), format!("page {i}"));
        }
        // refresh page 0 so page 1 becomes the oldest
        assert!(cache.get(&url(0)).is_some());

        cache.set(&url(100), "page 100");

        assert_eq!(cache.len(), 100);
        assert_eq!(cache.get(&url(1)), None);
        for i in (0..=100).filter(|i| *i != 1) {
            assert_eq!(cache.get(&url(i)), Some(format!("page {i}")), "page {i}");
        }
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let cache = HtmlCache::new(2);
        cache.set("https://a.com", "a");
        cache.set("https://b.com", "b");
        cache.set("https://a.com", "a2");

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("https://a.com").as_deref(), Some("a2"));
        assert_eq!(cache.get("https://b.com").as_deref(), Some("b"));
    }

    #[test]
    fn test_clear() {
        let cache = HtmlCache::new(4);
        cache.set("https://a.com", "a");
        cache.set("https://b.com", "b");
        cache.clear();

        assert!(cache.is_empty());
        assert!(!cache.contains("https://a.com"));
    }

    #[test]
    fn test_shared_across_threads() {
        let cache = Arc::new(HtmlCache::new(8));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        cache.set(&url(t * 100 + i), "x");
                        let _ = cache.get(&url(t * 100 + i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.len() <= 8);
    }
}
