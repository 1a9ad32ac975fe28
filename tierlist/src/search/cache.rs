//! Result page cache keyed by canonical request key and page

use crate::catalog::SearchPage;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

#[derive(Debug)]
struct Entry {
    page: SearchPage,
    stored_at: Instant,
}

/// LRU of result pages with a revalidation window.
///
/// Entries older than the TTL are treated as missing and evicted on lookup.
#[derive(Debug)]
pub struct PageCache {
    entries: LruCache<(String, u32), Entry>,
    ttl: Duration,
}

impl PageCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            ttl,
        }
    }

    /// Fresh page for `key` and `page`
    pub fn get(&mut self, key: &str, page: u32) -> Option<SearchPage> {
        let cache_key = (key.to_string(), page);
        let fresh = self
            .entries
            .get(&cache_key)
            .map(|entry| entry.stored_at.elapsed() < self.ttl)?;
        if fresh {
            self.entries.get(&cache_key).map(|entry| entry.page.clone())
        } else {
            self.entries.pop(&cache_key);
            None
        }
    }

    pub fn contains_fresh(&mut self, key: &str, page: u32) -> bool {
        self.get(key, page).is_some()
    }

    pub fn insert(&mut self, key: &str, page: u32, result: SearchPage) {
        self.entries.put(
            (key.to_string(), page),
            Entry {
                page: result,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL)
    }
}
