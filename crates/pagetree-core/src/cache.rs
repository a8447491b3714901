//! Tag-aware caching for page lookups.
//!
//! Both lookup paths are fronted by a [`TagCache`]:
//!
//! | key | value | ttl | tags |
//! |---|---|---|---|
//! | `page:<id>:<0\|1>` | [`PageLookup`] | 24h | `page-common` |
//! | `page:path:<slug_compiled>` | [`PageLookup`] | 24h found / 1h missing | `page-common` |
//!
//! Every page entry carries the single shared [`PAGE_COMMON_TAG`], so any
//! page mutation invalidates all cached page reads at once. That trades
//! precision for simplicity; page volume is assumed small relative to
//! request volume. Negative lookups are cached with the shorter [`MISS_TTL`]
//! so repeated misses on unmapped URLs stay cheap without pinning stale
//! negatives for a day.
//!
//! The lifecycle layer treats a failed `get` as a miss and a failed `set` or
//! `invalidate` as a logged degradation; implementations should still report
//! failures honestly through [`Error::Cache`](crate::Error::Cache).

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{PageId, PageLookup, Result};

/// Shared tag carried by every page cache entry.
pub const PAGE_COMMON_TAG: &str = "page-common";

/// TTL for cached positive lookups.
pub const FOUND_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// TTL for cached negative lookups.
pub const MISS_TTL: Duration = Duration::from_secs(60 * 60);

/// Cache key for an id lookup restricted to a published flag.
#[must_use]
pub fn id_key(id: PageId, published: bool) -> String {
    format!("page:{id}:{}", u8::from(published))
}

/// Cache key for a compiled-path lookup.
#[must_use]
pub fn path_key(path: &str) -> String {
    format!("page:path:{path}")
}

/// Key-value cache with tag-based bulk invalidation.
///
/// Implementations must be safe for concurrent `get`/`set`/`invalidate`
/// from many callers and must never block indefinitely; timeout policy
/// belongs to the backing store.
#[async_trait]
pub trait TagCache: Send + Sync {
    /// Fetches a cached lookup. `Ok(None)` is a definitive miss; `Err` is a
    /// cache failure the caller may degrade to a miss.
    async fn get(&self, key: &str) -> Result<Option<PageLookup>>;

    /// Stores a lookup under `key` with the given TTL and tags.
    async fn set(
        &self,
        key: &str,
        value: PageLookup,
        ttl: Duration,
        tags: &[&str],
    ) -> Result<()>;

    /// Removes every entry whose tag set intersects `tags`.
    async fn invalidate(&self, tags: &[&str]) -> Result<()>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: PageLookup,
    expires_at: Instant,
    tags: HashSet<String>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Counters exposed by [`MemoryTagCache::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that returned a live entry.
    pub hits: u64,
    /// Lookups that found nothing (or only an expired entry).
    pub misses: u64,
    /// Entries written.
    pub sets: u64,
    /// Entries removed by tag invalidation.
    pub invalidated: u64,
}

#[derive(Debug, Default)]
struct StatCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    invalidated: AtomicU64,
}

/// In-memory [`TagCache`] with per-entry TTLs and a lazy expiry policy.
///
/// Expired entries are dropped when touched by `get`; there is no
/// background sweeper. Suitable as the in-process implementation and as the
/// fake in tests.
#[derive(Debug, Default)]
pub struct MemoryTagCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    stats: StatCounters,
}

impl MemoryTagCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of hit/miss/set/invalidation counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            sets: self.stats.sets.load(Ordering::Relaxed),
            invalidated: self.stats.invalidated.load(Ordering::Relaxed),
        }
    }

    /// Number of entries currently held, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` when no entries are held.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl TagCache for MemoryTagCache {
    async fn get(&self, key: &str) -> Result<Option<PageLookup>> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
        match entries.get(key) {
            Some(entry) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(entry.value.clone()))
            },
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            },
        }
    }

    async fn set(
        &self,
        key: &str,
        value: PageLookup,
        ttl: Duration,
        tags: &[&str],
    ) -> Result<()> {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
        };
        self.entries.write().await.insert(key.to_string(), entry);
        self.stats.sets.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn invalidate(&self, tags: &[&str]) -> Result<()> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !tags.iter().any(|t| entry.tags.contains(*t)));
        let removed = (before - entries.len()) as u64;
        if removed > 0 {
            self.stats.invalidated.fetch_add(removed, Ordering::Relaxed);
            debug!(removed, ?tags, "invalidated cache entries by tag");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Page;

    fn found(slug: &str) -> PageLookup {
        PageLookup::Found(Page::new(slug, slug))
    }

    #[tokio::test]
    async fn set_then_get_hits() {
        let cache = MemoryTagCache::new();
        cache
            .set("page:1:1", found("a"), FOUND_TTL, &[PAGE_COMMON_TAG])
            .await
            .unwrap();

        let value = cache.get("page:1:1").await.unwrap();
        assert!(matches!(value, Some(PageLookup::Found(_))));
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn expired_entries_read_as_misses() {
        let cache = MemoryTagCache::new();
        cache
            .set("page:1:1", found("a"), Duration::from_millis(5), &[PAGE_COMMON_TAG])
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(cache.get("page:1:1").await.unwrap().is_none());
        // The expired entry is dropped on touch.
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn invalidate_removes_only_intersecting_tags() {
        let cache = MemoryTagCache::new();
        cache
            .set("page:1:1", found("a"), FOUND_TTL, &[PAGE_COMMON_TAG])
            .await
            .unwrap();
        cache
            .set("other:1", found("b"), FOUND_TTL, &["other-tag"])
            .await
            .unwrap();

        cache.invalidate(&[PAGE_COMMON_TAG]).await.unwrap();

        assert!(cache.get("page:1:1").await.unwrap().is_none());
        assert!(cache.get("other:1").await.unwrap().is_some());
        assert_eq!(cache.stats().invalidated, 1);
    }

    #[tokio::test]
    async fn negative_lookups_are_cacheable() {
        let cache = MemoryTagCache::new();
        cache
            .set("page:path:nope", PageLookup::Missing, MISS_TTL, &[PAGE_COMMON_TAG])
            .await
            .unwrap();

        let value = cache.get("page:path:nope").await.unwrap();
        assert!(matches!(value, Some(PageLookup::Missing)));
    }

    #[test]
    fn key_scheme_matches_contract() {
        assert_eq!(id_key(PageId(17), true), "page:17:1");
        assert_eq!(id_key(PageId(17), false), "page:17:0");
        assert_eq!(path_key("about/team"), "page:path:about/team");
    }
}
