//! # Response Cache
//! In-memory store of the last successful body per upstream URL.
//!
//! Entries have a freshness window (default 5 minutes). Stale entries are
//! kept, never evicted, so a failing upstream can still be answered from the
//! last known-good copy. Reads and writes share one key derivation.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    body: Arc<str>,
    stored_at: Instant,
}

/// A cached body together with whether it is still inside the freshness window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedBody {
    pub body: Arc<str>,
    pub fresh: bool,
}

/// Thread-safe cache keyed by [`ResponseCache::key_for`].
#[derive(Debug)]
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }
}

impl ResponseCache {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Derive the cache key for a URL. Every lookup and every write goes through here.
    pub fn key_for(url: &str) -> String {
        let digest = Sha256::digest(url.trim().as_bytes());
        format!("api:{:x}", digest)
    }

    /// Look up whatever is cached for `url`, fresh or stale.
    pub fn lookup(&self, url: &str) -> Option<CachedBody> {
        let key = Self::key_for(url);
        let entries = match self.entries.read() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        };
        entries.get(&key).map(|e| CachedBody {
            body: Arc::clone(&e.body),
            fresh: e.stored_at.elapsed() < self.ttl,
        })
    }

    /// Fresh entry only.
    pub fn get_fresh(&self, url: &str) -> Option<Arc<str>> {
        self.lookup(url).filter(|c| c.fresh).map(|c| c.body)
    }

    /// Replace the entry for `url`, restarting its freshness window.
    pub fn store(&self, url: &str, body: &str) {
        let key = Self::key_for(url);
        let entry = CacheEntry {
            body: Arc::from(body),
            stored_at: Instant::now(),
        };
        let mut entries = match self.entries.write() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        };
        entries.insert(key, entry);
    }

    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(g) => g.len(),
            Err(poison) => poison.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_stable_and_distinguishes_urls() {
        let a = ResponseCache::key_for("http://example.com/a");
        assert_eq!(a, ResponseCache::key_for("http://example.com/a"));
        assert_ne!(a, ResponseCache::key_for("http://example.com/b"));
        assert!(a.starts_with("api:"));
    }

    #[test]
    fn store_then_lookup_is_fresh() {
        let cache = ResponseCache::default();
        assert!(cache.lookup("http://x").is_none());
        cache.store("http://x", r#"{"ok":true}"#);
        let hit = cache.lookup("http://x").unwrap();
        assert!(hit.fresh);
        assert_eq!(&*hit.body, r#"{"ok":true}"#);
        assert_eq!(cache.get_fresh("http://x").as_deref(), Some(r#"{"ok":true}"#));
    }

    #[tokio::test(start_paused = true)]
    async fn entry_goes_stale_but_is_kept() {
        let cache = ResponseCache::with_ttl(Duration::from_secs(300));
        cache.store("http://x", "[1]");

        tokio::time::advance(Duration::from_secs(301)).await;

        assert!(cache.get_fresh("http://x").is_none());
        let stale = cache.lookup("http://x").expect("stale entry retained");
        assert!(!stale.fresh);
        assert_eq!(&*stale.body, "[1]");
    }

    #[tokio::test(start_paused = true)]
    async fn store_resets_freshness() {
        let cache = ResponseCache::with_ttl(Duration::from_secs(10));
        cache.store("http://x", "old");
        tokio::time::advance(Duration::from_secs(11)).await;
        cache.store("http://x", "new");
        assert_eq!(cache.get_fresh("http://x").as_deref(), Some("new"));
        assert_eq!(cache.len(), 1);
    }
}
