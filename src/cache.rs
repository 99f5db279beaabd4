//! Cross-request cache of fully composed HTML.
//!
//! Entries are keyed by the request path plus query string, verbatim. Each
//! entry lives for a fixed TTL from insertion and the cache holds at most
//! `max_entries`; past that the least recently used entry is evicted.
//! Expiry and eviction are handled by moka's own maintenance.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Uri};
use moka::future::Cache;
use moka::policy::EvictionPolicy;
use tracing::debug;

use crate::config::CacheConfig;

/// Header reporting how the render cache treated a request.
pub const CACHE_STATUS_HEADER: &str = "x-render-cache";

/// Outcome of the cache lookup for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    Bypass,
}

impl CacheStatus {
    pub fn header_value(self) -> HeaderValue {
        HeaderValue::from_static(match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
            Self::Bypass => "BYPASS",
        })
    }
}

/// Bounded, time-expiring key to HTML map.
#[derive(Clone)]
pub struct RenderCache {
    entries: Cache<String, Arc<str>>,
}

impl RenderCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_entries.max(1))
            .time_to_live(ttl)
            .eviction_policy(EvictionPolicy::lru())
            .eviction_listener(|key, _html, cause| {
                if cause.was_evicted() {
                    debug!(name: "render_cache.evicted", key = %key, cause = ?cause, "Render cache entry dropped");
                }
            })
            .build();
        Self { entries }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(
            u64::try_from(config.max_entries).unwrap_or(u64::MAX),
            Duration::from_secs(config.ttl_secs),
        )
    }

    /// Live entry for `key`, marking it most recently used.
    pub async fn get(&self, key: &str) -> Option<Arc<str>> {
        self.entries.get(key).await
    }

    /// Insert or overwrite `key`, restarting its TTL.
    pub async fn set(&self, key: impl Into<String>, html: impl Into<Arc<str>>) {
        self.entries.insert(key.into(), html.into()).await;
    }

    /// Apply pending evictions and expirations now instead of on the next
    /// maintenance cycle.
    pub async fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks().await;
    }

    /// Entry count as of the last maintenance cycle.
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }
}

impl fmt::Debug for RenderCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderCache")
            .field("entries", &self.entries.entry_count())
            .field("max_entries", &self.entries.policy().max_capacity())
            .field("ttl", &self.entries.policy().time_to_live())
            .finish()
    }
}

/// Decides which requests may touch the render cache.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    enabled: bool,
    bypass_prefixes: Vec<String>,
}

impl CachePolicy {
    pub fn new(enabled: bool, bypass_prefixes: Vec<String>) -> Self {
        let bypass_prefixes = bypass_prefixes
            .into_iter()
            .map(|p| p.trim_end_matches('/').to_string())
            .collect();
        Self {
            enabled,
            bypass_prefixes,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.enabled, config.bypass_prefixes.clone())
    }

    /// Whether `path` must never be read from or written to the cache.
    ///
    /// Prefixes match whole segments, ignoring ASCII case the way routes do:
    /// `/api` covers `/api`, `/API/x` and `/api/x`, not `/apiary`. An empty
    /// prefix (from `/`) covers everything.
    pub fn bypasses(&self, path: &str) -> bool {
        if !self.enabled {
            return true;
        }
        self.bypass_prefixes.iter().any(|prefix| {
            path.get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
                && path
                    .get(prefix.len()..)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }

    /// Cache key: path and query exactly as requested.
    pub fn key(uri: &Uri) -> String {
        uri.path_and_query()
            .map_or_else(|| uri.path().to_string(), |pq| pq.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_returns_stored_html() {
        let cache = RenderCache::new(10, Duration::from_secs(60));
        cache.set("/library/eso", "<html>a</html>").await;
        assert_eq!(
            cache.get("/library/eso").await.as_deref(),
            Some("<html>a</html>")
        );
        assert!(cache.get("/missing").await.is_none());
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let cache = RenderCache::new(10, Duration::from_millis(300));
        cache.set("/", "home").await;
        assert!(cache.get("/").await.is_some());

        tokio::time::sleep(Duration::from_millis(450)).await;
        assert!(cache.get("/").await.is_none());
        cache.run_pending_tasks().await;
        assert_eq!(cache.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_overwrite_resets_ttl() {
        let cache = RenderCache::new(10, Duration::from_millis(800));
        cache.set("/", "v1").await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        cache.set("/", "v2").await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(cache.get("/").await.as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_used() {
        let cache = RenderCache::new(3, Duration::from_secs(60));
        cache.set("/a", "a").await;
        cache.set("/b", "b").await;
        cache.set("/c", "c").await;
        cache.run_pending_tasks().await;

        // Touch /a so /b becomes the oldest.
        assert!(cache.get("/a").await.is_some());
        cache.run_pending_tasks().await;
        cache.set("/d", "d").await;
        cache.run_pending_tasks().await;

        assert_eq!(cache.entry_count(), 3);
        assert!(cache.get("/b").await.is_none());
        assert!(cache.get("/a").await.is_some());
        assert!(cache.get("/c").await.is_some());
        assert!(cache.get("/d").await.is_some());
    }

    #[tokio::test]
    async fn test_never_exceeds_capacity() {
        let cache = RenderCache::new(500, Duration::from_secs(60));
        for i in 0..1200 {
            cache.set(format!("/library/eso/{i}"), "x").await;
        }
        cache.run_pending_tasks().await;

        assert!(cache.entry_count() <= 500);
        assert!(cache.get("/library/eso/0").await.is_none());
        assert!(cache.get("/library/eso/1199").await.is_some());
    }

    #[test]
    fn test_bypass_prefix_matches_segments() {
        let policy = CachePolicy::new(true, vec!["/api".into(), "/books-export/".into()]);
        assert!(policy.bypasses("/api"));
        assert!(policy.bypasses("/api/library/books/1"));
        assert!(policy.bypasses("/books-export"));
        assert!(!policy.bypasses("/apiary"));
        assert!(!policy.bypasses("/library/eso"));
    }

    #[test]
    fn test_bypass_ignores_ascii_case() {
        let policy = CachePolicy::new(true, vec!["/api".into(), "/books-export".into()]);
        assert!(policy.bypasses("/BOOKS-EXPORT"));
        assert!(policy.bypasses("/Books-Export/"));
        assert!(policy.bypasses("/Api/x"));
        assert!(!policy.bypasses("/APIARY"));
        // Multi-byte characters straddling the prefix length must not panic.
        assert!(!policy.bypasses("/ап"));
    }

    #[test]
    fn test_disabled_policy_bypasses_everything() {
        let policy = CachePolicy::new(false, Vec::new());
        assert!(policy.bypasses("/"));
    }

    #[test]
    fn test_key_keeps_query_verbatim() {
        let a: Uri = "/library/eso?page=2&x=1".parse().unwrap();
        let b: Uri = "/library/eso?x=1&page=2".parse().unwrap();
        assert_eq!(CachePolicy::key(&a), "/library/eso?page=2&x=1");
        assert_ne!(CachePolicy::key(&a), CachePolicy::key(&b));
    }
}
