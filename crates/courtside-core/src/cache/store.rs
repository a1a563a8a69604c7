use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Method;
use serde_json::Value;
use tracing::debug;

/// Build the cache and in-flight registry key for a request.
pub fn cache_key(method: &Method, url: &str) -> String {
    format!("{}:{}", method.as_str(), url)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Age below the TTL.
    Fresh,
    /// Age in `[ttl, 2 * ttl)`: still served, but due for revalidation.
    Stale,
    /// Age of `2 * ttl` or more: no longer served.
    Expired,
}

impl Freshness {
    pub fn classify(age: Duration, ttl: Duration) -> Self {
        if age < ttl {
            Freshness::Fresh
        } else if age < ttl.saturating_mul(2) {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Arc<Value>,
    pub cached_at: Instant,
}

impl CacheEntry {
    pub fn new(data: Arc<Value>, cached_at: Instant) -> Self {
        Self { data, cached_at }
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.cached_at)
    }

    pub fn freshness(&self, now: Instant, ttl: Duration) -> Freshness {
        Freshness::classify(self.age(now), ttl)
    }
}

/// A servable cache entry: either fresh or stale.
#[derive(Debug, Clone)]
pub struct CacheHit {
    pub data: Arc<Value>,
    pub freshness: Freshness,
}

/// Session-scoped map of GET responses.
///
/// Every invalidation bumps `generation`, which lets a request that started
/// before an invalidation refuse to write its (possibly outdated) payload.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
    generation: u64,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a key, returning it only while it is fresh or stale.
    pub fn lookup(&self, key: &str, now: Instant, ttl: Duration) -> Option<CacheHit> {
        let entry = self.entries.get(key)?;
        match entry.freshness(now, ttl) {
            Freshness::Expired => None,
            freshness => Some(CacheHit {
                data: Arc::clone(&entry.data),
                freshness,
            }),
        }
    }

    pub fn insert(&mut self, key: String, data: Arc<Value>, now: Instant) {
        self.entries.insert(key, CacheEntry::new(data, now));
    }

    /// Insert only if no invalidation happened since `generation` was read.
    pub fn insert_if_current(
        &mut self,
        key: String,
        data: Arc<Value>,
        now: Instant,
        generation: u64,
    ) -> bool {
        if generation != self.generation {
            debug!(key = %key, "Skipping cache write, invalidated while in flight");
            return false;
        }
        self.insert(key, data, now);
        true
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drop every entry whose key contains `url`. Returns how many were removed.
    pub fn invalidate_matching(&mut self, url: &str) -> usize {
        self.generation += 1;
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.contains(url));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.generation += 1;
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

// ============================================================================
// Tests
// ============================================================================
