use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use moka::Expiry;
use moka::future::Cache;
use shared::{Result, TtlSeconds};
use strata::ports::CacheBackend;
use wildmatch::WildMatch;

#[derive(Clone, Debug)]
struct Entry {
    value: Bytes,
    ttl: Option<Duration>,
}

/// Reads each entry's lifetime off the entry itself, falling back to the
/// store-wide default.
struct PerEntryTtl {
    default_ttl: Option<Duration>,
}

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        entry.ttl.or(self.default_ttl)
    }

    // An overwrite replaces the entry's lifetime along with its value;
    // without this, moka keeps the previous entry's remaining time.
    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        entry.ttl.or(self.default_ttl)
    }
}

/// Moka-based in-memory backend with per-entry TTL and bounded capacity.
/// Eviction under capacity pressure is moka's concern, not the engine's.
pub struct MokaBackend {
    cache: Cache<String, Entry>,
}

impl MokaBackend {
    /// Bounded store; `default_ttl` covers entries stored without an
    /// explicit lifetime (entries written through [`CacheBackend`] always
    /// carry one).
    pub fn bounded(max_entries: u64, default_ttl: Option<Duration>) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl { default_ttl })
            .build();
        Self { cache }
    }

    pub fn unbounded(default_ttl: Option<Duration>) -> Self {
        let cache = Cache::builder()
            .expire_after(PerEntryTtl { default_ttl })
            .build();
        Self { cache }
    }
}

#[async_trait]
impl CacheBackend for MokaBackend {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        Ok(self.cache.get(key).await.map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: TtlSeconds) -> Result<()> {
        let entry = Entry {
            value,
            ttl: Some(ttl.as_duration()),
        };
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.cache.remove(key).await;
        }
        Ok(())
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>> {
        let matcher = WildMatch::new(pattern);
        Ok(self
            .cache
            .iter()
            .filter(|(key, _)| matcher.matches(key.as_str()))
            .map(|(key, _)| key.as_str().to_string())
            .collect())
    }
}

impl std::fmt::Debug for MokaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaBackend")
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}
