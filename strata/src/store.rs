use std::sync::Arc;

use bytes::Bytes;
use shared::TtlSeconds;
use tracing::warn;

use crate::ports::CacheBackend;

/// Ordered collection of cache tiers, fastest first.
///
/// Reads probe tiers in order and return the first hit, without promoting
/// the value into earlier tiers. Writes and deletes fan out to every tier;
/// a failing tier is logged and skipped, never surfaced to the request
/// pipeline.
#[derive(Clone)]
pub struct TieredStore {
    tiers: Vec<Arc<dyn CacheBackend>>,
}

impl TieredStore {
    pub fn new(tiers: Vec<Arc<dyn CacheBackend>>) -> Self {
        Self { tiers }
    }

    pub fn tiers(&self) -> &[Arc<dyn CacheBackend>] {
        &self.tiers
    }

    /// First-hit read. A tier read error counts as a miss on that tier so
    /// the probe continues downward.
    pub async fn read(&self, key: &str) -> Option<Bytes> {
        for tier in &self.tiers {
            match tier.get(key).await {
                Ok(Some(value)) => return Some(value),
                Ok(None) => {}
                Err(err) => warn!("cache tier read failed for key '{}': {}", key, err),
            }
        }
        None
    }

    pub async fn write(&self, key: &str, value: Bytes, ttl: TtlSeconds) {
        for tier in &self.tiers {
            if let Err(err) = tier.set(key, value.clone(), ttl).await {
                warn!("cache tier write failed for key '{}': {}", key, err);
            }
        }
    }

    pub async fn delete(&self, keys: &[String]) {
        for tier in &self.tiers {
            if let Err(err) = tier.delete(keys).await {
                warn!("cache tier delete failed for keys {:?}: {}", keys, err);
            }
        }
    }
}

impl std::fmt::Debug for TieredStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredStore")
            .field("tiers", &self.tiers.len())
            .finish()
    }
}
