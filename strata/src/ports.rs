use async_trait::async_trait;
use bytes::Bytes;
use shared::{Result, TtlSeconds};

// Ports are the pluggable extension points for underlying cache backends

/// Port over one concrete key-value backend with TTL expiry.
///
/// `keys_matching` powers pattern invalidation (`*` matches any substring,
/// anything else requires full key equality). A backend without enumeration
/// support returns an empty list instead of erroring.
#[async_trait]
pub trait CacheBackend: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;
    async fn set(&self, key: &str, value: Bytes, ttl: TtlSeconds) -> Result<()>;
    async fn delete(&self, keys: &[String]) -> Result<()>;
    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>>;
}
