use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use shared::{Error, Result, TtlSeconds};
use strata::ports::CacheBackend;
use wildmatch::WildMatch;

/// On-disk record: payload bytes plus the absolute expiry instant.
/// Sled has no native TTL, so expiry is enforced lazily on access.
#[derive(Serialize, Deserialize)]
struct StoredEntry {
    expires_at_ms: u64,
    #[serde(with = "serde_bytes")]
    value: Vec<u8>,
}

/// Sled-based persistent backend, suitable as a slower shared tier behind an
/// in-memory one.
pub struct SledBackend {
    db: sled::Db,
}

impl SledBackend {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path)
            .map_err(|e| Error::Backend(format!("failed to open sled database: {e}")))?;
        Ok(Self { db })
    }

    fn now_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

#[async_trait]
impl CacheBackend for SledBackend {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let Some(raw) = self.db.get(key.as_bytes()).map_err(backend_err)? else {
            return Ok(None);
        };
        let entry: StoredEntry =
            serde_json::from_slice(&raw).map_err(|e| Error::Decode(e.to_string()))?;
        if entry.expires_at_ms <= Self::now_ms() {
            self.db.remove(key.as_bytes()).map_err(backend_err)?;
            return Ok(None);
        }
        Ok(Some(Bytes::from(entry.value)))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: TtlSeconds) -> Result<()> {
        let entry = StoredEntry {
            expires_at_ms: Self::now_ms() + ttl.0 * 1000,
            value: value.to_vec(),
        };
        let raw = serde_json::to_vec(&entry).map_err(|e| Error::Decode(e.to_string()))?;
        self.db.insert(key.as_bytes(), raw).map_err(backend_err)?;
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.db.remove(key.as_bytes()).map_err(backend_err)?;
        }
        Ok(())
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>> {
        let matcher = WildMatch::new(pattern);
        let now = Self::now_ms();
        let mut keys = Vec::new();
        for item in self.db.iter() {
            let (key, raw) = item.map_err(backend_err)?;
            let Ok(key) = std::str::from_utf8(&key) else {
                continue;
            };
            if !matcher.matches(key) {
                continue;
            }
            match serde_json::from_slice::<StoredEntry>(&raw) {
                Ok(entry) if entry.expires_at_ms > now => keys.push(key.to_string()),
                _ => {}
            }
        }
        Ok(keys)
    }
}

impl std::fmt::Debug for SledBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledBackend")
            .field("entries", &self.db.len())
            .finish()
    }
}

fn backend_err(err: sled::Error) -> Error {
    Error::Backend(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::sleep;

    fn open_temp() -> (SledBackend, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let backend = SledBackend::open(dir.path().join("cache.sled")).unwrap();
        (backend, dir)
    }

    #[tokio::test]
    async fn test_sled_backend_set_and_get() {
        let (backend, _dir) = open_temp();

        backend
            .set("key", Bytes::from_static(b"value"), TtlSeconds(60))
            .await
            .unwrap();

        assert_eq!(
            backend.get("key").await.unwrap(),
            Some(Bytes::from_static(b"value"))
        );
    }

    #[tokio::test]
    async fn test_sled_backend_round_trips_binary_payloads() {
        let (backend, _dir) = open_temp();
        let payload: Vec<u8> = (0..=255u8).collect();

        backend
            .set("bin", Bytes::from(payload.clone()), TtlSeconds(60))
            .await
            .unwrap();

        assert_eq!(backend.get("bin").await.unwrap(), Some(Bytes::from(payload)));
    }

    #[tokio::test]
    async fn test_sled_backend_expires_lazily() {
        let (backend, _dir) = open_temp();

        backend
            .set("short", Bytes::from_static(b"gone soon"), TtlSeconds(1))
            .await
            .unwrap();

        assert!(backend.get("short").await.unwrap().is_some());

        sleep(Duration::from_millis(1100)).await;

        assert!(backend.get("short").await.unwrap().is_none());
        // the expired record is dropped, not just hidden
        assert!(backend.keys_matching("short").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sled_backend_delete() {
        let (backend, _dir) = open_temp();

        backend
            .set("key", Bytes::from_static(b"value"), TtlSeconds(60))
            .await
            .unwrap();
        backend.delete(&["key".to_string()]).await.unwrap();

        assert!(backend.get("key").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sled_backend_keys_matching() {
        let (backend, _dir) = open_temp();

        backend
            .set("GET/cache", Bytes::from_static(b"{}"), TtlSeconds(60))
            .await
            .unwrap();
        backend
            .set("GET/cache-d", Bytes::from_static(b"hello"), TtlSeconds(60))
            .await
            .unwrap();
        backend
            .set("POST/other", Bytes::from_static(b"{}"), TtlSeconds(60))
            .await
            .unwrap();

        let mut keys = backend.keys_matching("*/cache*").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["GET/cache".to_string(), "GET/cache-d".to_string()]);
    }
}
