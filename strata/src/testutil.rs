use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use shared::{Error, Result, TtlSeconds};
use wildmatch::WildMatch;

use crate::ports::CacheBackend;

/// In-memory backend for engine tests. TTLs are recorded, not enforced.
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, (Bytes, TtlSeconds)>>,
    get_calls: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            get_calls: AtomicUsize::new(0),
        }
    }

    pub fn insert(&self, key: &str, value: &[u8]) {
        self.entries.lock().unwrap().insert(
            key.to_string(),
            (Bytes::copy_from_slice(value), TtlSeconds(1)),
        );
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    pub fn ttl_of(&self, key: &str) -> Option<TtlSeconds> {
        self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(key)
            .map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: TtlSeconds) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value, ttl));
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>> {
        let matcher = WildMatch::new(pattern);
        Ok(self
            .entries
            .lock()
            .unwrap()
            .keys()
            .filter(|key| matcher.matches(key))
            .cloned()
            .collect())
    }
}

/// Backend whose every operation errors.
pub struct FailingBackend;

#[async_trait]
impl CacheBackend for FailingBackend {
    async fn get(&self, _key: &str) -> Result<Option<Bytes>> {
        Err(Error::Backend("tier down".to_string()))
    }

    async fn set(&self, _key: &str, _value: Bytes, _ttl: TtlSeconds) -> Result<()> {
        Err(Error::Backend("tier down".to_string()))
    }

    async fn delete(&self, _keys: &[String]) -> Result<()> {
        Err(Error::Backend("tier down".to_string()))
    }

    async fn keys_matching(&self, _pattern: &str) -> Result<Vec<String>> {
        Err(Error::Backend("tier down".to_string()))
    }
}
