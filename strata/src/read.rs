use bytes::Bytes;
use tracing::{debug, warn};

use crate::domain::{ETAG, ResponseMetadata, data_key};
use crate::store::TieredStore;

/// Terminal outcome of the cache read path for one request.
#[derive(Debug)]
pub enum ReadOutcome {
    /// No usable cache entry; the request continues to the handler.
    Miss,
    /// The client's validator matches the stored one; respond 304 without
    /// touching the payload record.
    NotModified,
    /// Full replay of the stored status, headers and payload bytes.
    Hit {
        metadata: ResponseMetadata,
        payload: Bytes,
    },
}

/// Resolve a derived key against the store.
///
/// Undecodable metadata and metadata without its payload record both degrade
/// to a miss; the stale record is left for TTL expiry rather than repaired.
pub async fn resolve(store: &TieredStore, key: &str, if_none_match: Option<&str>) -> ReadOutcome {
    let Some(raw) = store.read(key).await else {
        return ReadOutcome::Miss;
    };

    let metadata = match ResponseMetadata::from_bytes(&raw) {
        Ok(metadata) => metadata,
        Err(err) => {
            warn!("discarding cached metadata for key '{}': {}", key, err);
            return ReadOutcome::Miss;
        }
    };

    if let (Some(candidate), Some(stored)) = (if_none_match, metadata.headers.get(ETAG)) {
        if candidate == stored {
            return ReadOutcome::NotModified;
        }
    }

    match store.read(&data_key(key)).await {
        Some(payload) => ReadOutcome::Hit { metadata, payload },
        None => {
            debug!("metadata without payload for key '{}', treating as miss", key);
            ReadOutcome::Miss
        }
    }
}
