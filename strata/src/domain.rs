use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use shared::{Error, Result};

/// Suffix of the payload record belonging to a metadata record.
/// The two records share one TTL and are always written and purged together.
pub const DATA_SUFFIX: &str = "-d";

pub const X_CACHE_EXPIRE: &str = "x-cache-expire";
pub const X_CACHE_TIMEOUT: &str = "x-cache-timeout";
pub const X_CACHE_HIT: &str = "x-cache-hit";
pub const CACHE_CONTROL: &str = "cache-control";
pub const ETAG: &str = "etag";
pub const IF_NONE_MATCH: &str = "if-none-match";
pub const CONTENT_ENCODING: &str = "content-encoding";

/// Store key of the payload record for `key`.
pub fn data_key(key: &str) -> String {
    format!("{key}{DATA_SUFFIX}")
}

/// Cached response metadata, persisted as JSON under the cache key itself.
/// Header names are lowercase; the body lives in the sibling payload record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub encoding: Option<String>,
}

impl ResponseMetadata {
    pub fn to_bytes(&self) -> Result<Bytes> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(|e| Error::Decode(e.to_string()))
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        serde_json::from_slice(raw).map_err(|e| Error::Decode(e.to_string()))
    }
}

/// Snapshot of a completed origin response, taken by the capture hook once
/// the full body is known.
#[derive(Clone, Debug)]
pub struct CapturedResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl CapturedResponse {
    /// Split into the body-stripped metadata record and the payload bytes.
    pub fn into_records(self) -> (ResponseMetadata, Bytes) {
        let encoding = self.headers.get(CONTENT_ENCODING).cloned();
        (
            ResponseMetadata {
                status: self.status,
                headers: self.headers,
                encoding,
            },
            self.body,
        )
    }
}
