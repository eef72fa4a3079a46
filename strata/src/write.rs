use std::collections::BTreeMap;

use headers::{CacheControl, Header};
use http::HeaderValue;
use rand::{Rng, distr::Alphanumeric};
use shared::TtlSeconds;
use tracing::{debug, warn};

use crate::domain::{CACHE_CONTROL, CapturedResponse, ETAG, X_CACHE_EXPIRE, X_CACHE_TIMEOUT, data_key};
use crate::invalidation;
use crate::store::TieredStore;

/// What the capture hook should do with a completed response.
#[derive(Debug, PartialEq, Eq)]
pub enum WriteDecision {
    /// Not cacheable; do nothing.
    Skip,
    /// The response carries an expiration directive; purge matching keys
    /// instead of storing. Expiration and caching are mutually exclusive.
    Invalidate(String),
    Store { ttl: TtlSeconds },
}

/// Evaluate the write-path rules in order: 304 responses carry no new
/// representation, an expiration directive wins over caching, and without a
/// resolvable TTL the response is deliberately not cached.
pub fn decide(status: u16, headers: &BTreeMap<String, String>) -> WriteDecision {
    if status == 304 {
        return WriteDecision::Skip;
    }
    if let Some(directive) = headers.get(X_CACHE_EXPIRE) {
        return WriteDecision::Invalidate(directive.clone());
    }
    match resolve_ttl(headers) {
        Some(ttl) => WriteDecision::Store { ttl },
        None => WriteDecision::Skip,
    }
}

/// TTL in whole seconds: `cache-control` max-age first, `x-cache-timeout`
/// as the fallback. `None` means the response is not cached.
pub fn resolve_ttl(headers: &BTreeMap<String, String>) -> Option<TtlSeconds> {
    let mut ttl = headers
        .get(CACHE_CONTROL)
        .and_then(|value| max_age_seconds(value))
        .unwrap_or(0);
    if ttl == 0 {
        ttl = headers
            .get(X_CACHE_TIMEOUT)
            .and_then(|value| timeout_seconds(value))
            .unwrap_or(0);
    }
    (ttl > 0).then_some(TtlSeconds(ttl))
}

fn max_age_seconds(value: &str) -> Option<u64> {
    let value = HeaderValue::from_str(value).ok()?;
    let parsed = CacheControl::decode(&mut std::iter::once(&value)).ok()?;
    parsed.max_age().map(|age| age.as_secs())
}

/// Human-readable duration ("1 minute"), clamped to a minimum of one second.
fn timeout_seconds(value: &str) -> Option<u64> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let duration = humantime::parse_duration(&compact).ok()?;
    Some(duration.as_secs().max(1))
}

/// Opaque random validator. It only gates conditional revalidation for this
/// key, so collisions are immaterial.
fn synthesize_etag() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(14)
        .map(char::from)
        .collect()
}

/// Fill in the validators downstream caches expect on a cacheable response:
/// a `cache-control` directive consistent with the resolved TTL, and an etag.
pub fn ensure_validators(headers: &mut BTreeMap<String, String>, ttl: TtlSeconds) {
    headers
        .entry(CACHE_CONTROL.to_string())
        .or_insert_with(|| format!("private, no-cache, max-age={}", ttl.0));
    headers.entry(ETAG.to_string()).or_insert_with(synthesize_etag);
}

/// Capture-hook entry point. Runs after the client already holds the
/// response, so failures only degrade future cache effectiveness.
pub async fn process(store: &TieredStore, key: &str, captured: CapturedResponse) {
    match decide(captured.status, &captured.headers) {
        WriteDecision::Skip => {}
        WriteDecision::Invalidate(directive) => invalidation::purge(store, &directive).await,
        WriteDecision::Store { ttl } => persist(store, key, captured, ttl).await,
    }
}

/// Persist the payload record first, then the body-stripped metadata record,
/// both under the same TTL. The ordering keeps a metadata record from ever
/// pointing at a payload that was never written.
async fn persist(store: &TieredStore, key: &str, mut captured: CapturedResponse, ttl: TtlSeconds) {
    ensure_validators(&mut captured.headers, ttl);
    let (metadata, body) = captured.into_records();
    match metadata.to_bytes() {
        Ok(raw) => {
            store.write(&data_key(key), body, ttl).await;
            store.write(key, raw, ttl).await;
            debug!("cached response for key '{}' with ttl {}s", key, ttl.0);
        }
        Err(err) => warn!("failed to serialize metadata for key '{}': {}", key, err),
    }
}
