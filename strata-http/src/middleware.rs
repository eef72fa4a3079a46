use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderName, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use shared::config::StoreDefaults;
use storage_engine::MokaBackend;
use strata::domain::{IF_NONE_MATCH, ResponseMetadata, X_CACHE_HIT};
use strata::key::derive_key;
use strata::ports::CacheBackend;
use strata::read::{self, ReadOutcome};
use strata::store::TieredStore;
use strata::write;
use tracing::warn;

use crate::capture::buffer_response;
use crate::context::{CacheContext, DerivedKey};

/// Ordered backend tiers for the cache layer, fastest first.
pub struct CacheLayerConfig {
    pub stores: Vec<Arc<dyn CacheBackend>>,
}

/// A single bounded in-memory store, sized by [`StoreDefaults`].
impl Default for CacheLayerConfig {
    fn default() -> Self {
        let defaults = StoreDefaults::from_env();
        Self {
            stores: vec![Arc::new(MokaBackend::bounded(
                defaults.max_entries,
                Some(defaults.default_ttl),
            ))],
        }
    }
}

/// Shared state for the cache middleware.
#[derive(Clone)]
pub struct CacheState {
    store: TieredStore,
}

impl CacheState {
    pub fn new(config: CacheLayerConfig) -> Self {
        Self {
            store: TieredStore::new(config.stores),
        }
    }

    pub fn store(&self) -> &TieredStore {
        &self.store
    }
}

impl Default for CacheState {
    fn default() -> Self {
        Self::new(CacheLayerConfig::default())
    }
}

/// Read-through response cache middleware.
///
/// Wire up with `axum::middleware::from_fn_with_state(state, http_cache)`.
/// Responses opt into caching via `x-cache-timeout`/`cache-control` headers
/// and into invalidation via `x-cache-expire`; see the engine crate for the
/// decision rules.
pub async fn http_cache(
    State(state): State<CacheState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let context = request
        .extensions()
        .get::<CacheContext>()
        .cloned()
        .unwrap_or_default();
    if context.disabled {
        return Ok(next.run(request).await);
    }

    let (mut parts, body) = request.into_parts();

    let extension = match &context.key_extender {
        Some(extender) => match extender.extend(&parts).await {
            Ok(extension) => extension,
            Err(err) => {
                warn!("rejecting request, key extension failed: {}", err);
                return Err(
                    (StatusCode::INTERNAL_SERVER_ERROR, "cache key extension failed")
                        .into_response(),
                );
            }
        },
        None => String::new(),
    };

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| parts.uri.path());
    let key = derive_key(parts.method.as_str(), path_and_query, &extension);
    parts.extensions.insert(DerivedKey(key.clone()));

    let if_none_match = parts
        .headers
        .get(IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    match read::resolve(state.store(), &key, if_none_match.as_deref()).await {
        ReadOutcome::NotModified => Ok(not_modified()),
        ReadOutcome::Hit { metadata, payload } => Ok(replay(metadata, payload)),
        ReadOutcome::Miss => {
            let request = Request::from_parts(parts, body);
            let response = next.run(request).await;

            let (response, captured) = buffer_response(response).await;
            if let Some(captured) = captured {
                // Fire-and-forget: the client response is already final, so
                // persistence and invalidation must not delay it.
                let store = state.store().clone();
                tokio::spawn(async move {
                    write::process(&store, &key, captured).await;
                });
            }
            Ok(response)
        }
    }
}

fn not_modified() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NOT_MODIFIED;
    response
        .headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from_static("0"));
    response
}

/// Rebuild the stored response: status, every stored header, the hit marker,
/// then the payload bytes untouched.
fn replay(metadata: ResponseMetadata, payload: Bytes) -> Response {
    let mut response = Response::new(Body::from(payload));
    *response.status_mut() =
        StatusCode::from_u16(metadata.status).unwrap_or(StatusCode::OK);

    let headers = response.headers_mut();
    for (name, value) in &metadata.headers {
        let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
            continue;
        };
        let Ok(value) = HeaderValue::from_str(value) else {
            continue;
        };
        headers.insert(name, value);
    }
    headers.insert(
        HeaderName::from_static(X_CACHE_HIT),
        HeaderValue::from_static("1"),
    );

    response
}
