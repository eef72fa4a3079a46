use std::sync::Arc;

use async_trait::async_trait;
use axum::http::request::Parts;
use shared::Result;

/// Request-scoped key extension, e.g. folding a tenant id or auth scope into
/// the cache key so variants are cached separately.
///
/// A failing extender aborts the request pipeline; the cache is neither
/// consulted nor populated for that request.
#[async_trait]
pub trait KeyExtender: Send + Sync + 'static {
    async fn extend(&self, parts: &Parts) -> Result<String>;
}

/// Per-request cache controls, attached as a request extension by upstream
/// middleware or extractors.
#[derive(Clone, Default)]
pub struct CacheContext {
    /// Bypass the cache entirely for this request.
    pub disabled: bool,
    pub key_extender: Option<Arc<dyn KeyExtender>>,
}

/// The derived cache key, inserted into the request extensions so downstream
/// handlers can reference the entry they are producing.
#[derive(Clone, Debug)]
pub struct DerivedKey(pub String);
