use tracing::warn;

use crate::domain::data_key;
use crate::store::TieredStore;

/// Expand a comma-separated expiration directive into concrete patterns.
///
/// An exact pattern must purge both records of the pair, so it expands into
/// itself plus its payload twin; a wildcard pattern already covers any
/// suffix and is left as-is. All whitespace in the directive is ignored.
pub fn expand_patterns(directive: &str) -> Vec<String> {
    let compact: String = directive.chars().filter(|c| !c.is_whitespace()).collect();
    let mut patterns = Vec::new();
    for pattern in compact.split(',').filter(|p| !p.is_empty()) {
        patterns.push(pattern.to_string());
        if !pattern.ends_with('*') {
            patterns.push(data_key(pattern));
        }
    }
    patterns
}

/// Delete every key matching the directive, tier by tier, best effort.
/// A failing pattern or tier never aborts the rest.
pub async fn purge(store: &TieredStore, directive: &str) {
    for pattern in expand_patterns(directive) {
        for tier in store.tiers() {
            let keys = match tier.keys_matching(&pattern).await {
                Ok(keys) => keys,
                Err(err) => {
                    warn!("key enumeration failed for pattern '{}': {}", pattern, err);
                    continue;
                }
            };
            if keys.is_empty() {
                continue;
            }
            if let Err(err) = tier.delete(&keys).await {
                warn!("cache invalidation failed for pattern '{}': {}", pattern, err);
            }
        }
    }
}
