use std::time::Duration;
use tracing::warn;

/// Tuning for the fallback in-memory store, used when the caller wires up no
/// backends of their own.
pub struct StoreDefaults {
    pub max_entries: u64,
    pub default_ttl: Duration,
}

impl StoreDefaults {
    const DEFAULT_MAX_ENTRIES: u64 = 1000;
    const DEFAULT_TTL_SECS: u64 = 30;

    pub fn from_env() -> Self {
        Self {
            max_entries: env_u64("STRATA_STORE_MAX_ENTRIES", Self::DEFAULT_MAX_ENTRIES),
            default_ttl: Duration::from_secs(env_u64(
                "STRATA_STORE_DEFAULT_TTL_SECS",
                Self::DEFAULT_TTL_SECS,
            )),
        }
    }
}

impl Default for StoreDefaults {
    fn default() -> Self {
        Self {
            max_entries: Self::DEFAULT_MAX_ENTRIES,
            default_ttl: Duration::from_secs(Self::DEFAULT_TTL_SECS),
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
            warn!("{} is not a valid integer, falling back to {}", name, default);
            default
        }),
        Err(_) => default,
    }
}
