// shared/src/lib.rs

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("backend: {0}")]
    Backend(String),
    #[error("undecodable cache record: {0}")]
    Decode(String),
    #[error("key extension failed: {0}")]
    KeyExtension(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Cache entry lifetime in whole seconds, minimum 1.
/// The engine never persists anything with an unresolved TTL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtlSeconds(pub u64);

impl TtlSeconds {
    pub fn as_duration(self) -> std::time::Duration {
        std::time::Duration::from_secs(self.0)
    }
}

pub mod config;
