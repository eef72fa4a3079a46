pub mod moka_backend;
pub mod sled_backend;

pub use moka_backend::MokaBackend;
pub use sled_backend::SledBackend;
