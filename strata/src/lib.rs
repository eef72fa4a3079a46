pub mod domain;
pub mod invalidation;
pub mod key;
pub mod ports;
pub mod read;
pub mod store;
pub mod write;

#[cfg(test)]
pub(crate) mod testutil;
