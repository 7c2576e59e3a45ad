//! Remote service clients for petrank.
//!
//! This crate provides reqwest-based implementations of the core's remote
//! traits: a PostgREST-style row store for view counters and an object
//! storage client issuing public and signed image URLs.

pub mod error;
pub mod http;
pub mod rest;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use error::RemoteError;
pub use http::{RemoteConfig, RemoteHttp};
pub use rest::RestCountStore;
pub use storage::StorageClient;
