//! Remote services the gallery core depends on.
//!
//! Implementations live in `petrank-client`; tests provide in-memory fakes.

use std::time::Duration;

use crate::Error;

/// Row-level access to the view counters.
///
/// There is no compare-and-swap: a read followed by a write can race with
/// another writer updating the same row.
#[async_trait::async_trait]
pub trait CountStore: Send + Sync {
    /// Current authoritative count for `entity_id`. A null count reads as 0.
    async fn read_count(&self, entity_id: &str) -> Result<u64, Error>;

    /// Overwrite the count for `entity_id`.
    async fn write_count(&self, entity_id: &str, count: u64) -> Result<(), Error>;

    /// Atomically add `by` to the count and return the new value.
    async fn increment_count(&self, entity_id: &str, by: u64) -> Result<u64, Error> {
        let _ = by;
        Err(Error::Unsupported(format!("atomic increment for {entity_id}")))
    }
}

/// Object storage issuing access URLs for stored images.
#[async_trait::async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Non-expiring URL for `resource_path`, if the object is publicly readable.
    fn public_url(&self, resource_path: &str) -> Option<String>;

    /// Issue a bearer URL valid for `ttl` on the storage side.
    async fn issue_signed_url(&self, resource_path: &str, ttl: Duration) -> Result<String, Error>;
}
