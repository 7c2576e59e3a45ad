//! Layered cache of image access URLs.
//!
//! Resolution order for one image:
//!
//! 1. Public URL derived from the resource path (memoized per entity).
//! 2. In-process memory tier.
//! 3. Durable tier, which survives restarts and repopulates memory on a hit.
//! 4. A freshly issued signed URL, stored in both tiers.
//!
//! The local freshness window (`expiry_hours`) is deliberately shorter than
//! the signed URL's validity on the storage side, so a cached URL is
//! refreshed well before the storage service stops honouring it.

mod entry;
mod url_cache;

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use entry::{CacheEntry, TierLookup};
pub use url_cache::ImageUrlCache;

/// Image cache tuning.
#[derive(Debug, Clone)]
pub struct ImageCacheConfig {
    /// Local freshness window used when the caller does not pass one.
    pub default_expiry_hours: u32,
    /// Validity requested from the storage service for signed URLs.
    pub signed_url_ttl: Duration,
    /// How long a derived public URL is reused before deriving it again.
    pub public_url_memo: Duration,
    /// Try the public URL before any other tier.
    pub prefer_public_urls: bool,
    /// Namespace for durable keys.
    pub key_prefix: String,
    pub prefetch_batch_size: usize,
    pub prefetch_batch_delay: Duration,
}

impl Default for ImageCacheConfig {
    fn default() -> Self {
        Self {
            default_expiry_hours: 12,
            signed_url_ttl: Duration::from_secs(24 * 60 * 60),
            public_url_memo: Duration::from_secs(60 * 60),
            prefer_public_urls: true,
            key_prefix: "pet_image_".to_string(),
            prefetch_batch_size: 5,
            prefetch_batch_delay: Duration::from_millis(100),
        }
    }
}

/// An image to resolve: where it is stored and which entity it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImageRef {
    pub resource_path: String,
    pub entity_id: String,
}

impl ImageRef {
    pub fn new(resource_path: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self { resource_path: resource_path.into(), entity_id: entity_id.into() }
    }
}

/// Which tier produced a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UrlSource {
    Public,
    Memory,
    Durable,
    Signed,
}

/// A usable URL and the tier that answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResolvedUrl {
    pub url: String,
    pub source: UrlSource,
}

/// Outcome of a prefetch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PrefetchReport {
    pub requested: usize,
    pub resolved: usize,
    pub unavailable: usize,
    /// Items without a resource path or entity id.
    pub skipped: usize,
}
