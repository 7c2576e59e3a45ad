//! purge_image_cache tool implementation.
//!
//! Drops cached image URLs for one entity, or all of them.

use petrank_core::{CacheDb, ImageUrlCache};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::require_non_empty;
use crate::tools::json_result;

/// Parameters for the purge_image_cache tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PurgeImageCacheParams {
    /// Only purge this entity. Omit to purge every cached image URL.
    #[serde(default)]
    pub entity_id: Option<String>,
}

/// Output from the purge_image_cache tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PurgeImageCacheOutput {
    /// In-process entries removed. Not reported for single-entity purges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_entries: Option<usize>,
    /// Durable rows removed. Not reported for single-entity purges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub durable_entries: Option<u64>,
}

pub async fn purge_impl(
    images: &ImageUrlCache, db: &CacheDb, params: PurgeImageCacheParams,
) -> Result<CallToolResult, McpError> {
    let output = match params.entity_id {
        Some(entity_id) => {
            require_non_empty("entity_id", &entity_id)?;
            images.invalidate(&entity_id).await;
            PurgeImageCacheOutput { memory_entries: None, durable_entries: None }
        }
        None => {
            let memory_entries = images.clear_memory();
            let durable_entries = db.purge_prefix(&images.config().key_prefix).await?;
            tracing::info!(memory_entries, durable_entries, "image url cache purged");
            PurgeImageCacheOutput { memory_entries: Some(memory_entries), durable_entries: Some(durable_entries) }
        }
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{fixture, output};
    use petrank_core::{DurableStore, UrlSource};

    #[tokio::test]
    async fn test_purge_everything() {
        let fx = fixture(false).await;
        fx.images.get_cached_image_url("uploads/a.png", "p1", None).await.unwrap();
        fx.images.get_cached_image_url("uploads/b.png", "p2", None).await.unwrap();
        fx.db.set("unrelated", "keep").await.unwrap();

        let result = purge_impl(&fx.images, &fx.db, PurgeImageCacheParams::default()).await.unwrap();
        let out: PurgeImageCacheOutput = output(&result);
        assert_eq!(out.memory_entries, Some(2));
        assert_eq!(out.durable_entries, Some(2));
        assert_eq!(fx.db.get("unrelated").await.unwrap().as_deref(), Some("keep"));

        let again = fx.images.resolve("uploads/a.png", "p1", None).await.unwrap();
        assert_eq!(again.source, UrlSource::Signed);
    }

    #[tokio::test]
    async fn test_purge_one_entity() {
        let fx = fixture(false).await;
        fx.images.get_cached_image_url("uploads/a.png", "p1", None).await.unwrap();
        fx.images.get_cached_image_url("uploads/b.png", "p2", None).await.unwrap();

        let params = PurgeImageCacheParams { entity_id: Some("p1".into()) };
        purge_impl(&fx.images, &fx.db, params).await.unwrap();

        assert!(fx.db.get("pet_image_p1").await.unwrap().is_none());
        let kept = fx.images.resolve("uploads/b.png", "p2", None).await.unwrap();
        assert_eq!(kept.source, UrlSource::Memory);
    }

    #[tokio::test]
    async fn test_purge_empty_entity_id() {
        let fx = fixture(false).await;
        let params = PurgeImageCacheParams { entity_id: Some(String::new()) };
        assert!(purge_impl(&fx.images, &fx.db, params).await.is_err());
    }
}
