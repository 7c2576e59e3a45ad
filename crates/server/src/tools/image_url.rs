//! image_url tool implementation.
//!
//! Resolves a usable URL for a stored image through the public, memory,
//! durable and signed tiers.

use petrank_core::{ImageUrlCache, UrlSource};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ToolError, require_non_empty};
use crate::tools::json_result;

/// Parameters for the image_url tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ImageUrlParams {
    /// Object path inside the storage bucket.
    pub resource_path: String,

    /// Entity (pet upload) the image belongs to; used as the cache key.
    pub entity_id: String,

    /// How long a newly signed URL is reused locally, in hours (default: 12).
    /// Capped at the lifetime of the signed URL itself.
    #[serde(default)]
    pub expiry_hours: Option<u32>,

    /// Drop cached URLs for this entity before resolving.
    #[serde(default)]
    pub refresh: bool,
}

/// Output from the image_url tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ImageUrlOutput {
    pub entity_id: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<UrlSource>,
}

pub async fn image_url_impl(images: &ImageUrlCache, params: ImageUrlParams) -> Result<CallToolResult, McpError> {
    require_non_empty("resource_path", &params.resource_path)?;
    require_non_empty("entity_id", &params.entity_id)?;
    if params.expiry_hours == Some(0) {
        return Err(ToolError::InvalidInput("expiry_hours must be greater than 0".into()).into());
    }

    if params.refresh {
        images.invalidate(&params.entity_id).await;
    }

    let resolved = images
        .resolve(&params.resource_path, &params.entity_id, params.expiry_hours)
        .await;

    let output = match resolved {
        Some(resolved) => ImageUrlOutput {
            entity_id: params.entity_id,
            available: true,
            url: Some(resolved.url),
            source: Some(resolved.source),
        },
        None => ImageUrlOutput { entity_id: params.entity_id, available: false, url: None, source: None },
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{fixture, output};

    fn params(resource_path: &str, entity_id: &str) -> ImageUrlParams {
        ImageUrlParams {
            resource_path: resource_path.into(),
            entity_id: entity_id.into(),
            expiry_hours: None,
            refresh: false,
        }
    }

    #[tokio::test]
    async fn test_signed_then_memory() {
        let fx = fixture(false).await;

        let first: ImageUrlOutput = output(&image_url_impl(&fx.images, params("uploads/a.png", "p1")).await.unwrap());
        assert!(first.available);
        assert_eq!(first.source, Some(UrlSource::Signed));
        assert_eq!(first.url.as_deref(), Some("https://cdn.test/sign/uploads/a.png?token=1"));

        let second: ImageUrlOutput =
            output(&image_url_impl(&fx.images, params("uploads/a.png", "p1")).await.unwrap());
        assert_eq!(second.source, Some(UrlSource::Memory));
        assert_eq!(second.url, first.url);
        assert_eq!(*fx.storage.signed.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_refresh_signs_again() {
        let fx = fixture(false).await;
        image_url_impl(&fx.images, params("uploads/a.png", "p1")).await.unwrap();

        let refreshed = ImageUrlParams { refresh: true, ..params("uploads/a.png", "p1") };
        let out: ImageUrlOutput = output(&image_url_impl(&fx.images, refreshed).await.unwrap());
        assert_eq!(out.source, Some(UrlSource::Signed));
        assert_eq!(*fx.storage.signed.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_public_bucket() {
        let fx = fixture(true).await;
        let out: ImageUrlOutput = output(&image_url_impl(&fx.images, params("uploads/a.png", "p1")).await.unwrap());
        assert_eq!(out.source, Some(UrlSource::Public));
        assert_eq!(out.url.as_deref(), Some("https://cdn.test/public/uploads/a.png"));
    }

    #[tokio::test]
    async fn test_unavailable_image() {
        let fx = fixture(false).await;
        let out: ImageUrlOutput =
            output(&image_url_impl(&fx.images, params("missing/a.png", "p1")).await.unwrap());
        assert!(!out.available);
        assert!(out.url.is_none());
    }

    #[tokio::test]
    async fn test_rejects_bad_input() {
        let fx = fixture(false).await;
        assert!(image_url_impl(&fx.images, params("", "p1")).await.is_err());
        assert!(image_url_impl(&fx.images, params("uploads/a.png", "")).await.is_err());

        let zero = ImageUrlParams { expiry_hours: Some(0), ..params("uploads/a.png", "p1") };
        assert!(image_url_impl(&fx.images, zero).await.is_err());
    }
}
