//! prefetch_images tool implementation.
//!
//! Warms the image URL cache for a list of images, either inline or in the
//! background.

use petrank_core::{ImageRef, ImageUrlCache, PrefetchReport};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::tools::json_result;

const MAX_ITEMS: usize = 500;

/// Parameters for the prefetch_images tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PrefetchImagesParams {
    /// Images to resolve (max: 500).
    pub items: Vec<ImageRef>,

    /// Return immediately and resolve in the background (default: false).
    #[serde(default)]
    pub background: bool,
}

/// Output from the prefetch_images tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum PrefetchImagesOutput {
    Finished(PrefetchReport),
    Scheduled { scheduled: usize },
}

pub async fn prefetch_impl(images: &ImageUrlCache, params: PrefetchImagesParams) -> Result<CallToolResult, McpError> {
    if params.items.is_empty() {
        return Err(ToolError::InvalidInput("items cannot be empty".into()).into());
    }
    if params.items.len() > MAX_ITEMS {
        return Err(ToolError::InvalidInput(format!("at most {MAX_ITEMS} items per call")).into());
    }

    let output = if params.background {
        let scheduled = params.items.len();
        // The handle is dropped; the task keeps running.
        images.spawn_prefetch(params.items);
        PrefetchImagesOutput::Scheduled { scheduled }
    } else {
        PrefetchImagesOutput::Finished(images.prefetch_image_urls(&params.items).await)
    };
    json_result(&output)
}
