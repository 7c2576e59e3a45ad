//! MCP tool implementations.
//!
//! This module contains all tools exposed by the petrank-mcp server.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

pub mod flush_views;
pub mod image_url;
pub mod prefetch_images;
pub mod purge_image_cache;
pub mod record_view;
pub mod view_count;

pub use flush_views::flush_impl;
pub use image_url::{ImageUrlParams, image_url_impl};
pub use prefetch_images::{PrefetchImagesParams, prefetch_impl};
pub use purge_image_cache::{PurgeImageCacheParams, purge_impl};
pub use record_view::{RecordViewParams, record_impl};
pub use view_count::{ViewCountParams, view_count_impl};

/// Wrap `output` as pretty-printed JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| ToolError::Output(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
