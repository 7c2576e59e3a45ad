//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the gallery components.
use petrank_core::{CacheDb, ImageUrlCache, ViewCountBatcher};

use crate::tools::{
    ImageUrlParams, PrefetchImagesParams, PurgeImageCacheParams, RecordViewParams, ViewCountParams, flush_impl,
    image_url_impl, prefetch_impl, purge_impl, record_impl, view_count_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for petrank-mcp.
#[derive(Clone)]
pub struct PetrankServer {
    tool_router: ToolRouter<Self>,
    batcher: ViewCountBatcher,
    images: ImageUrlCache,
    db: CacheDb,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl PetrankServer {
    /// Create a new server handler over already-wired components.
    pub fn new(batcher: ViewCountBatcher, images: ImageUrlCache, db: CacheDb) -> Self {
        Self { tool_router: Self::tool_router(), batcher, images, db }
    }

    #[tool(description = "Record views of a pet upload. Views are batched and written to the backend on the next flush.")]
    async fn record_view(&self, params: Parameters<RecordViewParams>) -> Result<CallToolResult, McpError> {
        record_impl(&self.batcher, params.0)
    }

    #[tool(description = "Get the current view count of a pet upload, including views not yet flushed.")]
    async fn view_count(&self, params: Parameters<ViewCountParams>) -> Result<CallToolResult, McpError> {
        view_count_impl(&self.batcher, params.0).await
    }

    #[tool(description = "Flush pending view counts to the backend now. Returns the flush report and batcher stats.")]
    async fn flush_views(&self) -> Result<CallToolResult, McpError> {
        flush_impl(&self.batcher).await
    }

    /// Resolve a displayable URL for a stored image.
    ///
    /// Public URLs are preferred when the bucket allows it; otherwise a cached
    /// signed URL is reused until its local expiry.
    #[tool(
        description = "Get a usable URL for a pet image. Uses a public URL when available, otherwise a cached or newly signed URL."
    )]
    async fn image_url(&self, params: Parameters<ImageUrlParams>) -> Result<CallToolResult, McpError> {
        image_url_impl(&self.images, params.0).await
    }

    #[tool(description = "Resolve and cache URLs for many pet images in rate-limited batches.")]
    async fn prefetch_images(&self, params: Parameters<PrefetchImagesParams>) -> Result<CallToolResult, McpError> {
        prefetch_impl(&self.images, params.0).await
    }

    #[tool(description = "Drop cached image URLs for one pet upload, or for all of them when entity_id is omitted.")]
    async fn purge_image_cache(&self, params: Parameters<PurgeImageCacheParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.images, &self.db, params.0).await
    }
}

impl ServerHandler for PetrankServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "petrank-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::fixture;

    #[tokio::test]
    async fn test_lists_all_tools() {
        let fx = fixture(false).await;
        let server = PetrankServer::new(fx.batcher, fx.images, fx.db);

        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            ["flush_views", "image_url", "prefetch_images", "purge_image_cache", "record_view", "view_count"]
        );
    }

    #[tokio::test]
    async fn test_server_info() {
        let fx = fixture(false).await;
        let info = PetrankServer::new(fx.batcher, fx.images, fx.db).get_info();
        assert_eq!(info.server_info.name, "petrank-mcp");
        assert!(info.capabilities.tools.is_some());
    }
}
