//! view_count tool implementation.
//!
//! Returns the optimistic count: the remote value plus views not yet flushed.

use petrank_core::ViewCountBatcher;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::require_non_empty;
use crate::tools::json_result;

/// Parameters for the view_count tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ViewCountParams {
    pub entity_id: String,
}

/// Output from the view_count tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ViewCountOutput {
    pub entity_id: String,
    /// Remote count plus pending views. Falls back to the pending views when
    /// the remote read fails.
    pub count: u64,
    pub pending: u64,
}

pub async fn view_count_impl(batcher: &ViewCountBatcher, params: ViewCountParams) -> Result<CallToolResult, McpError> {
    require_non_empty("entity_id", &params.entity_id)?;

    let count = batcher.get_optimistic_count(&params.entity_id).await;
    let pending = batcher.pending_count(&params.entity_id);

    json_result(&ViewCountOutput { entity_id: params.entity_id, count, pending })
}
