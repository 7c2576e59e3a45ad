//! record_view tool implementation.
//!
//! Records views in the batcher; nothing is written remotely until the next flush.

use petrank_core::ViewCountBatcher;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ToolError, require_non_empty};
use crate::tools::json_result;

const MAX_VIEWS_PER_CALL: u32 = 1_000;

/// Parameters for the record_view tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecordViewParams {
    /// Entity (pet upload) that was viewed.
    pub entity_id: String,

    /// Number of views to record (default: 1, max: 1000).
    #[serde(default = "default_views")]
    pub views: u32,
}

fn default_views() -> u32 {
    1
}

/// Output from the record_view tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecordViewOutput {
    pub entity_id: String,
    /// Views waiting for the next flush, including these.
    pub pending: u64,
}

pub fn record_impl(batcher: &ViewCountBatcher, params: RecordViewParams) -> Result<CallToolResult, McpError> {
    require_non_empty("entity_id", &params.entity_id)?;
    if params.views == 0 || params.views > MAX_VIEWS_PER_CALL {
        return Err(ToolError::InvalidInput(format!("views must be between 1 and {MAX_VIEWS_PER_CALL}")).into());
    }

    batcher.record_views(&params.entity_id, u64::from(params.views));

    let output = RecordViewOutput { pending: batcher.pending_count(&params.entity_id), entity_id: params.entity_id };
    json_result(&output)
}
