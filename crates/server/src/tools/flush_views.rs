//! flush_views tool implementation.
//!
//! Runs a flush cycle now instead of waiting for the timer.

use petrank_core::{BatcherStats, FlushReport, ViewCountBatcher};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Output from the flush_views tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FlushViewsOutput {
    /// False when nothing was pending or another flush was already running.
    pub flushed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<FlushReport>,
    pub stats: BatcherStats,
}

pub async fn flush_impl(batcher: &ViewCountBatcher) -> Result<CallToolResult, McpError> {
    let report = batcher.flush_updates().await;
    let output = FlushViewsOutput { flushed: report.is_some(), report, stats: batcher.stats() };
    json_result(&output)
}
