//! View-count aggregation.
//!
//! Views are recorded locally and coalesced per entity; a timer periodically
//! commits the net deltas to the remote [`CountStore`](crate::CountStore).
//! A delta leaves the pending map only when a flush snapshot takes it, and a
//! failed commit adds it back, so a view is never dropped by a remote error.
//! Taken deltas stay in an in-flight map until settled; a cycle that ends
//! early puts whatever is left there back into the pending map.
//!
//! In [`FlushMode::ReadModifyWrite`] two independent batchers updating the
//! same row can interleave their read and write and lose an increment. Use
//! [`FlushMode::AtomicIncrement`] where the store offers an increment
//! procedure.

mod batcher;
mod listeners;

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use batcher::ViewCountBatcher;
pub use listeners::Subscription;

/// How a pending delta is committed to the remote store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FlushMode {
    /// Read the current count, add the delta, write the sum back.
    #[default]
    ReadModifyWrite,
    /// Ask the store to add the delta atomically.
    AtomicIncrement,
}

/// Batcher tuning.
#[derive(Debug, Clone)]
pub struct BatcherConfig {
    /// Entity ids committed concurrently per batch.
    pub batch_size: usize,
    /// Pause between batches.
    pub batch_delay: Duration,
    pub mode: FlushMode,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self { batch_size: 10, batch_delay: Duration::from_millis(100), mode: FlushMode::default() }
    }
}

/// Outcome of one flush cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FlushReport {
    /// Entity ids whose delta was committed.
    pub committed: usize,
    /// Views committed across all ids.
    pub views_committed: u64,
    /// Entity ids whose delta was put back for the next cycle.
    pub requeued: usize,
    /// Number of batches processed.
    pub batches: usize,
}

/// Point-in-time batcher counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BatcherStats {
    pub pending_ids: usize,
    pub pending_views: u64,
    /// Views taken by a running flush and not yet committed or requeued.
    pub in_flight_views: u64,
    /// Timer firings since construction.
    pub ticks: u64,
    /// Flush cycles that processed at least one id.
    pub flush_cycles: u64,
    pub committed: u64,
    pub requeued: u64,
    pub listeners: usize,
}
