//! petrank-mcp server entry point.
//!
//! Boots the gallery components and serves them as MCP tools on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use petrank_client::{RestCountStore, StorageClient};
use petrank_core::{AppConfig, CacheDb, ImageUrlCache, ViewCountBatcher};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

const SHUTDOWN_FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    config.require_remote()?;

    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening cache database {}", config.db_path.display()))?;
    let counts = RestCountStore::from_config(&config)?;
    let storage = StorageClient::from_config(&config)?;

    let batcher = ViewCountBatcher::new(Arc::new(counts), config.batcher_config());
    let _flush_log = batcher.add_listener(|entity_id, count| {
        tracing::debug!(entity_id, count, "view count updated");
    });
    batcher.start_batching(config.flush_interval());

    let images = ImageUrlCache::new(Arc::new(storage), Arc::new(db.clone()), config.image_cache_config());

    tracing::info!(
        flush_interval_ms = config.flush_interval_ms,
        flush_mode = ?config.flush_mode,
        bucket = %config.storage_bucket,
        "Starting petrank-mcp server on stdio transport"
    );

    let handler = handler::PetrankServer::new(batcher.clone(), images, db);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    match tokio::time::timeout(SHUTDOWN_FLUSH_TIMEOUT, batcher.shutdown()).await {
        Ok(Some(report)) => tracing::info!(
            committed = report.committed,
            requeued = report.requeued,
            "flushed pending views on shutdown"
        ),
        Ok(None) => tracing::info!("no pending views on shutdown"),
        Err(_) => {
            let stats = batcher.stats();
            tracing::warn!(
                pending_views = stats.pending_views,
                in_flight_views = stats.in_flight_views,
                "timed out flushing views on shutdown, unflushed views are dropped"
            );
        }
    }

    Ok(())
}
