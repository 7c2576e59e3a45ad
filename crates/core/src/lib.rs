//! Core types and shared functionality for petrank.
//!
//! This crate provides:
//! - The view-count batcher that coalesces view events into remote writes
//! - The layered image URL cache (public, memory, durable, signed)
//! - The SQLite durable store backing that cache
//! - Remote service traits, unified error types and configuration

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod images;
pub mod remote;
pub mod views;

pub use cache::{CacheDb, DurableStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use images::{ImageCacheConfig, ImageRef, ImageUrlCache, PrefetchReport, ResolvedUrl, UrlSource};
pub use remote::{CountStore, ObjectStorage};
pub use views::{BatcherConfig, BatcherStats, FlushMode, FlushReport, Subscription, ViewCountBatcher};
