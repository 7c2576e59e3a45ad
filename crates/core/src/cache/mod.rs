//! SQLite-backed durable tier for the image URL cache.
//!
//! A small namespaced key-value table accessed through tokio-rusqlite. It
//! survives process restarts and is shared by every process pointing at the
//! same database file (last writer wins).

pub mod connection;
pub mod kv;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use kv::DurableStore;
