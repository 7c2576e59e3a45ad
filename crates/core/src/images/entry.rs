//! Cached URL entries and per-tier lookup results.

use serde::{Deserialize, Serialize};

/// A URL with the instant (epoch ms) after which it must not be served.
///
/// Entries are never mutated; a refresh replaces the whole entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub url: String,
    #[serde(rename = "expires")]
    pub expires_at_ms: i64,
}

impl CacheEntry {
    pub fn new(url: impl Into<String>, expires_at_ms: i64) -> Self {
        Self { url: url.into(), expires_at_ms }
    }

    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        now_ms < self.expires_at_ms
    }

    /// Decode a durable-tier payload.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// What one cache tier had for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierLookup {
    Hit(CacheEntry),
    Miss,
    Expired,
    /// The stored payload could not be decoded.
    Corrupt,
}

impl TierLookup {
    pub(crate) fn check(entry: Option<&CacheEntry>, now_ms: i64) -> Self {
        match entry {
            Some(entry) if entry.is_valid_at(now_ms) => TierLookup::Hit(entry.clone()),
            Some(_) => TierLookup::Expired,
            None => TierLookup::Miss,
        }
    }

    pub(crate) fn decode(raw: Option<&str>, now_ms: i64) -> Self {
        match raw.map(CacheEntry::from_json) {
            None => TierLookup::Miss,
            Some(Ok(entry)) => TierLookup::check(Some(&entry), now_ms),
            Some(Err(_)) => TierLookup::Corrupt,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TierLookup::Hit(_) => "hit",
            TierLookup::Miss => "miss",
            TierLookup::Expired => "expired",
            TierLookup::Corrupt => "corrupt",
        }
    }
}
