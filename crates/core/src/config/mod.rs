//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (PETRANK_*)
//! 2. TOML config file (if PETRANK_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::images::ImageCacheConfig;
use crate::views::{BatcherConfig, FlushMode};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (PETRANK_*)
/// 2. TOML config file (if PETRANK_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the managed backend (row store and object storage).
    ///
    /// Set via PETRANK_REMOTE_URL environment variable.
    #[serde(default)]
    pub remote_url: Option<String>,

    /// API key sent with every backend request.
    ///
    /// Set via PETRANK_REMOTE_API_KEY environment variable.
    #[serde(default)]
    pub remote_api_key: Option<String>,

    /// Path to the SQLite database backing the durable URL cache.
    ///
    /// Set via PETRANK_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Table holding the view counters.
    #[serde(default = "default_count_table")]
    pub count_table: String,

    /// Column holding the view counter.
    #[serde(default = "default_count_column")]
    pub count_column: String,

    /// Stored procedure used by the `atomic_increment` flush mode.
    #[serde(default = "default_increment_rpc")]
    pub increment_rpc: String,

    /// How pending views are committed.
    ///
    /// Set via PETRANK_FLUSH_MODE (`read_modify_write` or `atomic_increment`).
    #[serde(default)]
    pub flush_mode: FlushMode,

    /// Interval between automatic flushes in milliseconds.
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Entity ids committed concurrently per flush batch.
    #[serde(default = "default_flush_batch_size")]
    pub flush_batch_size: usize,

    /// Pause between flush batches in milliseconds.
    #[serde(default = "default_batch_delay_ms")]
    pub flush_batch_delay_ms: u64,

    /// Object storage bucket holding the images.
    #[serde(default = "default_storage_bucket")]
    pub storage_bucket: String,

    /// Whether the bucket is publicly readable, enabling public URLs.
    #[serde(default = "default_true")]
    pub public_bucket: bool,

    /// How long a signed URL is considered fresh locally, in hours.
    #[serde(default = "default_image_expiry_hours")]
    pub image_expiry_hours: u32,

    /// Validity requested for signed URLs, in seconds.
    #[serde(default = "default_signed_url_ttl_secs")]
    pub signed_url_ttl_secs: u64,

    /// Re-derivation window for memoized public URLs, in seconds.
    #[serde(default = "default_public_url_memo_secs")]
    pub public_url_memo_secs: u64,

    /// Items resolved concurrently per prefetch batch.
    #[serde(default = "default_prefetch_batch_size")]
    pub prefetch_batch_size: usize,

    /// Pause between prefetch batches in milliseconds.
    #[serde(default = "default_batch_delay_ms")]
    pub prefetch_batch_delay_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./petrank-cache.sqlite")
}

fn default_user_agent() -> String {
    "petrank/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_count_table() -> String {
    "pet_uploads".into()
}

fn default_count_column() -> String {
    "view_count".into()
}

fn default_increment_rpc() -> String {
    "increment_pet_view_count".into()
}

fn default_flush_interval_ms() -> u64 {
    300_000 // 5 minutes
}

fn default_flush_batch_size() -> usize {
    10
}

fn default_batch_delay_ms() -> u64 {
    100
}

fn default_storage_bucket() -> String {
    "pet-images".into()
}

fn default_true() -> bool {
    true
}

fn default_image_expiry_hours() -> u32 {
    12
}

fn default_signed_url_ttl_secs() -> u64 {
    86_400 // 24 hours, the storage maximum
}

fn default_public_url_memo_secs() -> u64 {
    3_600
}

fn default_prefetch_batch_size() -> usize {
    5
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            remote_url: None,
            remote_api_key: None,
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            count_table: default_count_table(),
            count_column: default_count_column(),
            increment_rpc: default_increment_rpc(),
            flush_mode: FlushMode::default(),
            flush_interval_ms: default_flush_interval_ms(),
            flush_batch_size: default_flush_batch_size(),
            flush_batch_delay_ms: default_batch_delay_ms(),
            storage_bucket: default_storage_bucket(),
            public_bucket: true,
            image_expiry_hours: default_image_expiry_hours(),
            signed_url_ttl_secs: default_signed_url_ttl_secs(),
            public_url_memo_secs: default_public_url_memo_secs(),
            prefetch_batch_size: default_prefetch_batch_size(),
            prefetch_batch_delay_ms: default_batch_delay_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Automatic flush interval.
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    /// Settings for the view-count batcher.
    pub fn batcher_config(&self) -> BatcherConfig {
        BatcherConfig {
            batch_size: self.flush_batch_size,
            batch_delay: Duration::from_millis(self.flush_batch_delay_ms),
            mode: self.flush_mode,
        }
    }

    /// Settings for the image URL cache.
    pub fn image_cache_config(&self) -> ImageCacheConfig {
        ImageCacheConfig {
            default_expiry_hours: self.image_expiry_hours,
            signed_url_ttl: Duration::from_secs(self.signed_url_ttl_secs),
            public_url_memo: Duration::from_secs(self.public_url_memo_secs),
            prefer_public_urls: self.public_bucket,
            prefetch_batch_size: self.prefetch_batch_size,
            prefetch_batch_delay: Duration::from_millis(self.prefetch_batch_delay_ms),
            ..Default::default()
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `PETRANK_`
    /// 2. TOML file from `PETRANK_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("PETRANK_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("PETRANK_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Backend URL and API key, required before any remote client is built.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if either value is not set.
    pub fn require_remote(&self) -> Result<(&str, &str), ConfigError> {
        let url = self.remote_url.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "remote_url".into(),
            hint: "Set PETRANK_REMOTE_URL environment variable".into(),
        })?;
        let key = self.remote_api_key.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "remote_api_key".into(),
            hint: "Set PETRANK_REMOTE_API_KEY environment variable".into(),
        })?;
        Ok((url, key))
    }
}
