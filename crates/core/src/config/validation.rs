//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - `flush_interval_ms` is less than 100ms
    /// - either batch size is 0
    /// - `image_expiry_hours` is 0 or not shorter than `signed_url_ttl_secs`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.flush_interval_ms < 100 {
            return Err(ConfigError::Invalid {
                field: "flush_interval_ms".into(),
                reason: "must be at least 100ms".into(),
            });
        }

        if self.flush_batch_size == 0 {
            return Err(ConfigError::Invalid {
                field: "flush_batch_size".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.prefetch_batch_size == 0 {
            return Err(ConfigError::Invalid {
                field: "prefetch_batch_size".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.image_expiry_hours == 0 {
            return Err(ConfigError::Invalid {
                field: "image_expiry_hours".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if u64::from(self.image_expiry_hours) * 3_600 >= self.signed_url_ttl_secs {
            return Err(ConfigError::Invalid {
                field: "image_expiry_hours".into(),
                reason: "must be shorter than signed_url_ttl_secs".into(),
            });
        }

        if self.remote_url.is_some() != self.remote_api_key.is_some() {
            tracing::warn!(
                has_url = self.remote_url.is_some(),
                has_key = self.remote_api_key.is_some(),
                "Only one of remote_url and remote_api_key is set; \
                 remote clients will refuse to start"
            );
        }

        Ok(())
    }
}
