//! Configuration validation rules.
//!
//! This module provides validation logic for `GatewayConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::GatewayConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl GatewayConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `base_version` is empty or contains whitespace
    /// - `origin` is not an absolute http(s) URL with a host
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - a precache path is not absolute
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_version.is_empty() {
            return Err(ConfigError::Invalid { field: "base_version".into(), reason: "must not be empty".into() });
        }
        if self.base_version.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                field: "base_version".into(),
                reason: "must not contain whitespace".into(),
            });
        }

        match url::Url::parse(&self.origin) {
            Ok(parsed) => {
                if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
                    return Err(ConfigError::Invalid {
                        field: "origin".into(),
                        reason: "must be an absolute http(s) URL".into(),
                    });
                }
            }
            Err(e) => {
                return Err(ConfigError::Invalid { field: "origin".into(), reason: e.to_string() });
            }
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

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

        for path in &self.precache {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid {
                    field: "precache".into(),
                    reason: format!("manifest path {path:?} must be absolute"),
                });
            }
        }

        if self.max_namespace_entries == Some(0) {
            return Err(ConfigError::Invalid {
                field: "max_namespace_entries".into(),
                reason: "cap of 0 would evict every snapshot; unset it instead".into(),
            });
        }

        if self.trusted_hosts.is_empty() {
            tracing::warn!("trusted_hosts is empty; every cross-origin request will bypass the cache");
        }

        Ok(())
    }
}
