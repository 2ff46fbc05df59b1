//! The node configuration schema.

use fedgate_cache::{CacheBackendKind, CacheConfig};
use fedgate_metadata::MetadataConfig;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Token issuing/verification settings for one exchange direction.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenDirectionConfig {
    /// Issuer name stamped into minted tokens.
    pub issuer: String,

    /// Shared secret binding tokens to this direction.
    ///
    /// For production deployments prefer the environment override
    /// (`FEDGATE__CORRELATION__REQUEST__SECRET`) over the file.
    pub secret: String,
}

impl Default for TokenDirectionConfig {
    fn default() -> Self {
        Self {
            issuer: String::new(),
            secret: String::new(),
        }
    }
}

impl TokenDirectionConfig {
    fn validate(&self, direction: &str) -> Result<(), ConfigError> {
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::validation(format!(
                "correlation.{direction}.issuer must not be blank"
            )));
        }
        if self.issuer.contains('|') {
            return Err(ConfigError::validation(format!(
                "correlation.{direction}.issuer must not contain '|'"
            )));
        }
        if self.secret.trim().is_empty() {
            return Err(ConfigError::validation(format!(
                "correlation.{direction}.secret must not be blank"
            )));
        }
        Ok(())
    }
}

/// Correlation settings: one token direction for pending requests, one
/// for pending responses.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Request-direction token settings.
    pub request: TokenDirectionConfig,

    /// Response-direction token settings.
    pub response: TokenDirectionConfig,
}

/// Root configuration of a fedgate node.
///
/// # Example (TOML)
///
/// ```toml
/// [cache]
/// backend = "memory"
/// max_entries = 10000
/// expire_after_access = "10m"
///
/// [correlation.request]
/// issuer = "connector-request"
/// secret = "…"
///
/// [correlation.response]
/// issuer = "connector-response"
/// secret = "…"
///
/// [metadata]
/// ttl = "1h"
///
/// [metadata.proxy_service_whitelist]
/// enabled = true
/// uris = "https://a.example.eu/md;https://b.example.eu/md"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Shared cache backend settings (correlation map and trust cache).
    pub cache: CacheConfig,

    /// Token correlation settings.
    pub correlation: CorrelationConfig,

    /// Metadata fetching and caching settings.
    pub metadata: MetadataConfig,
}

impl NodeConfig {
    /// Validates the merged configuration.
    ///
    /// # Errors
    ///
    /// Returns the first semantic problem found: blank token secrets or
    /// issuers, a Redis backend without a URL, zero TTLs or bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.max_entries == 0 {
            return Err(ConfigError::validation("cache.max_entries must be non-zero"));
        }
        if self.cache.expire_after_access.is_zero() {
            return Err(ConfigError::validation(
                "cache.expire_after_access must be non-zero",
            ));
        }
        if self.cache.backend == CacheBackendKind::Redis
            && self
                .cache
                .redis_url
                .as_deref()
                .is_none_or(|url| url.trim().is_empty())
        {
            return Err(ConfigError::validation(
                "cache.redis_url is required when cache.backend = \"redis\"",
            ));
        }

        self.correlation.request.validate("request")?;
        self.correlation.response.validate("response")?;

        if self.metadata.ttl.is_zero() {
            return Err(ConfigError::validation("metadata.ttl must be non-zero"));
        }
        if self.metadata.fetch_timeout.is_zero() {
            return Err(ConfigError::validation(
                "metadata.fetch_timeout must be non-zero",
            ));
        }
        if self.metadata.request_timeout.is_zero() {
            return Err(ConfigError::validation(
                "metadata.request_timeout must be non-zero",
            ));
        }
        if self.metadata.max_response_size == 0 {
            return Err(ConfigError::validation(
                "metadata.max_response_size must be non-zero",
            ));
        }
        Ok(())
    }
}
