//! Cache backend configuration and selection.

use std::sync::Arc;
use std::time::Duration;

use fedgate_core::Clock;
use serde::{Deserialize, Serialize};

use crate::{CacheBackend, CacheError, CacheResult, MemoryCacheBackend, RedisCacheBackend};

/// Which conforming backend implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    /// In-process bounded/TTL map (single-instance deployments).
    #[default]
    Memory,
    /// Redis-replicated map (multi-instance deployments).
    Redis,
}

/// Configuration for a cache backend instance.
///
/// # Example (TOML)
///
/// ```toml
/// backend = "memory"
/// max_entries = 10000
/// expire_after_access = "10m"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Backend implementation to use.
    pub backend: CacheBackendKind,

    /// Maximum number of entries before eviction (memory backend only).
    pub max_entries: usize,

    /// Sliding TTL: entries expire this long after their last access.
    #[serde(with = "humantime_serde")]
    pub expire_after_access: Duration,

    /// Redis connection URL. Required when `backend = "redis"`.
    pub redis_url: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::Memory,
            max_entries: 10_000,
            expire_after_access: Duration::from_secs(600),
            redis_url: None,
        }
    }
}

impl CacheConfig {
    /// Sets the backend kind.
    #[must_use]
    pub fn with_backend(mut self, backend: CacheBackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the entry bound.
    #[must_use]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Sets the sliding TTL.
    #[must_use]
    pub fn with_expire_after_access(mut self, ttl: Duration) -> Self {
        self.expire_after_access = ttl;
        self
    }

    /// Sets the Redis connection URL.
    #[must_use]
    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }
}

/// Builds the configured backend.
///
/// # Errors
///
/// Returns a configuration error for a zero entry bound or TTL, or when
/// the Redis backend is selected without a URL.
pub fn build_backend(
    config: &CacheConfig,
    clock: Arc<dyn Clock>,
) -> CacheResult<Arc<dyn CacheBackend>> {
    match config.backend {
        CacheBackendKind::Memory => {
            let backend =
                MemoryCacheBackend::new(config.max_entries, config.expire_after_access, clock)?;
            Ok(Arc::new(backend))
        }
        CacheBackendKind::Redis => {
            let url = config.redis_url.as_deref().ok_or_else(|| {
                CacheError::configuration("redis backend selected but redis_url is not set")
            })?;
            let backend = RedisCacheBackend::new(url, config.expire_after_access)?;
            Ok(Arc::new(backend))
        }
    }
}
