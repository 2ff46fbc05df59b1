//! Redis-replicated cache backend.
//!
//! Conforms to [`CacheBackend`] for multi-instance deployments: entries
//! written on one node become visible to `get`/`remove` on every other
//! node sharing the same Redis deployment. Per-key atomicity rides on
//! Redis single-command semantics (`GETEX`, `SET ... GET`, `GETDEL`), so
//! the at-most-once guarantee of `remove` holds across the whole cluster.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, PoolConfig, Runtime, Timeouts};

use crate::backend::CacheBackend;
use crate::{CacheError, CacheResult};

/// Cluster-replicated map conforming to [`CacheBackend`].
#[derive(Debug)]
pub struct RedisCacheBackend {
    pool: Pool,
    expire_after_access: Duration,
}

impl RedisCacheBackend {
    /// Creates a backend against the Redis deployment at `url`.
    ///
    /// Entries expire `expire_after_access` after their last access; the
    /// deadline is renewed on every read.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the URL is malformed, the pool
    /// cannot be created, or the TTL is zero. An unreachable server is
    /// only detected on first use, as a backend error.
    pub fn new(url: &str, expire_after_access: Duration) -> CacheResult<Self> {
        if expire_after_access.is_zero() {
            return Err(CacheError::configuration(
                "expire_after_access must be non-zero",
            ));
        }
        let mut config = Config::from_url(url);
        // Callers never wait unbounded on the pool; a saturated or dead
        // deployment surfaces as a backend error instead of a hang.
        config.pool = Some(PoolConfig {
            timeouts: Timeouts {
                wait: Some(Duration::from_secs(5)),
                create: Some(Duration::from_secs(5)),
                recycle: Some(Duration::from_secs(5)),
            },
            ..PoolConfig::default()
        });
        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| CacheError::configuration(format!("invalid redis configuration: {e}")))?;
        Ok(Self {
            pool,
            expire_after_access,
        })
    }

    async fn connection(&self) -> CacheResult<deadpool_redis::Connection> {
        self.pool.get().await.map_err(|e| {
            tracing::warn!(error = %e, "redis connection unavailable");
            CacheError::backend(format!("redis connection unavailable: {e}"))
        })
    }

    fn ttl_millis(&self) -> u64 {
        // Redis rejects PX 0; the constructor guarantees a non-zero TTL.
        self.expire_after_access.as_millis().max(1) as u64
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        // GETEX renews the sliding expiry atomically with the read.
        redis::cmd("GETEX")
            .arg(key)
            .arg("PX")
            .arg(self.ttl_millis())
            .query_async::<Option<Vec<u8>>>(&mut conn)
            .await
            .map_err(|e| {
                tracing::warn!(key = %key, error = %e, "redis GETEX error");
                CacheError::backend(format!("redis GETEX failed: {e}"))
            })
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        // SET ... GET returns the overwritten value in the same atomic step.
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(self.ttl_millis())
            .arg("GET")
            .query_async::<Option<Vec<u8>>>(&mut conn)
            .await
            .map_err(|e| {
                tracing::warn!(key = %key, error = %e, "redis SET error");
                CacheError::backend(format!("redis SET failed: {e}"))
            })
    }

    async fn remove(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        redis::cmd("GETDEL")
            .arg(key)
            .query_async::<Option<Vec<u8>>>(&mut conn)
            .await
            .map_err(|e| {
                tracing::warn!(key = %key, error = %e, "redis GETDEL error");
                CacheError::backend(format!("redis GETDEL failed: {e}"))
            })
    }
}
