//! The cache backend capability.

use async_trait::async_trait;

use crate::CacheResult;

/// A pluggable key/value store with expiration and size bounds.
///
/// Values are opaque byte strings; typed layers above (the correlation map,
/// the metadata trust cache) serialize their payloads before storing them.
/// All three operations are atomic with respect to a single key. In
/// particular, when several callers race on [`remove`](Self::remove) for
/// the same key, exactly one of them observes the stored value.
///
/// # Implementations
///
/// - [`MemoryCacheBackend`](crate::MemoryCacheBackend) - in-process map
/// - [`RedisCacheBackend`](crate::RedisCacheBackend) - replicated map for
///   clustered deployments
///
/// Expiry is sliding: every successful `get` renews the entry's deadline.
#[async_trait]
pub trait CacheBackend: Send + Sync + std::fmt::Debug {
    /// Returns the value stored under `key`, renewing its expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or misconfigured.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, returning the previous value if one was
    /// present. An existing entry is overwritten (last-write-wins).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or misconfigured.
    async fn put(&self, key: &str, value: Vec<u8>) -> CacheResult<Option<Vec<u8>>>;

    /// Atomically retrieves and deletes the value stored under `key`.
    ///
    /// Under concurrent calls with the same key, exactly one caller
    /// receives the value; all others receive `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or misconfigured.
    async fn remove(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;
}
