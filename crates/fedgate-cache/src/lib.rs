//! # fedgate-cache
//!
//! Pluggable key/value cache backends for the fedgate node.
//!
//! The [`CacheBackend`] trait is the single shared-state capability of the
//! node: the correlation map and the metadata trust cache each own one
//! backend instance exclusively and perform all mutation through its atomic
//! `get`/`put`/`remove` operations.
//!
//! Two conforming implementations are provided:
//!
//! - [`MemoryCacheBackend`] - in-process bounded map with sliding TTL, for
//!   single-instance deployments
//! - [`RedisCacheBackend`] - Redis-replicated map, for multi-instance
//!   deployments where an entry written on one node must be visible to
//!   `get`/`remove` on another
//!
//! The backend is selected by configuration ([`CacheConfig`]) and composed
//! into its owner as an `Arc<dyn CacheBackend>`.

pub mod backend;
pub mod config;
pub mod error;
pub mod memory;
pub mod redis;

pub use backend::CacheBackend;
pub use config::{CacheBackendKind, CacheConfig, build_backend};
pub use error::CacheError;
pub use memory::MemoryCacheBackend;
pub use self::redis::RedisCacheBackend;

/// Type alias for cache operation results.
pub type CacheResult<T> = Result<T, CacheError>;
