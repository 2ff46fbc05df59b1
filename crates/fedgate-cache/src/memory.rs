//! In-process cache backend.
//!
//! A bounded map with sliding TTL for single-instance deployments. Entries
//! expire `expire_after_access` after they were last read or written; when
//! the map is full, expired entries are swept first and least recently
//! accessed entries are evicted after that.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use fedgate_core::Clock;
use time::OffsetDateTime;

use crate::backend::CacheBackend;
use crate::{CacheError, CacheResult};

/// A cached value with its expiry deadline.
///
/// The deadline is renewed on every access, so it doubles as the
/// least-recently-used ordering for capacity eviction.
#[derive(Debug, Clone)]
struct CachedEntry {
    data: Vec<u8>,
    deadline: OffsetDateTime,
}

impl CachedEntry {
    fn is_live(&self, now: OffsetDateTime) -> bool {
        self.deadline > now
    }
}

/// In-process bounded/TTL map conforming to [`CacheBackend`].
#[derive(Debug)]
pub struct MemoryCacheBackend {
    entries: DashMap<String, CachedEntry>,
    max_entries: usize,
    expire_after_access: Duration,
    clock: Arc<dyn Clock>,
}

impl MemoryCacheBackend {
    /// Creates a backend holding at most `max_entries` entries, each
    /// expiring `expire_after_access` after its last access.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `max_entries` is zero or the TTL
    /// is zero.
    pub fn new(
        max_entries: usize,
        expire_after_access: Duration,
        clock: Arc<dyn Clock>,
    ) -> CacheResult<Self> {
        if max_entries == 0 {
            return Err(CacheError::configuration("max_entries must be non-zero"));
        }
        if expire_after_access.is_zero() {
            return Err(CacheError::configuration(
                "expire_after_access must be non-zero",
            ));
        }
        Ok(Self {
            entries: DashMap::new(),
            max_entries,
            expire_after_access,
            clock,
        })
    }

    /// Number of entries currently held, including not-yet-swept expired
    /// ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Makes room for one new entry: sweeps expired entries, then evicts
    /// least recently accessed entries until under capacity.
    fn evict_for_capacity(&self, now: OffsetDateTime) {
        if self.entries.len() < self.max_entries {
            return;
        }
        self.entries.retain(|_, entry| entry.is_live(now));
        while self.entries.len() >= self.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().deadline)
                .map(|entry| entry.key().clone());
            let Some(key) = oldest else { break };
            if self.entries.remove(&key).is_some() {
                tracing::debug!(key = %key, "evicted least recently accessed cache entry");
            }
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let now = self.clock.now_utc();
        if let Some(mut entry) = self.entries.get_mut(key)
            && entry.is_live(now)
        {
            entry.deadline = now + self.expire_after_access;
            return Ok(Some(entry.data.clone()));
        }
        // Lazily drop the expired entry, if any.
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        Ok(None)
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> CacheResult<Option<Vec<u8>>> {
        let now = self.clock.now_utc();
        if !self.entries.contains_key(key) {
            self.evict_for_capacity(now);
        }
        let previous = self.entries.insert(
            key.to_string(),
            CachedEntry {
                data: value,
                deadline: now + self.expire_after_access,
            },
        );
        Ok(previous
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.data))
    }

    async fn remove(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let now = self.clock.now_utc();
        Ok(self
            .entries
            .remove(key)
            .map(|(_, entry)| entry)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedgate_core::{ManualClock, SystemClock};

    fn manual_backend(max_entries: usize, ttl_secs: u64) -> (MemoryCacheBackend, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::epoch());
        let backend = MemoryCacheBackend::new(
            max_entries,
            Duration::from_secs(ttl_secs),
            Arc::clone(&clock) as Arc<dyn Clock>,
        )
        .unwrap();
        (backend, clock)
    }

    #[tokio::test]
    async fn test_put_get_remove_roundtrip() {
        let (backend, _clock) = manual_backend(16, 60);

        assert_eq!(backend.put("k", b"v1".to_vec()).await.unwrap(), None);
        assert_eq!(backend.get("k").await.unwrap(), Some(b"v1".to_vec()));
        assert_eq!(backend.remove("k").await.unwrap(), Some(b"v1".to_vec()));
        assert_eq!(backend.get("k").await.unwrap(), None);
        assert_eq!(backend.remove("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_returns_previous_value() {
        let (backend, _clock) = manual_backend(16, 60);

        backend.put("k", b"v1".to_vec()).await.unwrap();
        let previous = backend.put("k", b"v2".to_vec()).await.unwrap();
        assert_eq!(previous, Some(b"v1".to_vec()));
        assert_eq!(backend.get("k").await.unwrap(), Some(b"v2".to_vec()));
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let (backend, clock) = manual_backend(16, 60);

        backend.put("k", b"v".to_vec()).await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some(b"v".to_vec()));

        clock.advance(Duration::from_secs(61));
        assert_eq!(backend.get("k").await.unwrap(), None);
        assert_eq!(backend.remove("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_access_renews_sliding_ttl() {
        let (backend, clock) = manual_backend(16, 60);

        backend.put("k", b"v".to_vec()).await.unwrap();
        clock.advance(Duration::from_secs(45));
        // Read inside the window renews the deadline.
        assert!(backend.get("k").await.unwrap().is_some());
        clock.advance(Duration::from_secs(45));
        assert!(backend.get("k").await.unwrap().is_some());
        clock.advance(Duration::from_secs(61));
        assert!(backend.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_previous_not_reported_by_put() {
        let (backend, clock) = manual_backend(16, 60);

        backend.put("k", b"old".to_vec()).await.unwrap();
        clock.advance(Duration::from_secs(61));
        assert_eq!(backend.put("k", b"new".to_vec()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_accessed() {
        let (backend, clock) = manual_backend(2, 600);

        backend.put("a", b"1".to_vec()).await.unwrap();
        clock.advance(Duration::from_secs(1));
        backend.put("b", b"2".to_vec()).await.unwrap();
        clock.advance(Duration::from_secs(1));
        // Touch "a" so "b" becomes the eviction candidate.
        backend.get("a").await.unwrap();
        clock.advance(Duration::from_secs(1));

        backend.put("c", b"3".to_vec()).await.unwrap();
        assert!(backend.get("a").await.unwrap().is_some());
        assert!(backend.get("b").await.unwrap().is_none());
        assert!(backend.get("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_capacity_sweeps_expired_before_evicting() {
        let (backend, clock) = manual_backend(2, 60);

        backend.put("a", b"1".to_vec()).await.unwrap();
        backend.put("b", b"2".to_vec()).await.unwrap();
        clock.advance(Duration::from_secs(61));

        backend.put("c", b"3".to_vec()).await.unwrap();
        assert_eq!(backend.len(), 1);
        assert!(backend.get("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_overwrite_does_not_trigger_eviction() {
        let (backend, _clock) = manual_backend(2, 60);

        backend.put("a", b"1".to_vec()).await.unwrap();
        backend.put("b", b"2".to_vec()).await.unwrap();
        backend.put("a", b"3".to_vec()).await.unwrap();
        assert!(backend.get("a").await.unwrap().is_some());
        assert!(backend.get("b").await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_remove_consumes_exactly_once() {
        let backend = Arc::new(
            MemoryCacheBackend::new(16, Duration::from_secs(60), Arc::new(SystemClock)).unwrap(),
        );
        backend.put("k", b"v".to_vec()).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..32 {
            let backend = Arc::clone(&backend);
            handles.push(tokio::spawn(async move {
                backend.remove("k").await.unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[test]
    fn test_rejects_zero_capacity_and_ttl() {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        assert!(
            MemoryCacheBackend::new(0, Duration::from_secs(1), Arc::clone(&clock))
                .is_err_and(|e| e.is_configuration_error())
        );
        assert!(
            MemoryCacheBackend::new(1, Duration::ZERO, clock)
                .is_err_and(|e| e.is_configuration_error())
        );
    }
}
