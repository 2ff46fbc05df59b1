//! The metadata trust cache.
//!
//! Caches verified partner metadata by source URL. On a miss the owned
//! [`MetadataFetcher`] runs the fetch-and-verify sequence; concurrent
//! misses for the same URL are coalesced into a single flight whose
//! outcome, success or failure, every waiter receives. Failures are
//! never cached; the next request simply starts a new flight.
//!
//! Freshness is enforced twice: the owned cache backend evicts idle
//! entries with its sliding TTL, and this layer additionally re-fetches
//! entries older than the configured absolute TTL so frequently-read
//! metadata cannot grow stale.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use fedgate_cache::CacheBackend;
use fedgate_core::Clock;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::Mutex;

use crate::MetadataResult;
use crate::error::MetadataError;
use crate::fetcher::MetadataFetcher;
use crate::model::{EntityMetadata, MetadataTrustEntry};

type InFlightFuture = Shared<BoxFuture<'static, MetadataResult<EntityMetadata>>>;

/// Caching front of the metadata trust pipeline.
///
/// Owns its [`CacheBackend`] exclusively; nothing else writes to it.
pub struct MetadataTrustCache {
    backend: Arc<dyn CacheBackend>,
    fetcher: Arc<MetadataFetcher>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    fetch_timeout: Duration,
    in_flight: Mutex<HashMap<String, InFlightFuture>>,
}

impl MetadataTrustCache {
    /// Default absolute TTL for cached metadata.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

    /// Default bound on a single coalesced fetch.
    pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a trust cache over `backend`, delegating misses to
    /// `fetcher`.
    ///
    /// `ttl` bounds how old a cached entry may grow before it is
    /// re-fetched; `fetch_timeout` bounds how long any caller waits on a
    /// fetch, including waiters coalesced onto someone else's flight.
    #[must_use]
    pub fn new(
        backend: Arc<dyn CacheBackend>,
        fetcher: Arc<MetadataFetcher>,
        ttl: Duration,
        fetch_timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            backend,
            fetcher,
            clock,
            ttl,
            fetch_timeout,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Returns trusted metadata for `url`, fetching and verifying it if
    /// not cached.
    ///
    /// # Errors
    ///
    /// Propagates the fetch pipeline's trust and transport errors, a
    /// timeout when the flight exceeds the configured bound, and cache
    /// backend failures. Trust errors always reflect a fresh verification
    /// attempt; they are never served from the cache.
    pub async fn get_trusted_metadata(&self, url: &str) -> MetadataResult<EntityMetadata> {
        if let Some(parameters) = self.lookup(url).await? {
            return Ok(parameters);
        }

        let flight = self.join_flight(url).await;
        let result = match tokio::time::timeout(self.fetch_timeout, flight.clone()).await {
            Ok(result) => result,
            Err(_) => {
                // Clear the stuck flight so the next request starts fresh.
                self.leave_flight(url, &flight).await;
                tracing::warn!(url = %url, "metadata fetch timed out");
                return Err(MetadataError::Timeout {
                    url: url.to_string(),
                });
            }
        };
        self.leave_flight(url, &flight).await;
        result
    }

    /// Drops the cached entry for `url`, forcing the next request to
    /// re-fetch. Used on configuration reload.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache backend is unavailable.
    pub async fn invalidate(&self, url: &str) -> MetadataResult<()> {
        self.backend.remove(url).await?;
        tracing::debug!(url = %url, "invalidated cached metadata");
        Ok(())
    }

    /// Cache lookup honoring the absolute TTL; stale and corrupt entries
    /// are dropped and reported as a miss.
    async fn lookup(&self, url: &str) -> MetadataResult<Option<EntityMetadata>> {
        let Some(bytes) = self.backend.get(url).await? else {
            return Ok(None);
        };
        match serde_json::from_slice::<MetadataTrustEntry>(&bytes) {
            Ok(entry) => {
                let now = self.clock.now_utc();
                if entry.cached_at + self.ttl > now {
                    tracing::debug!(url = %url, "metadata trust cache hit");
                    return Ok(Some(entry.parameters));
                }
                tracing::debug!(url = %url, "cached metadata is stale");
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "dropping corrupt metadata cache entry");
            }
        }
        self.backend.remove(url).await?;
        Ok(None)
    }

    /// Joins the in-flight fetch for `url`, starting one if none exists.
    async fn join_flight(&self, url: &str) -> InFlightFuture {
        let mut in_flight = self.in_flight.lock().await;
        if let Some(existing) = in_flight.get(url) {
            tracing::debug!(url = %url, "joining in-flight metadata fetch");
            return existing.clone();
        }

        let fetcher = Arc::clone(&self.fetcher);
        let backend = Arc::clone(&self.backend);
        let clock = Arc::clone(&self.clock);
        let source_url = url.to_string();
        let flight: InFlightFuture = async move {
            let parameters = fetcher.fetch_and_verify(&source_url).await?;
            let entry = MetadataTrustEntry {
                source_url: source_url.clone(),
                parameters: parameters.clone(),
                cached_at: clock.now_utc(),
            };
            let bytes = serde_json::to_vec(&entry)
                .map_err(|e| MetadataError::parse(format!("failed to encode trust entry: {e}")))?;
            backend.put(&source_url, bytes).await?;
            tracing::debug!(url = %source_url, "metadata trust cache populated");
            Ok(parameters)
        }
        .boxed()
        .shared();

        in_flight.insert(url.to_string(), flight.clone());
        flight
    }

    /// Removes a completed or abandoned flight, unless a newer one has
    /// already taken its place.
    async fn leave_flight(&self, url: &str, flight: &InFlightFuture) {
        let mut in_flight = self.in_flight.lock().await;
        if let Some(current) = in_flight.get(url)
            && current.ptr_eq(flight)
        {
            in_flight.remove(url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MetadataRole, RoleDescriptor};
    use crate::signer::{MetadataParser, MetadataSigner, SignatureError, VerifiedDocument};
    use crate::transport::MetadataTransport;
    use async_trait::async_trait;
    use fedgate_cache::MemoryCacheBackend;
    use fedgate_core::{ManualClock, SystemClock};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    const URL: &str = "https://proxy.example.eu/metadata";

    /// Serves one canned document for every URL, counting fetches and
    /// optionally delaying to widen the single-flight window.
    struct CountingTransport {
        document: Vec<u8>,
        fetches: Arc<AtomicUsize>,
        delay: Duration,
    }

    #[async_trait]
    impl MetadataTransport for CountingTransport {
        async fn fetch(&self, _url: &Url) -> MetadataResult<Vec<u8>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(self.document.clone())
        }
    }

    struct FlagSigner {
        accept: bool,
    }

    impl MetadataSigner for FlagSigner {
        fn verify(&self, raw: &[u8]) -> Result<VerifiedDocument, SignatureError> {
            if self.accept {
                Ok(VerifiedDocument::new(raw.to_vec()))
            } else {
                Err(SignatureError::new("signature does not verify"))
            }
        }
    }

    struct JsonParser;

    impl MetadataParser for JsonParser {
        fn parse(&self, document: &VerifiedDocument) -> MetadataResult<EntityMetadata> {
            serde_json::from_slice(document.as_bytes())
                .map_err(|e| MetadataError::parse(e.to_string()))
        }
    }

    fn sample_metadata() -> EntityMetadata {
        let mut metadata = EntityMetadata::new(URL);
        metadata
            .roles
            .push(RoleDescriptor::new(MetadataRole::IdentityProvider));
        metadata
    }

    struct Harness {
        cache: Arc<MetadataTrustCache>,
        fetches: Arc<AtomicUsize>,
    }

    fn harness(signer_accepts: bool, delay: Duration, clock: Arc<dyn Clock>) -> Harness {
        let fetches = Arc::new(AtomicUsize::new(0));
        let transport = CountingTransport {
            document: serde_json::to_vec(&sample_metadata()).unwrap(),
            fetches: Arc::clone(&fetches),
            delay,
        };
        let fetcher = MetadataFetcher::new(
            Arc::new(transport),
            Arc::new(FlagSigner {
                accept: signer_accepts,
            }),
            Arc::new(JsonParser),
            Arc::clone(&clock),
        );
        let backend =
            MemoryCacheBackend::new(64, Duration::from_secs(86400), Arc::clone(&clock)).unwrap();
        let cache = MetadataTrustCache::new(
            Arc::new(backend),
            Arc::new(fetcher),
            Duration::from_secs(3600),
            Duration::from_secs(5),
            clock,
        );
        Harness {
            cache: Arc::new(cache),
            fetches,
        }
    }

    #[tokio::test]
    async fn test_hit_avoids_second_fetch() {
        let h = harness(true, Duration::ZERO, Arc::new(SystemClock));

        let first = h.cache.get_trusted_metadata(URL).await.unwrap();
        let second = h.cache.get_trusted_metadata(URL).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(h.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_flight_coalesces_concurrent_misses() {
        let h = harness(true, Duration::from_millis(100), Arc::new(SystemClock));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&h.cache);
            handles.push(tokio::spawn(async move {
                cache.get_trusted_metadata(URL).await
            }));
        }
        for handle in handles {
            let metadata = handle.await.unwrap().unwrap();
            assert_eq!(metadata.entity_id, URL);
        }
        assert_eq!(h.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_flight_shares_failure_with_waiters() {
        let h = harness(false, Duration::from_millis(100), Arc::new(SystemClock));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&h.cache);
            handles.push(tokio::spawn(async move {
                cache.get_trusted_metadata(URL).await
            }));
        }
        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert!(matches!(err, MetadataError::Signature { .. }));
        }
        assert_eq!(h.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_never_cached() {
        let h = harness(false, Duration::ZERO, Arc::new(SystemClock));

        for _ in 0..3 {
            let err = h.cache.get_trusted_metadata(URL).await.unwrap_err();
            assert!(err.is_trust_error());
        }
        // Every call verified afresh; nothing was served from the cache.
        assert_eq!(h.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_stale_entry_is_refetched() {
        let clock = Arc::new(ManualClock::epoch());
        let h = harness(true, Duration::ZERO, Arc::clone(&clock) as Arc<dyn Clock>);

        h.cache.get_trusted_metadata(URL).await.unwrap();
        clock.advance(Duration::from_secs(3601));
        h.cache.get_trusted_metadata(URL).await.unwrap();
        assert_eq!(h.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fresh_entry_survives_within_ttl() {
        let clock = Arc::new(ManualClock::epoch());
        let h = harness(true, Duration::ZERO, Arc::clone(&clock) as Arc<dyn Clock>);

        h.cache.get_trusted_metadata(URL).await.unwrap();
        clock.advance(Duration::from_secs(3599));
        h.cache.get_trusted_metadata(URL).await.unwrap();
        assert_eq!(h.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let h = harness(true, Duration::ZERO, Arc::new(SystemClock));

        h.cache.get_trusted_metadata(URL).await.unwrap();
        h.cache.invalidate(URL).await.unwrap();
        h.cache.get_trusted_metadata(URL).await.unwrap();
        assert_eq!(h.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_times_out_and_clears_flight() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let transport = CountingTransport {
            document: serde_json::to_vec(&sample_metadata()).unwrap(),
            fetches: Arc::clone(&fetches),
            delay: Duration::from_secs(60),
        };
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let fetcher = MetadataFetcher::new(
            Arc::new(transport),
            Arc::new(FlagSigner { accept: true }),
            Arc::new(JsonParser),
            Arc::clone(&clock),
        );
        let backend =
            MemoryCacheBackend::new(64, Duration::from_secs(86400), Arc::clone(&clock)).unwrap();
        let cache = MetadataTrustCache::new(
            Arc::new(backend),
            Arc::new(fetcher),
            Duration::from_secs(3600),
            Duration::from_secs(1),
            clock,
        );

        let err = cache.get_trusted_metadata(URL).await.unwrap_err();
        assert!(matches!(err, MetadataError::Timeout { .. }));

        // The stuck flight was cleared: a second request starts a fresh
        // fetch instead of waiting on the abandoned one.
        let err = cache.get_trusted_metadata(URL).await.unwrap_err();
        assert!(matches!(err, MetadataError::Timeout { .. }));
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }
}
