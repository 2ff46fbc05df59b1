//! The correlation map.
//!
//! A typed wrapper over a [`CacheBackend`] that stores a pending exchange
//! (request or response payload) under the one-way digest of a light
//! token. The map owns its backend exclusively; nothing else writes to it.
//!
//! `remove` is the only correlation-consuming operation: retrieval and
//! deletion happen in one atomic step, so of N concurrent calls with the
//! same token exactly one observes the payload and a replayed token finds
//! nothing. `get` exists for diagnostics and log enrichment only.

use std::marker::PhantomData;
use std::sync::Arc;

use fedgate_cache::CacheBackend;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::CorrelationResult;
use crate::error::CorrelationError;
use crate::service::LightTokenService;
use crate::token::LightToken;

/// Cache-backed store mapping a correlation key to a pending payload,
/// consumed at most once.
///
/// `T` is the opaque payload produced by the protocol layer (a signed
/// authentication request or response); this map never inspects its
/// structure beyond serializing it.
pub struct CorrelationMap<T> {
    backend: Arc<dyn CacheBackend>,
    tokens: Arc<LightTokenService>,
    _payload: PhantomData<fn() -> T>,
}

impl<T> CorrelationMap<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a map over `backend`, keyed by digests from `tokens`.
    #[must_use]
    pub fn new(backend: Arc<dyn CacheBackend>, tokens: Arc<LightTokenService>) -> Self {
        Self {
            backend,
            tokens,
            _payload: PhantomData,
        }
    }

    /// Stores `value` as the pending exchange for `token`.
    ///
    /// An existing entry under the same token is overwritten
    /// (last-write-wins); callers mint a fresh token per exchange, so an
    /// overwrite indicates a caller bug and is logged, not failed.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized or the backend
    /// is unavailable.
    pub async fn put(&self, token: &LightToken, value: &T) -> CorrelationResult<()> {
        let payload =
            serde_json::to_vec(value).map_err(|e| CorrelationError::payload(e.to_string()))?;
        let key = self.tokens.cache_key(token);
        let previous = self.backend.put(&key, payload).await?;
        if previous.is_some() {
            tracing::debug!(token = %token.diagnostic_key(), "overwrote pending exchange");
        }
        Ok(())
    }

    /// Reads the pending exchange without consuming it.
    ///
    /// Diagnostics only; correlation must go through
    /// [`remove`](Self::remove), otherwise the replay protection is lost.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unavailable or the stored
    /// payload cannot be deserialized.
    pub async fn get(&self, token: &LightToken) -> CorrelationResult<Option<T>> {
        let key = self.tokens.cache_key(token);
        self.backend.get(&key).await?.map(decode_payload).transpose()
    }

    /// Atomically retrieves and deletes the pending exchange for `token`.
    ///
    /// Returns `None` when no entry exists: it expired, was already
    /// consumed, or the token never correlated to anything. The caller
    /// must treat that as a failed correlation and abort the exchange.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unavailable or the stored
    /// payload cannot be deserialized.
    pub async fn remove(&self, token: &LightToken) -> CorrelationResult<Option<T>> {
        let key = self.tokens.cache_key(token);
        self.backend
            .remove(&key)
            .await?
            .map(decode_payload)
            .transpose()
    }

    /// Like [`remove`](Self::remove), but maps an absent entry to
    /// [`CorrelationError::NotFound`] for callers that expect the exchange
    /// to be pending.
    ///
    /// # Errors
    ///
    /// Everything `remove` returns, plus `NotFound` when the entry is
    /// absent.
    pub async fn consume(&self, token: &LightToken) -> CorrelationResult<T> {
        match self.remove(token).await? {
            Some(value) => Ok(value),
            None => {
                tracing::warn!(
                    token = %token.diagnostic_key(),
                    "correlation failed: no pending exchange (expired, consumed or invalid)"
                );
                Err(CorrelationError::NotFound)
            }
        }
    }
}

fn decode_payload<T: DeserializeOwned>(bytes: Vec<u8>) -> CorrelationResult<T> {
    serde_json::from_slice(&bytes).map_err(|e| CorrelationError::payload(e.to_string()))
}
