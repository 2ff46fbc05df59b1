//! # fedgate-correlation
//!
//! Token-based correlation between two otherwise-unrelated HTTP exchanges.
//!
//! An outbound flow mints a [`LightToken`], stores its pending payload in a
//! [`CorrelationMap`] and hands the encoded token to the remote partner as
//! an opaque URL parameter. When the partner redirects back, the inbound
//! flow decodes the token and *consumes* the stored payload: retrieval
//! and deletion in one atomic step, so a replayed token finds nothing.
//!
//! This crate provides:
//! - [`LightToken`] - immutable `{id, issuer, created_on}` value object
//! - [`LightTokenService`] - mints, encodes, decodes and digests tokens,
//!   bound to a per-direction shared secret
//! - [`CorrelationMap`] - typed wrapper over a
//!   [`CacheBackend`](fedgate_cache::CacheBackend) enforcing at-most-once
//!   retrieval

pub mod error;
pub mod map;
pub mod service;
pub mod token;

pub use error::{CorrelationError, TokenError};
pub use map::CorrelationMap;
pub use service::{DigestAlgorithm, LightTokenService};
pub use token::LightToken;

/// Type alias for token operation results.
pub type TokenResult<T> = Result<T, TokenError>;

/// Type alias for correlation map results.
pub type CorrelationResult<T> = Result<T, CorrelationError>;
