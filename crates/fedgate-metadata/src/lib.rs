//! # fedgate-metadata
//!
//! Remote-partner metadata: fetching, trust verification, whitelisting
//! and caching.
//!
//! Whenever a protocol operation needs a remote partner's signing
//! certificates, endpoints or supported assurance levels, it asks the
//! [`MetadataTrustCache`] for that partner's [`EntityMetadata`]. On a
//! cache miss the [`MetadataFetcher`] resolves the raw document (HTTPS or
//! a local file source), has the external [`MetadataSigner`] verify its
//! signature, applies the configured [`WhitelistSet`], parses the result
//! and populates the cache, fail-closed at every step: nothing that
//! failed verification or whitelisting is ever cached.
//!
//! Concurrent misses for the same URL are coalesced (single-flight): one
//! fetch runs, every waiter receives its outcome.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod signer;
pub mod transport;
pub mod whitelist;

pub use cache::MetadataTrustCache;
pub use config::{MetadataConfig, NodeRole, WhitelistConfig};
pub use error::MetadataError;
pub use fetcher::MetadataFetcher;
pub use model::{EntityMetadata, MetadataRole, MetadataTrustEntry, RoleDescriptor};
pub use signer::{MetadataParser, MetadataSigner, SignatureError, VerifiedDocument};
pub use transport::{FileMetadataTransport, HttpMetadataTransport, MetadataTransport};
pub use whitelist::{MatchPolicy, WhitelistSet, is_trusted};

/// Type alias for metadata operation results.
pub type MetadataResult<T> = Result<T, MetadataError>;
