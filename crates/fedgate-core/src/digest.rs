//! SHA-256 digest helpers.
//!
//! Two encodings are used across the node: standard base64 for digests
//! embedded in wire-format fields, and URL-safe base64 without padding for
//! digests that travel in URLs or become file/cache keys.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};

/// SHA-256 digest of `data`, standard base64 encoded.
#[must_use]
pub fn sha256_base64(data: &[u8]) -> String {
    STANDARD.encode(Sha256::digest(data))
}

/// SHA-256 digest of `data`, URL-safe base64 encoded without padding.
///
/// Suitable for URL parameters, cache keys and file names.
#[must_use]
pub fn sha256_base64url(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(data))
}
