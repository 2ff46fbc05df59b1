//! Light token minting, encoding and verification.
//!
//! One service instance exists per exchange direction (connector request,
//! connector response, proxy-service request, proxy-service response),
//! each bound to its own shared secret. The wire format is
//!
//! ```text
//! issuer|id|created-on|digest
//! ```
//!
//! where `digest = base64(sha256(id|issuer|created-on|secret))` binds the
//! token to the direction's secret. The whole string travels base64url
//! encoded in a URL parameter. The digest embedded in the wire format
//! authenticates the token; the separately computed [`cache_key`]
//! (one-way, fixed length) is what the correlation map stores under, so
//! observing a cache key reveals nothing about the token's fields.
//!
//! [`cache_key`]: LightTokenService::cache_key

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use fedgate_core::{Clock, sha256_base64, sha256_base64url};
use rand::RngCore;
use time::PrimitiveDateTime;

use crate::TokenResult;
use crate::error::TokenError;
use crate::token::{CREATED_ON_FORMAT, LightToken, SEPARATOR};

/// Maximum accepted size of an encoded token, in bytes.
///
/// Tokens travel as URL parameters; anything larger than this is garbage
/// or an attack and is rejected before any parsing happens.
pub const MAX_TOKEN_SIZE: usize = 2048;

/// Digest algorithm used for the wire digest and the cache key.
///
/// A closed enum rather than an algorithm string: an unsupported algorithm
/// is unrepresentable instead of a runtime error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    /// SHA-256.
    #[default]
    Sha256,
}

/// Mints, encodes, decodes and digests light tokens for one exchange
/// direction.
#[derive(Debug)]
pub struct LightTokenService {
    issuer: String,
    secret: String,
    algorithm: DigestAlgorithm,
    clock: Arc<dyn Clock>,
}

impl LightTokenService {
    /// Creates a service for `issuer`, authenticated by `secret`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `issuer` or `secret` is blank, or
    /// if `issuer` contains the wire separator.
    pub fn new(
        issuer: impl Into<String>,
        secret: impl Into<String>,
        algorithm: DigestAlgorithm,
        clock: Arc<dyn Clock>,
    ) -> TokenResult<Self> {
        let issuer = issuer.into();
        let secret = secret.into();
        if issuer.trim().is_empty() {
            return Err(TokenError::configuration("issuer must not be blank"));
        }
        if issuer.contains(SEPARATOR) {
            return Err(TokenError::configuration(
                "issuer must not contain the token separator",
            ));
        }
        if secret.trim().is_empty() {
            return Err(TokenError::configuration("secret must not be blank"));
        }
        Ok(Self {
            issuer,
            secret,
            algorithm,
            clock,
        })
    }

    /// The issuer this service mints for.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Mints a fresh token: 256 bits of CSPRNG entropy in the id,
    /// `created_on` stamped from the injected clock at millisecond
    /// precision.
    ///
    /// # Errors
    ///
    /// Returns an error only if the clock produces a timestamp the wire
    /// format cannot represent (never in practice).
    pub fn generate(&self) -> TokenResult<LightToken> {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let id = URL_SAFE_NO_PAD.encode(bytes);

        let now = self.clock.now_utc();
        let millis = now.nanosecond() / 1_000_000 * 1_000_000;
        let created_on = now
            .replace_nanosecond(millis)
            .map_err(|e| TokenError::timestamp(e.to_string()))?;

        LightToken::new(id, self.issuer.clone(), created_on)
    }

    /// Encodes a token into its transport form (base64url, no padding),
    /// deterministic and reversible via [`decode`](Self::decode).
    #[must_use]
    pub fn encode(&self, token: &LightToken) -> String {
        URL_SAFE_NO_PAD.encode(self.wire_string(token))
    }

    /// Decodes and authenticates a transport-form token.
    ///
    /// # Errors
    ///
    /// Rejects input that is oversized, not base64, not `UTF-8`, has the
    /// wrong part count, blank fields, an unparseable timestamp, or a
    /// digest that does not match this service's secret. All of these are
    /// reported to the flow layer as a failed correlation, never a crash.
    pub fn decode(&self, encoded: &str) -> TokenResult<LightToken> {
        if encoded.len() > MAX_TOKEN_SIZE {
            return Err(TokenError::TooLarge {
                max: MAX_TOKEN_SIZE,
            });
        }
        let raw = URL_SAFE_NO_PAD
            .decode(encoded.trim())
            .map_err(|e| TokenError::parse(format!("invalid base64: {e}")))?;
        let wire = String::from_utf8(raw)
            .map_err(|_| TokenError::parse("token is not valid UTF-8"))?;

        let parts: Vec<&str> = wire.split(SEPARATOR).collect();
        let [issuer, id, created_on, digest] = parts.as_slice() else {
            return Err(TokenError::parse(format!(
                "expected 4 token parts, got {}",
                parts.len()
            )));
        };
        if id.trim().is_empty() {
            return Err(TokenError::BlankField { field: "id" });
        }
        if issuer.trim().is_empty() {
            return Err(TokenError::BlankField { field: "issuer" });
        }

        let created_on = PrimitiveDateTime::parse(created_on, CREATED_ON_FORMAT)
            .map_err(|e| TokenError::timestamp(e.to_string()))?
            .assume_utc();

        let token = LightToken::new(*id, *issuer, created_on)?;
        let expected = self.wire_digest(&token);
        if *digest != expected {
            tracing::warn!(issuer = %issuer, "light token digest mismatch");
            return Err(TokenError::DigestMismatch);
        }
        Ok(token)
    }

    /// One-way cache key for a token: a fixed-length digest over the full
    /// wire representation. This is the only form of the token the cache
    /// backend ever sees.
    #[must_use]
    pub fn cache_key(&self, token: &LightToken) -> String {
        sha256_base64url(self.wire_string(token).as_bytes())
    }

    fn wire_string(&self, token: &LightToken) -> String {
        let created_on = token.formatted_created_on();
        format!(
            "{issuer}{sep}{id}{sep}{created_on}{sep}{digest}",
            issuer = token.issuer(),
            id = token.id(),
            sep = SEPARATOR,
            digest = self.wire_digest(token),
        )
    }

    fn wire_digest(&self, token: &LightToken) -> String {
        let material = format!(
            "{id}{sep}{issuer}{sep}{created_on}{sep}{secret}",
            id = token.id(),
            issuer = token.issuer(),
            created_on = token.formatted_created_on(),
            sep = SEPARATOR,
            secret = self.secret,
        );
        match self.algorithm {
            DigestAlgorithm::Sha256 => sha256_base64(material.as_bytes()),
        }
    }
}
