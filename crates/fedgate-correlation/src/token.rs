//! The light token value object.

use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::error::TokenError;
use crate::TokenResult;

/// Field separator in the token wire format.
pub const SEPARATOR: char = '|';

/// Timestamp format used in the token wire format: millisecond precision,
/// no zone designator (all timestamps are UTC).
pub const CREATED_ON_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second] [subsecond digits:3]");

/// Opaque correlation identifier linking two unrelated HTTP interactions.
///
/// Immutable after construction. `id` carries 256 bits of CSPRNG entropy
/// when minted by [`LightTokenService`](crate::LightTokenService); `issuer`
/// names the direction of the exchange (e.g. `connector-request`);
/// `created_on` is stamped once at mint time with millisecond precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightToken {
    id: String,
    issuer: String,
    created_on: OffsetDateTime,
}

impl LightToken {
    /// Builds a token from its parts.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` or `issuer` is blank or contains the wire
    /// separator, or if `created_on` carries sub-millisecond precision
    /// (which would not survive an encode/decode round trip).
    pub fn new(
        id: impl Into<String>,
        issuer: impl Into<String>,
        created_on: OffsetDateTime,
    ) -> TokenResult<Self> {
        let id = id.into();
        let issuer = issuer.into();
        if id.trim().is_empty() {
            return Err(TokenError::BlankField { field: "id" });
        }
        if issuer.trim().is_empty() {
            return Err(TokenError::BlankField { field: "issuer" });
        }
        if id.contains(SEPARATOR) || issuer.contains(SEPARATOR) {
            return Err(TokenError::parse("token fields must not contain the separator"));
        }
        if created_on.nanosecond() % 1_000_000 != 0 {
            return Err(TokenError::timestamp(
                "created_on must have millisecond precision",
            ));
        }
        Ok(Self {
            id,
            issuer,
            created_on,
        })
    }

    /// The token's unique identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The issuing direction of the exchange.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// When the token was minted.
    #[must_use]
    pub fn created_on(&self) -> OffsetDateTime {
        self.created_on
    }

    /// `created_on` rendered in the wire format.
    #[must_use]
    pub fn formatted_created_on(&self) -> String {
        // The format cannot fail for a millisecond-precision UTC timestamp.
        self.created_on
            .format(CREATED_ON_FORMAT)
            .unwrap_or_default()
    }

    /// Human-readable composite key, for diagnostics and log lines only.
    /// The cache key actually used for storage is a one-way digest, see
    /// [`LightTokenService::cache_key`](crate::LightTokenService::cache_key).
    #[must_use]
    pub fn diagnostic_key(&self) -> String {
        format!(
            "{}/{}/{}",
            self.issuer,
            self.id,
            self.formatted_created_on()
        )
    }
}
