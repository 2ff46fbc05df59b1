//! Correlation and token error types.

use fedgate_cache::CacheError;

/// Errors produced while minting, encoding or decoding light tokens.
///
/// Every decode failure is treated by callers exactly like a correlation
/// failure: the in-flight exchange is aborted with a user-facing "expired
/// or invalid session" outcome. None of these crash the process.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The token service itself is misconfigured (blank issuer or secret,
    /// separator inside the issuer).
    #[error("Token configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// The encoded input exceeds the maximum allowed size.
    #[error("Error parsing light token, size exceeds {max} bytes")]
    TooLarge {
        /// The maximum allowed encoded size.
        max: usize,
    },

    /// The input is not a well-formed token (bad base64, wrong part count,
    /// non-UTF-8 content).
    #[error("Light token parse error: {message}")]
    Parse {
        /// Description of the parse failure.
        message: String,
    },

    /// A mandatory token field is blank.
    #[error("Light token parse error: {field} is blank")]
    BlankField {
        /// The offending field name.
        field: &'static str,
    },

    /// The `created_on` timestamp does not match the expected format.
    #[error("Light token created_on timestamp parse failure: {message}")]
    Timestamp {
        /// Description of the timestamp problem.
        message: String,
    },

    /// The embedded digest does not match the recomputed one: the token
    /// was tampered with or signed with a different secret.
    #[error("Light token digest failure")]
    DigestMismatch,
}

impl TokenError {
    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Parse` error.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Creates a new `Timestamp` error.
    #[must_use]
    pub fn timestamp(message: impl Into<String>) -> Self {
        Self::Timestamp {
            message: message.into(),
        }
    }

    /// Returns `true` if this error means the presented token must not be
    /// trusted (as opposed to a local configuration problem).
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        !matches!(self, Self::Configuration { .. })
    }
}

/// Errors produced by the correlation map.
#[derive(Debug, thiserror::Error)]
pub enum CorrelationError {
    /// The backing cache failed; without it no cross-instance correlation
    /// is possible.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A stored payload could not be serialized or deserialized.
    #[error("Correlation payload codec error: {message}")]
    Payload {
        /// Description of the codec failure.
        message: String,
    },

    /// No pending exchange was found for the presented token: it expired,
    /// was already consumed, or never existed. The caller must fail the
    /// in-flight exchange; replaying the same token always lands here.
    #[error("No pending exchange for the presented token")]
    NotFound,
}

impl CorrelationError {
    /// Creates a new `Payload` error.
    #[must_use]
    pub fn payload(message: impl Into<String>) -> Self {
        Self::Payload {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a correlation failure the flow layer
    /// reports to the user (rather than an infrastructure fault).
    #[must_use]
    pub fn is_correlation_failure(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}
