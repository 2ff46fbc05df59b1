//! Metadata trust and fetch error types.

use fedgate_cache::CacheError;

/// Errors that can occur while resolving trusted metadata.
///
/// Trust errors (signature, whitelist, validity) are fail-closed: they are
/// never cached and never downgraded to a cached "ok". Transport errors
/// are surfaced to the caller, which decides whether to retry; this layer
/// never retries on its own.
///
/// The type is `Clone` because the outcome of a single-flight fetch is
/// shared verbatim with every coalesced waiter.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MetadataError {
    /// The metadata URL is syntactically invalid.
    #[error("Invalid metadata URL \"{url}\": {message}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Description of the syntax problem.
        message: String,
    },

    /// The metadata URL does not use HTTPS and plain HTTP is not allowed.
    #[error("Metadata URL is not secure: \"{url}\"")]
    InsecureUrl {
        /// The offending URL.
        url: String,
    },

    /// The metadata URL is not on the configured whitelist.
    #[error("Metadata URL is not whitelisted: \"{url}\"")]
    UrlNotWhitelisted {
        /// The offending URL.
        url: String,
    },

    /// A network error occurred while fetching the document.
    #[error("Metadata transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The fetch did not complete within the configured timeout.
    #[error("Metadata fetch timed out for \"{url}\"")]
    Timeout {
        /// The URL being fetched.
        url: String,
    },

    /// The remote endpoint returned a non-success HTTP status.
    #[error("Metadata fetch failed: HTTP status {status}")]
    HttpStatus {
        /// The returned status code.
        status: u16,
    },

    /// The response exceeded the maximum allowed size.
    #[error("Metadata response exceeds maximum size of {max} bytes")]
    ResponseTooLarge {
        /// The maximum allowed size.
        max: usize,
    },

    /// Digital signature verification failed.
    #[error("Metadata signature verification failed: {message}")]
    Signature {
        /// Description of the verification failure.
        message: String,
    },

    /// The document's entity issuer is not on the configured whitelist.
    #[error("Untrusted metadata issuer: \"{issuer}\"")]
    Untrusted {
        /// The rejected issuer.
        issuer: String,
    },

    /// The document's validity window has passed.
    #[error("Metadata for \"{url}\" is no longer valid")]
    Expired {
        /// The URL whose metadata expired.
        url: String,
    },

    /// The verified document could not be parsed into entity metadata.
    #[error("Metadata parse error: {message}")]
    Parse {
        /// Description of the parse failure.
        message: String,
    },

    /// The backing trust cache failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl From<crate::signer::SignatureError> for MetadataError {
    fn from(err: crate::signer::SignatureError) -> Self {
        Self::Signature {
            message: err.to_string(),
        }
    }
}

impl MetadataError {
    /// Creates a new `InvalidUrl` error.
    #[must_use]
    pub fn invalid_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Transport` error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a new `Signature` error.
    #[must_use]
    pub fn signature(message: impl Into<String>) -> Self {
        Self::Signature {
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

    /// Returns `true` if this error is a security decision: the partner
    /// must not be trusted and the exchange must abort. Never cached,
    /// never downgraded.
    #[must_use]
    pub fn is_trust_error(&self) -> bool {
        matches!(
            self,
            Self::Signature { .. }
                | Self::Untrusted { .. }
                | Self::Expired { .. }
                | Self::UrlNotWhitelisted { .. }
                | Self::InsecureUrl { .. }
        )
    }

    /// Returns `true` if this error indicates transient unavailability the
    /// caller may retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Timeout { .. } | Self::HttpStatus { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MetadataError::InsecureUrl {
            url: "http://partner.eu/md".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Metadata URL is not secure: \"http://partner.eu/md\""
        );

        let err = MetadataError::Untrusted {
            issuer: "https://rogue.example".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Untrusted metadata issuer: \"https://rogue.example\""
        );
    }

    #[test]
    fn test_trust_errors_are_not_retryable() {
        let trust = [
            MetadataError::signature("bad signature"),
            MetadataError::Untrusted {
                issuer: "x".to_string(),
            },
            MetadataError::Expired {
                url: "x".to_string(),
            },
            MetadataError::UrlNotWhitelisted {
                url: "x".to_string(),
            },
        ];
        for err in trust {
            assert!(err.is_trust_error(), "{err}");
            assert!(!err.is_retryable(), "{err}");
        }
    }

    #[test]
    fn test_transport_errors_are_retryable() {
        let transient = [
            MetadataError::transport("connection refused"),
            MetadataError::Timeout {
                url: "x".to_string(),
            },
            MetadataError::HttpStatus { status: 503 },
        ];
        for err in transient {
            assert!(err.is_retryable(), "{err}");
            assert!(!err.is_trust_error(), "{err}");
        }
    }
}
