//! Cache backend error types.

/// Errors that can occur during cache backend operations.
///
/// A cache that cannot be reached is a deployment problem, not a transient
/// condition the node can paper over: without the shared map there is no
/// cross-instance correlation, so callers must treat these errors as fatal
/// for the in-flight exchange.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// The backend is misconfigured (bad URL, zero capacity, missing
    /// settings). Surfaced at startup or on first use; not retried.
    #[error("Cache configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// The backend is unreachable or an operation against it failed.
    #[error("Cache backend error: {message}")]
    Backend {
        /// Description of the backend failure.
        message: String,
    },
}

impl CacheError {
    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Backend` error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Returns `true` if this error indicates a configuration problem.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}
