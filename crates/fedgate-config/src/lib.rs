//! # fedgate-config
//!
//! Typed configuration for the fedgate node.
//!
//! A [`NodeConfig`] is loaded from a TOML file with environment-variable
//! overrides (`FEDGATE__` prefix, `__` separator) and validated before the
//! node starts. Validation failures are fatal: a node with a broken cache
//! backend, blank token secrets or malformed TTLs cannot correlate
//! exchanges safely and must not come up.
//!
//! Whitelist URI text is the one deliberate exception: it is passed
//! through raw, because the whitelist parser drops malformed entries
//! per-entry with a warning instead of failing the whole configuration.

pub mod loader;
pub mod node;

pub use loader::load_config;
pub use node::{CorrelationConfig, NodeConfig, TokenDirectionConfig};

/// Errors raised while loading or validating node configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration sources could not be read or merged.
    #[error("Configuration build error: {0}")]
    Build(String),

    /// The merged configuration does not match the expected schema.
    #[error("Configuration parse error: {0}")]
    Parse(String),

    /// The configuration is well-formed but semantically invalid.
    #[error("Configuration validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
