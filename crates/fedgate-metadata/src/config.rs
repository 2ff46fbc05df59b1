//! Metadata subsystem configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::transport::{FileMetadataTransport, HttpMetadataTransport, MetadataTransport};
use crate::whitelist::{MatchPolicy, WhitelistSet};

/// Which side of the federation this node plays.
///
/// A connector validates proxy-service partners and vice versa; each role
/// carries its own whitelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeRole {
    /// Service-provider side.
    Connector,
    /// Identity-provider side.
    ProxyService,
}

/// Whitelist configuration for one role.
///
/// The raw URI text is deliberately not validated here: it flows into
/// [`WhitelistSet::parse`], which drops malformed entries with a warning
/// instead of failing the whole configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WhitelistConfig {
    /// Whether whitelisting is enforced for this role.
    pub enabled: bool,

    /// Semicolon-separated trusted URIs.
    pub uris: String,

    /// How issuers are compared against the entries.
    pub match_policy: MatchPolicy,
}

impl WhitelistConfig {
    /// Builds the whitelist, or `None` when enforcement is disabled.
    #[must_use]
    pub fn build(&self) -> Option<WhitelistSet> {
        self.enabled.then(|| WhitelistSet::parse(&self.uris))
    }
}

/// Configuration for metadata fetching and caching.
///
/// # Example (TOML)
///
/// ```toml
/// ttl = "1h"
/// allow_http = false
/// request_timeout = "10s"
///
/// [connector_whitelist]
/// enabled = true
/// uris = "https://a.example.eu/md;https://b.example.eu/md"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Absolute TTL: cached metadata older than this is re-fetched.
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,

    /// Bound on a single coalesced fetch, waiters included.
    #[serde(with = "humantime_serde")]
    pub fetch_timeout: Duration,

    /// HTTP request timeout.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Maximum accepted response size in bytes.
    pub max_response_size: usize,

    /// Whether plain-HTTP metadata URLs are permitted (testing only).
    pub allow_http: bool,

    /// Directory of pre-distributed metadata documents; when set, the
    /// file transport is used instead of HTTP.
    pub file_source_dir: Option<PathBuf>,

    /// Whitelist applied when validating connector partners.
    pub connector_whitelist: WhitelistConfig,

    /// Whitelist applied when validating proxy-service partners.
    pub proxy_service_whitelist: WhitelistConfig,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            fetch_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(10),
            max_response_size: 1024 * 1024,
            allow_http: false,
            file_source_dir: None,
            connector_whitelist: WhitelistConfig::default(),
            proxy_service_whitelist: WhitelistConfig::default(),
        }
    }
}

impl MetadataConfig {
    /// The whitelist configuration for partners of the given role.
    #[must_use]
    pub fn whitelist_config(&self, role: NodeRole) -> &WhitelistConfig {
        match role {
            NodeRole::Connector => &self.connector_whitelist,
            NodeRole::ProxyService => &self.proxy_service_whitelist,
        }
    }

    /// Builds the configured transport: the local file source when
    /// `file_source_dir` is set, HTTP(S) otherwise.
    #[must_use]
    pub fn build_transport(&self) -> Arc<dyn MetadataTransport> {
        match &self.file_source_dir {
            Some(dir) => Arc::new(FileMetadataTransport::new(dir)),
            None => Arc::new(HttpMetadataTransport::new(
                self.request_timeout,
                self.max_response_size,
            )),
        }
    }
}
