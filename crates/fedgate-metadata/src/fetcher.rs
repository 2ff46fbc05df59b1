//! Metadata fetch-and-verify orchestration.
//!
//! The fetcher turns a metadata URL into verified [`EntityMetadata`], in a
//! fixed order: URL syntax, scheme policy, URL whitelist, transport fetch,
//! signature verification, parse, validity window, issuer whitelist. The
//! first failing step aborts the sequence; trust failures are never
//! cached by the layer above.

use std::sync::Arc;

use fedgate_core::Clock;
use url::Url;

use crate::MetadataResult;
use crate::error::MetadataError;
use crate::model::EntityMetadata;
use crate::signer::{MetadataParser, MetadataSigner};
use crate::transport::MetadataTransport;
use crate::whitelist::{MatchPolicy, WhitelistSet, is_trusted};

/// Resolves and verifies remote-partner metadata.
///
/// Collaborators are injected at construction: the transport obtains raw
/// bytes, the signer proves the signature, the parser produces the typed
/// model. The fetcher holds no mutable state and is shared freely.
pub struct MetadataFetcher {
    transport: Arc<dyn MetadataTransport>,
    signer: Arc<dyn MetadataSigner>,
    parser: Arc<dyn MetadataParser>,
    clock: Arc<dyn Clock>,
    whitelist: Option<WhitelistSet>,
    match_policy: MatchPolicy,
    allow_http: bool,
}

impl MetadataFetcher {
    /// Creates a fetcher with no whitelist and HTTPS-only fetching.
    #[must_use]
    pub fn new(
        transport: Arc<dyn MetadataTransport>,
        signer: Arc<dyn MetadataSigner>,
        parser: Arc<dyn MetadataParser>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            signer,
            parser,
            clock,
            whitelist: None,
            match_policy: MatchPolicy::Exact,
            allow_http: false,
        }
    }

    /// Restricts accepted metadata sources and issuers to `whitelist`.
    ///
    /// With a whitelist configured, both the metadata URL and the parsed
    /// entity issuer must match it. An empty whitelist rejects everything;
    /// pass no whitelist at all to run unrestricted.
    #[must_use]
    pub fn with_whitelist(mut self, whitelist: WhitelistSet, policy: MatchPolicy) -> Self {
        self.whitelist = Some(whitelist);
        self.match_policy = policy;
        self
    }

    /// Permits plain-HTTP metadata URLs.
    ///
    /// # Warning
    ///
    /// This should only be used for testing. Production metadata exchange
    /// always uses HTTPS.
    #[must_use]
    pub fn with_allow_http(mut self, allow: bool) -> Self {
        self.allow_http = allow;
        self
    }

    /// Fetches, verifies and parses the metadata published at `url`.
    ///
    /// # Errors
    ///
    /// Fails closed on any doubt: invalid or insecure URL, URL or issuer
    /// not whitelisted, transport failure, signature failure, document
    /// past its validity window, or unparseable content.
    pub async fn fetch_and_verify(&self, url: &str) -> MetadataResult<EntityMetadata> {
        let parsed = self.validate_url(url)?;

        let raw = self.transport.fetch(&parsed).await?;

        let verified = self.signer.verify(&raw).map_err(|e| {
            tracing::warn!(url = %url, error = %e, "metadata signature verification failed");
            MetadataError::from(e)
        })?;

        let metadata = self.parser.parse(&verified)?;

        if !metadata.is_valid_at(self.clock.now_utc()) {
            tracing::warn!(url = %url, "metadata validity window has passed");
            return Err(MetadataError::Expired {
                url: url.to_string(),
            });
        }

        if let Some(whitelist) = &self.whitelist
            && !is_trusted(&metadata.entity_id, Some(whitelist), self.match_policy)
        {
            tracing::warn!(
                url = %url,
                issuer = %metadata.entity_id,
                "metadata issuer is not whitelisted"
            );
            return Err(MetadataError::Untrusted {
                issuer: metadata.entity_id.clone(),
            });
        }

        tracing::debug!(url = %url, entity_id = %metadata.entity_id, "metadata verified");
        Ok(metadata)
    }

    fn validate_url(&self, url: &str) -> MetadataResult<Url> {
        let parsed = Url::parse(url)
            .map_err(|e| MetadataError::invalid_url(url, e.to_string()))?;

        match parsed.scheme() {
            "https" => {}
            "http" if self.allow_http => {}
            _ => {
                return Err(MetadataError::InsecureUrl {
                    url: url.to_string(),
                });
            }
        }

        if let Some(whitelist) = &self.whitelist
            && !is_trusted(url, Some(whitelist), self.match_policy)
        {
            return Err(MetadataError::UrlNotWhitelisted {
                url: url.to_string(),
            });
        }

        Ok(parsed)
    }
}
