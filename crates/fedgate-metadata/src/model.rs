//! Remote-partner metadata model.
//!
//! An immutable snapshot of what a partner publishes about itself: which
//! roles it plays, which bindings and endpoints each role exposes, which
//! certificates it signs and encrypts with, and which assurance levels it
//! supports. Instances only ever come out of the fetcher after signature
//! verification succeeded.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Which side of the federation a role descriptor describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetadataRole {
    /// Service-provider side (the connector).
    ServiceProvider,
    /// Identity-provider side (the proxy service).
    IdentityProvider,
}

/// One role a partner entity plays, with the material that role presents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDescriptor {
    /// Which role this descriptor describes.
    pub role: Option<MetadataRole>,

    /// Protocol bindings the role supports.
    #[serde(default)]
    pub protocol_bindings: IndexSet<String>,

    /// Endpoint locations, keyed by binding.
    #[serde(default)]
    pub endpoints: IndexMap<String, String>,

    /// The binding to use when the caller expresses no preference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_binding: Option<String>,

    /// Signing certificates, base64-encoded DER.
    #[serde(default)]
    pub signing_certificates: Vec<String>,

    /// Encryption certificates, base64-encoded DER.
    #[serde(default)]
    pub encryption_certificates: Vec<String>,
}

impl RoleDescriptor {
    /// Creates an empty descriptor for `role`.
    #[must_use]
    pub fn new(role: MetadataRole) -> Self {
        Self {
            role: Some(role),
            ..Self::default()
        }
    }

    /// Returns the endpoint location for `binding`, if the role exposes
    /// one.
    #[must_use]
    pub fn endpoint(&self, binding: &str) -> Option<&str> {
        self.endpoints.get(binding).map(String::as_str)
    }
}

/// A remote partner's published metadata, parsed and signature-verified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    /// The partner's entity identifier (conventionally its metadata URL).
    pub entity_id: String,

    /// End of the document's validity window; absent means no limit.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub valid_until: Option<OffsetDateTime>,

    /// Country the node operates for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_country: Option<String>,

    /// Assurance levels the entity supports.
    #[serde(default)]
    pub assurance_levels: Vec<String>,

    /// Protocol versions the entity speaks.
    #[serde(default)]
    pub protocol_versions: Vec<String>,

    /// Role descriptors published by the entity.
    #[serde(default)]
    pub roles: Vec<RoleDescriptor>,
}

impl EntityMetadata {
    /// Creates metadata for `entity_id` with no roles.
    #[must_use]
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            ..Self::default()
        }
    }

    /// Returns the first descriptor for `role`, if the entity publishes
    /// one.
    #[must_use]
    pub fn role(&self, role: MetadataRole) -> Option<&RoleDescriptor> {
        self.roles
            .iter()
            .find(|descriptor| descriptor.role == Some(role))
    }

    /// Returns `true` if the validity window covers `now`. An absent
    /// `valid_until` means the document does not limit its own validity.
    #[must_use]
    pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
        match self.valid_until {
            None => true,
            Some(valid_until) => now < valid_until,
        }
    }
}

/// A trust cache entry: verified metadata plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataTrustEntry {
    /// Where the document was fetched from.
    pub source_url: String,

    /// The verified, parsed metadata.
    pub parameters: EntityMetadata,

    /// When the entry was inserted.
    #[serde(with = "time::serde::rfc3339")]
    pub cached_at: OffsetDateTime,
}
