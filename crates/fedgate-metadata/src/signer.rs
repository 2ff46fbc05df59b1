//! External collaborator seams: signature verification and document
//! parsing.
//!
//! The XML/SAML layer lives outside this core. It is consumed through two
//! narrow traits: [`MetadataSigner`] proves a raw document's signature and
//! [`MetadataParser`] turns a verified document into [`EntityMetadata`].
//! The fetcher never looks inside the document itself.

use crate::MetadataResult;
use crate::model::EntityMetadata;

/// A raw metadata document whose digital signature has been verified.
///
/// Only a [`MetadataSigner`] produces values of this type; holding one is
/// the fetcher's proof that verification happened before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedDocument {
    bytes: Vec<u8>,
}

impl VerifiedDocument {
    /// Wraps document bytes that passed signature verification.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// The verified document bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the wrapper, returning the document bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Digital signature verification failed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct SignatureError {
    message: String,
}

impl SignatureError {
    /// Creates an error with the given description.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Verifies the digital signature of raw metadata documents.
///
/// Implemented by the protocol engine; this core only consumes the
/// verification side of it.
pub trait MetadataSigner: Send + Sync {
    /// Verifies `raw` and returns it as a [`VerifiedDocument`].
    ///
    /// # Errors
    ///
    /// Returns an error if the signature is absent, malformed, or does not
    /// verify against the document content.
    fn verify(&self, raw: &[u8]) -> Result<VerifiedDocument, SignatureError>;
}

/// Parses a verified document into [`EntityMetadata`].
pub trait MetadataParser: Send + Sync {
    /// Parses `document` into entity metadata.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Parse`](crate::MetadataError::Parse) when
    /// the document does not describe a valid entity.
    fn parse(&self, document: &VerifiedDocument) -> MetadataResult<EntityMetadata>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verified_document_accessors() {
        let doc = VerifiedDocument::new(b"<EntityDescriptor/>".to_vec());
        assert_eq!(doc.as_bytes(), b"<EntityDescriptor/>");
        assert_eq!(doc.into_bytes(), b"<EntityDescriptor/>".to_vec());
    }

    #[test]
    fn test_signature_error_display() {
        let err = SignatureError::new("certificate not trusted");
        assert_eq!(err.to_string(), "certificate not trusted");
    }
}
