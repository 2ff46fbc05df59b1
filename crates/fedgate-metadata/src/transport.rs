//! Raw metadata document transports.
//!
//! The fetcher obtains document bytes through the [`MetadataTransport`]
//! seam. Two implementations are provided: [`HttpMetadataTransport`] for
//! remote endpoints and [`FileMetadataTransport`] for a local/static
//! directory of pre-distributed documents. Scheme policy (HTTPS
//! enforcement) is applied by the fetcher before any transport is asked.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use fedgate_core::sha256_base64url;
use url::Url;

use crate::MetadataResult;
use crate::error::MetadataError;

/// Fetches raw metadata document bytes for a URL.
#[async_trait]
pub trait MetadataTransport: Send + Sync {
    /// Resolves `url` to the raw document bytes.
    ///
    /// # Errors
    ///
    /// Returns a transport error (network failure, missing file), a
    /// timeout, a non-success HTTP status, or a size violation. Never
    /// retries on its own.
    async fn fetch(&self, url: &Url) -> MetadataResult<Vec<u8>>;
}

/// HTTP(S) transport with bounded timeout and response size.
pub struct HttpMetadataTransport {
    client: reqwest::Client,
    max_response_size: usize,
}

impl HttpMetadataTransport {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default response size cap: 1 MB.
    pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 1024 * 1024;

    /// Creates a transport with the given timeout and response size cap.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should not happen in
    /// practice).
    #[must_use]
    pub fn new(request_timeout: Duration, max_response_size: usize) -> Self {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            max_response_size,
        }
    }

    /// Creates a transport with default timeout and size cap.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT, Self::DEFAULT_MAX_RESPONSE_SIZE)
    }
}

#[async_trait]
impl MetadataTransport for HttpMetadataTransport {
    async fn fetch(&self, url: &Url) -> MetadataResult<Vec<u8>> {
        tracing::debug!(url = %url, "fetching metadata document");

        let response = self.client.get(url.as_str()).send().await.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "metadata fetch failed");
            if e.is_timeout() {
                MetadataError::Timeout {
                    url: url.to_string(),
                }
            } else {
                MetadataError::transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::HttpStatus {
                status: status.as_u16(),
            });
        }

        if let Some(len) = response.content_length()
            && len as usize > self.max_response_size
        {
            return Err(MetadataError::ResponseTooLarge {
                max: self.max_response_size,
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                MetadataError::Timeout {
                    url: url.to_string(),
                }
            } else {
                MetadataError::transport(e.to_string())
            }
        })?;

        // Content-Length can be absent or lie; enforce the cap on the
        // actual body too.
        if bytes.len() > self.max_response_size {
            return Err(MetadataError::ResponseTooLarge {
                max: self.max_response_size,
            });
        }

        Ok(bytes.to_vec())
    }
}

/// Local/static transport resolving documents from a directory.
///
/// A URL maps to `<dir>/<sha256-base64url(url)>.metadata`, so operators
/// can pre-distribute partner documents without exposing the node to the
/// network. A URL with no corresponding file is a transport error.
#[derive(Debug, Clone)]
pub struct FileMetadataTransport {
    dir: PathBuf,
}

impl FileMetadataTransport {
    /// File extension for stored documents.
    pub const EXTENSION: &'static str = "metadata";

    /// Creates a transport over `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The path a given URL resolves to.
    #[must_use]
    pub fn path_for(&self, url: &Url) -> PathBuf {
        let name = sha256_base64url(url.as_str().as_bytes());
        self.dir.join(format!("{name}.{}", Self::EXTENSION))
    }
}

#[async_trait]
impl MetadataTransport for FileMetadataTransport {
    async fn fetch(&self, url: &Url) -> MetadataResult<Vec<u8>> {
        let path = self.path_for(url);
        tracing::debug!(url = %url, path = %path.display(), "reading local metadata document");
        tokio::fs::read(&path).await.map_err(|e| {
            MetadataError::transport(format!(
                "no local metadata for \"{url}\" at {}: {e}",
                path.display()
            ))
        })
    }
}
