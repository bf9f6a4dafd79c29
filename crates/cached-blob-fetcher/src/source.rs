//! Where blobs come from on a cache miss

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// A response from the remote origin, before classification
#[derive(Debug, Clone)]
pub struct SourceResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl SourceResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetches the content behind a resource key
///
/// Returning `Err` means no response was obtained at all. Error statuses are
/// returned as a normal [`SourceResponse`] and left to
/// [`classify`](crate::envelope::classify).
#[async_trait]
pub trait BlobSource: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<SourceResponse>;
}

/// Fetches keys as URLs over HTTP
pub struct HttpBlobSource {
    client: Client,
}

impl HttpBlobSource {
    /// Create a source with no request timeout
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpBlobSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobSource for HttpBlobSource {
    async fn fetch(&self, key: &str) -> Result<SourceResponse> {
        debug!(url = %key, "Fetching blob");

        let response = self.client.get(key).send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!(status = %status, url = %key, "Blob fetch returned error status");
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response.bytes().await?;

        debug!(
            size = body.len(),
            content_type = content_type.as_deref().unwrap_or("unknown"),
            "Fetched blob"
        );

        Ok(SourceResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}
