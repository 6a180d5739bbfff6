//! Fetching media from the upstream repository.

use async_trait::async_trait;
use futures::StreamExt;
use mediagate_error::HttpError;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::instrument;

/// Response details of a completed fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedMedia {
    /// Response headers, lower-cased names; repeated headers joined by `", "`
    pub headers: BTreeMap<String, String>,
    /// Bytes written to the destination
    pub size: u64,
}

/// Downloads a URL into a local file.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetch `url` into `destination`.
    ///
    /// # Errors
    ///
    /// A non-success upstream status is an [`HttpError`] carrying that
    /// status. Connection faults and local write failures carry none.
    async fn fetch(&self, url: &str, destination: &Path) -> Result<FetchedMedia, HttpError>;
}

/// [`MediaFetcher`] over a `reqwest` client.
///
/// The response body is streamed to disk chunk by chunk.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with a default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fetcher around an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MediaFetcher for HttpFetcher {
    #[instrument(skip(self, destination), fields(url = %url, status = tracing::field::Empty))]
    async fn fetch(&self, url: &str, destination: &Path) -> Result<FetchedMedia, HttpError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::error!(error = %e, "Media request failed");
            HttpError::new(format!("Request to {} failed: {}", url, e))
        })?;

        let status = response.status();
        tracing::Span::current().record("status", status.as_u16());
        if !status.is_success() {
            tracing::warn!("Upstream returned error status");
            return Err(HttpError::with_status(
                status.as_u16(),
                format!("Upstream returned {} for {}", status, url),
            ));
        }

        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in response.headers() {
            let Ok(value) = value.to_str() else {
                tracing::debug!(header = %name, "Skipping non-ASCII header value");
                continue;
            };
            headers
                .entry(name.as_str().to_ascii_lowercase())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }

        let mut file = tokio::fs::File::create(destination).await.map_err(|e| {
            HttpError::new(format!("Failed to create {}: {}", destination.display(), e))
        })?;

        let mut size = 0u64;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| {
                tracing::error!(error = %e, "Media body stream failed");
                HttpError::new(format!("Failed to read body of {}: {}", url, e))
            })?;
            file.write_all(&chunk).await.map_err(|e| {
                HttpError::new(format!("Failed to write {}: {}", destination.display(), e))
            })?;
            size += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| {
            HttpError::new(format!("Failed to flush {}: {}", destination.display(), e))
        })?;

        tracing::debug!(size, "Fetched media");
        Ok(FetchedMedia { headers, size })
    }
}
