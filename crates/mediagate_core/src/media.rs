//! Media references and request resolution.

use crate::{EncryptedFile, ResultKey};
use mediagate_error::{ClientError, ClientErrorKind, MediagateResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A `(domain, media_id)` pair identifying a remote media object.
///
/// # Examples
///
/// ```
/// use mediagate_core::MediaReference;
///
/// let media = MediaReference::new("example.org", "abc123");
/// assert_eq!(
///     media.download_url("https://hs.example/"),
///     "https://hs.example/_matrix/media/v1/download/example.org/abc123"
/// );
/// assert_eq!(media.to_string(), "mxc://example.org/abc123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MediaReference {
    /// Server name that owns the media
    pub domain: String,
    /// Media identifier on that server
    pub media_id: String,
}

impl MediaReference {
    /// Create a new media reference.
    pub fn new(domain: impl Into<String>, media_id: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            media_id: media_id.into(),
        }
    }

    /// Parse the reference embedded in an `mxc://domain/media_id` URL.
    ///
    /// # Errors
    ///
    /// Returns a bad-request client error if the URL is not a well-formed
    /// `mxc://` URL.
    pub fn from_mxc(url: &str) -> MediagateResult<Self> {
        let malformed =
            || ClientError::new(ClientErrorKind::BadRequest(format!("Invalid mxc URL: {}", url)));

        let rest = url.strip_prefix("mxc://").ok_or_else(malformed)?;
        let (domain, media_id) = rest.split_once('/').ok_or_else(malformed)?;
        let media = Self::new(domain, media_id);
        media.validate()?;
        Ok(media)
    }

    /// Check that both parts are usable as single URL path segments.
    pub fn validate(&self) -> MediagateResult<()> {
        for (name, part) in [("domain", &self.domain), ("media_id", &self.media_id)] {
            if part.is_empty() || part == "." || part == ".." || part.contains('/') {
                return Err(ClientError::new(ClientErrorKind::BadRequest(format!(
                    "Invalid {}: {:?}",
                    name, part
                )))
                .into());
            }
        }
        Ok(())
    }

    /// Download URL on the media repository rooted at `base_url`.
    pub fn download_url(&self, base_url: &str) -> String {
        format!(
            "{}/_matrix/media/v1/download/{}/{}",
            base_url.trim_end_matches('/'),
            self.domain,
            self.media_id
        )
    }
}

impl fmt::Display for MediaReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mxc://{}/{}", self.domain, self.media_id)
    }
}

/// One logical request against the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRequest {
    /// Media named by the caller
    pub media: MediaReference,
    /// Encryption descriptor, when the media is end-to-end encrypted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<EncryptedFile>,
}

impl MediaRequest {
    /// Request for unencrypted media.
    pub fn plain(domain: impl Into<String>, media_id: impl Into<String>) -> Self {
        Self {
            media: MediaReference::new(domain, media_id),
            file: None,
        }
    }

    /// Request for encrypted media, named by the descriptor's own URL.
    ///
    /// # Errors
    ///
    /// Returns a bad-request client error if the descriptor URL is malformed.
    pub fn encrypted(file: EncryptedFile) -> MediagateResult<Self> {
        let media = MediaReference::from_mxc(&file.url)?;
        Ok(Self {
            media,
            file: Some(file),
        })
    }

    /// Resolve the download URL and result key against `base_url`.
    ///
    /// A descriptor, when present, supersedes `media`: the reference is
    /// re-derived from the descriptor's embedded URL.
    #[tracing::instrument(skip(self), fields(media = %self.media, encrypted = self.file.is_some()))]
    pub fn resolve(&self, base_url: &str) -> MediagateResult<ResolvedMedia> {
        let media = match &self.file {
            Some(file) => MediaReference::from_mxc(&file.url)?,
            None => {
                self.media.validate()?;
                self.media.clone()
            }
        };

        let download_url = media.download_url(base_url);
        let key = ResultKey::derive(&download_url, self.file.as_ref())?;
        tracing::debug!(url = %download_url, key = %key, "Resolved media request");

        Ok(ResolvedMedia {
            media,
            download_url,
            file: self.file.clone(),
            key,
        })
    }
}

/// A request with its download URL and result key worked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    /// Effective media reference
    pub media: MediaReference,
    /// URL the object is fetched from
    pub download_url: String,
    /// Encryption descriptor, if any
    pub file: Option<EncryptedFile>,
    /// Cache and coalescing key
    pub key: ResultKey,
}
