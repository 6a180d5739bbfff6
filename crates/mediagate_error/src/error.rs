//! Top-level error wrapper types.

use crate::{
    ClientError, ConfigError, CryptoError, HttpError, InternalError, ScanError, StorageError,
};

/// All error conditions raised inside the gateway.
///
/// # Examples
///
/// ```
/// use mediagate_error::{HttpError, MediagateError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: MediagateError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, Clone, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum MediagateErrorKind {
    /// Transport failure without an upstream status
    #[from(HttpError)]
    Http(HttpError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Workspace storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Client-facing error (bad gateway, bad request, forbidden)
    #[from(ClientError)]
    Client(ClientError),
    /// Attachment decryption error
    #[from(CryptoError)]
    Crypto(CryptoError),
    /// Scanner invocation error
    #[from(ScanError)]
    Scan(ScanError),
    /// Unexpected internal error
    #[from(InternalError)]
    Internal(InternalError),
}

/// Mediagate error with kind discrimination.
///
/// # Examples
///
/// ```
/// use mediagate_error::{ConfigError, MediagateResult};
///
/// fn might_fail() -> MediagateResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// let err = might_fail().unwrap_err();
/// assert_eq!(err.status_code(), 500);
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Mediagate Error: {}", _0)]
pub struct MediagateError(Box<MediagateErrorKind>);

impl MediagateError {
    /// Create a new error from a kind.
    pub fn new(kind: MediagateErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &MediagateErrorKind {
        &self.0
    }

    /// HTTP status code a delivery layer should answer with.
    ///
    /// Only client-facing errors map to 4xx/502; everything else is an
    /// internal failure.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            MediagateErrorKind::Client(err) => err.kind.status_code(),
            _ => 500,
        }
    }

    /// Stable reason code for response bodies.
    pub fn reason(&self) -> &'static str {
        match self.kind() {
            MediagateErrorKind::Client(err) => err.kind.reason(),
            _ => "M_UNKNOWN",
        }
    }

    /// Client-facing error kind, if this is one.
    pub fn client_kind(&self) -> Option<&crate::ClientErrorKind> {
        match self.kind() {
            MediagateErrorKind::Client(err) => Some(&err.kind),
            _ => None,
        }
    }
}

// Generic From implementation for any type that converts to MediagateErrorKind
impl<T> From<T> for MediagateError
where
    T: Into<MediagateErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for mediagate operations.
pub type MediagateResult<T> = std::result::Result<T, MediagateError>;
