//! Client-facing error types.
//!
//! These are the failures a caller of the gateway is expected to act on. Each
//! kind carries a fixed HTTP status and a stable reason code so the delivery
//! layer can pass them through untouched.

/// Kinds of client-facing errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ClientErrorKind {
    /// The upstream media repository answered with a non-success status
    #[display("Failed to get requested URL {} (upstream status {})", url, status)]
    UpstreamFetch {
        /// Upstream HTTP status code
        status: u16,
        /// URL that was requested
        url: String,
    },
    /// The fetched object could not be decrypted with the supplied descriptor
    #[display("Failed to decrypt file: {}", _0)]
    Decryption(String),
    /// The request itself is malformed
    #[display("Bad request: {}", _0)]
    BadRequest(String),
    /// The scanner rejected the file
    #[display("{}", _0)]
    NotClean(String),
}

impl ClientErrorKind {
    /// HTTP status code surfaced to the caller.
    pub fn status_code(&self) -> u16 {
        match self {
            ClientErrorKind::UpstreamFetch { .. } => 502,
            ClientErrorKind::Decryption(_) | ClientErrorKind::BadRequest(_) => 400,
            ClientErrorKind::NotClean(_) => 403,
        }
    }

    /// Stable machine-readable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            ClientErrorKind::UpstreamFetch { .. } => "MCS_MEDIA_REQUEST_FAILED",
            ClientErrorKind::Decryption(_) => "MCS_MEDIA_FAILED_TO_DECRYPT",
            ClientErrorKind::BadRequest(_) => "MCS_BAD_REQUEST",
            ClientErrorKind::NotClean(_) => "MCS_MEDIA_NOT_CLEAN",
        }
    }
}

/// Client-facing error with location tracking.
///
/// # Examples
///
/// ```
/// use mediagate_error::{ClientError, ClientErrorKind};
///
/// let err = ClientError::new(ClientErrorKind::UpstreamFetch {
///     status: 404,
///     url: "https://matrix.example/_matrix/media/v1/download/a/b".to_string(),
/// });
/// assert_eq!(err.kind.status_code(), 502);
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Client Error: {} at line {} in {}", kind, line, file)]
pub struct ClientError {
    /// The kind of error that occurred
    pub kind: ClientErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ClientError {
    /// Create a new client error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ClientErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
