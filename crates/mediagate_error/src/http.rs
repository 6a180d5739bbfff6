//! HTTP transport error types.

/// Transport failure while talking to the upstream media repository.
///
/// `status` is set when the upstream answered with a non-success HTTP status
/// and left empty for connection-level faults (DNS, TLS, reset, body stream).
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("HTTP Error: {} at line {} in {}", message, line, file)]
pub struct HttpError {
    /// The underlying error message
    pub message: String,
    /// Upstream HTTP status code, if the upstream answered at all
    pub status: Option<u16>,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl HttpError {
    /// Create a new HttpError without an upstream status.
    ///
    /// # Examples
    ///
    /// ```
    /// use mediagate_error::HttpError;
    ///
    /// let err = HttpError::new("Connection refused");
    /// assert!(err.message.contains("Connection refused"));
    /// assert_eq!(err.status, None);
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            status: None,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Create a new HttpError for an upstream that answered with `status`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mediagate_error::HttpError;
    ///
    /// let err = HttpError::with_status(404, "Not Found");
    /// assert_eq!(err.status, Some(404));
    /// ```
    #[track_caller]
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            status: Some(status),
            line: location.line(),
            file: location.file(),
        }
    }
}
