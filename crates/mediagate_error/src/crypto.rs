//! Attachment decryption error types.

/// Kinds of decryption failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum CryptoErrorKind {
    /// Key type or algorithm is not AES-256-CTR
    #[display("Unsupported algorithm: {}", _0)]
    UnsupportedAlgorithm(String),
    /// Descriptor version is not understood
    #[display("Unsupported encryption version: {}", _0)]
    UnsupportedVersion(String),
    /// Key is not valid unpadded base64url of the right length
    #[display("Invalid key: {}", _0)]
    InvalidKey(String),
    /// IV is not valid base64 of the right length
    #[display("Invalid IV: {}", _0)]
    InvalidIv(String),
    /// Descriptor carries no SHA-256 hash
    #[display("Missing sha256 hash")]
    MissingHash,
    /// Ciphertext does not match the descriptor's hash
    #[display("Ciphertext hash mismatch: expected {}, got {}", expected, actual)]
    HashMismatch {
        /// Hash announced by the descriptor
        expected: String,
        /// Hash of the fetched bytes
        actual: String,
    },
    /// Reading ciphertext or writing plaintext failed
    #[display("I/O failure: {}", _0)]
    Io(String),
}

/// Decryption error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Crypto Error: {} at line {} in {}", kind, line, file)]
pub struct CryptoError {
    /// The kind of error that occurred
    pub kind: CryptoErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl CryptoError {
    /// Create a new crypto error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CryptoErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
