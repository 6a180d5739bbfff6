//! Workspace storage error types.

/// Kinds of storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Failed to create a directory
    #[display("Failed to create directory: {}", _0)]
    DirectoryCreation(String),
    /// Failed to remove a directory tree
    #[display("Failed to remove directory: {}", _0)]
    DirectoryRemoval(String),
    /// Failed to read file
    #[display("Failed to read file: {}", _0)]
    FileRead(String),
    /// Failed to move a file out of its workspace
    #[display("Failed to move file: {}", _0)]
    FileMove(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use mediagate_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::DirectoryRemoval("/tmp/ws".to_string()));
/// assert!(format!("{}", err).contains("Failed to remove directory"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
