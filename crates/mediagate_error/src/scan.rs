//! Scanner invocation error types.

/// Kinds of scanner failures.
///
/// A scanner that runs and reports an infected file is not an error; these
/// cover the cases where no verdict could be produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ScanErrorKind {
    /// The scanner process could not be started
    #[display("Failed to spawn scanner: {}", _0)]
    Spawn(String),
}

/// Scanner error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Scan Error: {} at line {} in {}", kind, line, file)]
pub struct ScanError {
    /// The kind of error that occurred
    pub kind: ScanErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ScanError {
    /// Create a new scan error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ScanErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
