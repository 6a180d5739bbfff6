//! Error types for the mediagate workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! Every type is `Clone`: a failed pipeline execution is handed to each
//! coalesced caller as its own copy of the same error.
//!
//! # Examples
//!
//! ```
//! use mediagate_error::{ClientError, ClientErrorKind, MediagateResult};
//!
//! fn deliver(clean: bool) -> MediagateResult<()> {
//!     if !clean {
//!         Err(ClientError::new(ClientErrorKind::NotClean("File is not clean".into())))?
//!     }
//!     Ok(())
//! }
//!
//! let err = deliver(false).unwrap_err();
//! assert_eq!(err.status_code(), 403);
//! assert_eq!(err.reason(), "MCS_MEDIA_NOT_CLEAN");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod crypto;
mod error;
mod http;
mod internal;
mod scan;
mod storage;

pub use client::{ClientError, ClientErrorKind};
pub use config::ConfigError;
pub use crypto::{CryptoError, CryptoErrorKind};
pub use error::{MediagateError, MediagateErrorKind, MediagateResult};
pub use http::HttpError;
pub use internal::InternalError;
pub use scan::{ScanError, ScanErrorKind};
pub use storage::{StorageError, StorageErrorKind};
