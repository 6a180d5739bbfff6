//! Core data types for the mediagate media scanning gateway.
//!
//! This crate holds the vocabulary shared by every other crate: what a media
//! request looks like, how it resolves to a download URL, how its result key
//! is derived, what a scan produces, and the configuration the pipeline needs.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod encrypted;
mod key;
mod media;
mod result;

pub use config::{ReportConfig, ReportConfigBuilder};
pub use encrypted::{EncryptedFile, JsonWebKey};
pub use key::ResultKey;
pub use media::{MediaReference, MediaRequest, ResolvedMedia};
pub use result::{ScanReport, ScanResult, Verdict};
