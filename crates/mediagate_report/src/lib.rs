//! Report pipeline for the mediagate media scanning gateway.
//!
//! A request is resolved to a download URL and result key, fetched into a
//! private workspace, decrypted when it carries an encryption descriptor,
//! and handed to the scanner. Verdicts are cached per key and concurrent
//! requests for the same key share one pipeline run.
//!
//! # Example
//!
//! ```no_run
//! use mediagate_core::{MediaRequest, ReportConfig};
//! use mediagate_report::ReportService;
//!
//! # #[tokio::main]
//! # async fn main() -> mediagate_error::MediagateResult<()> {
//! let config = ReportConfig::new("https://matrix.org", "/tmp/mediagate", "./scan.sh")?;
//! let service = ReportService::new(config);
//!
//! let request = MediaRequest::plain("matrix.org", "abc123");
//! let result = service.generate_report(&request).await?;
//! println!("clean: {}", result.clean);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod decrypt;
mod delivery;
mod fetch;
mod generator;
mod scanner;
mod service;

pub use decrypt::{AttachmentDecryptor, Decryptor};
pub use delivery::{DELIVERED_HEADERS, ScannedDownload};
pub use fetch::{FetchedMedia, HttpFetcher, MediaFetcher};
pub use generator::{DECRYPTED_FILE, FETCHED_FILE, GeneratedReport, ReportGenerator};
pub use scanner::{CLEAN_INFO, CommandScanner, NOT_CLEAN_INFO, Scanner};
pub use service::{ReportService, ReportServiceBuilder};
