//! Turning a clean report into a downloadable file.

use crate::GeneratedReport;
use mediagate_error::{ClientError, ClientErrorKind, InternalError, MediagateResult};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempPath;

/// Upstream headers passed through to the downloader.
pub const DELIVERED_HEADERS: [&str; 3] = [
    "content-type",
    "content-disposition",
    "content-security-policy",
];

/// A scanned, clean file ready to be served.
///
/// Holding this keeps the file on disk.
#[derive(Debug, Clone)]
pub struct ScannedDownload {
    /// The fetched bytes
    pub file: Arc<TempPath>,
    /// Whitelisted upstream headers, lower-cased names
    pub headers: BTreeMap<String, String>,
}

impl ScannedDownload {
    /// Build a download from a pipeline outcome.
    ///
    /// # Errors
    ///
    /// An unclean verdict is a forbidden client error carrying the
    /// scanner's info.
    pub fn from_report(report: GeneratedReport) -> MediagateResult<Self> {
        let GeneratedReport { result, file } = report;
        if !result.clean {
            tracing::warn!(
                exit_code = result.exit_code,
                info = %result.info,
                "Refusing to deliver unclean media"
            );
            return Err(ClientError::new(ClientErrorKind::NotClean(result.info)).into());
        }

        let file = file.ok_or_else(|| InternalError::new("Clean report has no retained file"))?;
        let headers = result
            .headers
            .into_iter()
            .filter(|(name, _)| {
                DELIVERED_HEADERS
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(name))
            })
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();

        Ok(Self { file, headers })
    }

    /// Location of the file on disk.
    pub fn path(&self) -> &Path {
        &self.file
    }
}
