//! Scan outcomes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// What a scanner says about one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the file is safe to serve
    pub clean: bool,
    /// Human-readable detail from the scanner
    pub info: String,
    /// Scanner exit code
    pub exit_code: i32,
}

/// Finalized result of one fetch/decrypt/scan pipeline run.
///
/// `file_path` and `headers` describe the fetch that produced (or, on a
/// cache hit, re-confirmed) the verdict and are meant for delivery within the
/// same response cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Whether the file is safe to serve
    pub clean: bool,
    /// Human-readable detail from the scanner
    pub info: String,
    /// Scanner exit code
    pub exit_code: i32,
    /// Originally fetched (pre-decryption) file
    pub file_path: PathBuf,
    /// Upstream response headers, lower-cased names
    pub headers: BTreeMap<String, String>,
}

impl ScanResult {
    /// Attach fetch details to a verdict.
    pub fn from_verdict(
        verdict: Verdict,
        file_path: impl Into<PathBuf>,
        headers: BTreeMap<String, String>,
    ) -> Self {
        Self {
            clean: verdict.clean,
            info: verdict.info,
            exit_code: verdict.exit_code,
            file_path: file_path.into(),
            headers,
        }
    }

    /// The verdict part of this result.
    pub fn verdict(&self) -> Verdict {
        Verdict {
            clean: self.clean,
            info: self.info.clone(),
            exit_code: self.exit_code,
        }
    }
}

/// Cache-only view of a scan result.
///
/// # Examples
///
/// ```
/// use mediagate_core::ScanReport;
///
/// let report = ScanReport::unscanned();
/// assert_eq!(serde_json::to_string(&report).unwrap(), r#"{"scanned":false}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanReport {
    /// Whether a verdict exists for the request
    pub scanned: bool,
    /// Verdict, when scanned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clean: Option<bool>,
    /// Scanner detail, when scanned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl ScanReport {
    /// Report for a request that has never been scanned.
    pub fn unscanned() -> Self {
        Self {
            scanned: false,
            clean: None,
            info: None,
        }
    }
}

impl From<&ScanResult> for ScanReport {
    fn from(result: &ScanResult) -> Self {
        Self {
            scanned: true,
            clean: Some(result.clean),
            info: Some(result.info.clone()),
        }
    }
}
