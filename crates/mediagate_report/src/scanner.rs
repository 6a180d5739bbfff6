//! Invoking the external scanner.

use async_trait::async_trait;
use mediagate_core::Verdict;
use mediagate_error::{MediagateResult, ScanError, ScanErrorKind};
use std::path::Path;
use tokio::process::Command;
use tracing::instrument;

/// Info reported for a clean file when the scanner prints nothing.
pub const CLEAN_INFO: &str = "File is clean";

/// Info reported for an unclean file when the scanner prints nothing.
pub const NOT_CLEAN_INFO: &str = "File is not clean";

/// Produces a verdict for a local file.
#[async_trait]
pub trait Scanner: Send + Sync {
    /// Scan the file at `path`.
    async fn scan(&self, path: &Path) -> MediagateResult<Verdict>;
}

/// [`Scanner`] that runs an external command.
///
/// The configured script is split on whitespace into a program and leading
/// arguments; the file path is appended as the final argument. No shell is
/// involved. Exit code 0 means clean; any other code, or termination by a
/// signal (reported as -1), means not clean.
#[derive(Debug, Clone)]
pub struct CommandScanner {
    script: String,
}

impl CommandScanner {
    /// Create a scanner for `script`.
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
        }
    }

    /// The configured script.
    pub fn script(&self) -> &str {
        &self.script
    }
}

#[async_trait]
impl Scanner for CommandScanner {
    #[instrument(skip(self), fields(script = %self.script, path = %path.display()))]
    async fn scan(&self, path: &Path) -> MediagateResult<Verdict> {
        let mut parts = self.script.split_whitespace();
        let program = parts.next().ok_or_else(|| {
            ScanError::new(ScanErrorKind::Spawn("scanner script is empty".to_string()))
        })?;

        let output = Command::new(program)
            .args(parts)
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to run scanner");
                ScanError::new(ScanErrorKind::Spawn(format!("{}: {}", program, e)))
            })?;

        let exit_code = output.status.code().unwrap_or(-1);
        let clean = exit_code == 0;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            tracing::debug!(stderr = %stderr.trim(), "Scanner wrote to stderr");
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let info = match stdout.trim() {
            "" if clean => CLEAN_INFO.to_string(),
            "" => NOT_CLEAN_INFO.to_string(),
            text => text.to_string(),
        };

        tracing::info!(exit_code, clean, "Scanner finished");
        Ok(Verdict {
            clean,
            info,
            exit_code,
        })
    }
}
