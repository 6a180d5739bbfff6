//! Shared test helpers for the report pipeline.

#![allow(dead_code)]

mod encrypt;
mod mock_collaborators;

pub use encrypt::encrypt_attachment;
pub use mock_collaborators::{MockFetcher, MockScanner};

use mediagate_core::ReportConfig;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Homeserver used by every test configuration.
pub const BASE_URL: &str = "https://hs.example";

/// Configuration whose workspaces live under `temp_dir/work`.
pub fn test_config(temp_dir: &TempDir) -> ReportConfig {
    ReportConfig::new(BASE_URL, work_root(temp_dir), "/nonexistent/scanner").unwrap()
}

/// Root directory the pipeline creates workspaces in.
pub fn work_root(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("work")
}

/// Number of entries left under `root`; a missing root counts as empty.
pub fn leftover_entries(root: &Path) -> usize {
    std::fs::read_dir(root).map(|dir| dir.count()).unwrap_or(0)
}
