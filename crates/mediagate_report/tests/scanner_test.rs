//! Tests for the external command scanner.

#![cfg(unix)]

use mediagate_error::MediagateErrorKind;
use mediagate_report::{CLEAN_INFO, CommandScanner, NOT_CLEAN_INFO, Scanner};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn script(dir: &Path, body: &str) -> String {
    let path = dir.join("scan.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    format!("sh {}", path.display())
}

fn sample(dir: &Path) -> PathBuf {
    let path = dir.join("fetched");
    std::fs::write(&path, b"bytes").unwrap();
    path
}

#[tokio::test]
async fn test_exit_zero_is_clean() {
    let temp_dir = TempDir::new().unwrap();
    let scanner = CommandScanner::new(script(temp_dir.path(), "exit 0"));

    let verdict = scanner.scan(&sample(temp_dir.path())).await.unwrap();

    assert!(verdict.clean);
    assert_eq!(verdict.exit_code, 0);
    assert_eq!(verdict.info, CLEAN_INFO);
}

#[tokio::test]
async fn test_nonzero_exit_is_not_clean() {
    let temp_dir = TempDir::new().unwrap();
    let scanner = CommandScanner::new(script(temp_dir.path(), "exit 3"));

    let verdict = scanner.scan(&sample(temp_dir.path())).await.unwrap();

    assert!(!verdict.clean);
    assert_eq!(verdict.exit_code, 3);
    assert_eq!(verdict.info, NOT_CLEAN_INFO);
}

#[tokio::test]
async fn test_stdout_becomes_info() {
    let temp_dir = TempDir::new().unwrap();
    let scanner = CommandScanner::new(script(
        temp_dir.path(),
        "echo \"  $1: Eicar-Test-Signature FOUND  \"\necho noise >&2\nexit 1",
    ));
    let file = sample(temp_dir.path());

    let verdict = scanner.scan(&file).await.unwrap();

    assert!(!verdict.clean);
    assert_eq!(
        verdict.info,
        format!("{}: Eicar-Test-Signature FOUND", file.display())
    );
}

#[tokio::test]
async fn test_signal_is_not_clean() {
    let temp_dir = TempDir::new().unwrap();
    let scanner = CommandScanner::new(script(temp_dir.path(), "kill -9 $$"));

    let verdict = scanner.scan(&sample(temp_dir.path())).await.unwrap();

    assert!(!verdict.clean);
    assert_eq!(verdict.exit_code, -1);
}

#[tokio::test]
async fn test_missing_program_is_scan_error() {
    let temp_dir = TempDir::new().unwrap();
    let scanner = CommandScanner::new("/nonexistent/scanner --quiet");

    let err = scanner.scan(&sample(temp_dir.path())).await.unwrap_err();

    assert!(matches!(err.kind(), MediagateErrorKind::Scan(_)));
    assert_eq!(err.status_code(), 500);
}
