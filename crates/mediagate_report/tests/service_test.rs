//! End-to-end tests of the report service with mock collaborators.

mod test_utils;

use mediagate_cache::{InMemoryResultCache, ResultCache};
use mediagate_core::{MediaRequest, ReportConfig, ScanReport};
use mediagate_error::{ClientErrorKind, HttpError, MediagateErrorKind};
use mediagate_report::{DECRYPTED_FILE, ReportService};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use test_utils::{
    MockFetcher, MockScanner, encrypt_attachment, leftover_entries, test_config, work_root,
};

const INFECTED: &[u8] = b"X5O!P%@AP[4\\PZX54(P^)7CC)7}$EICAR-STANDARD-ANTIVIRUS-TEST-FILE!$H+H*";

struct Harness {
    temp_dir: TempDir,
    fetcher: Arc<MockFetcher>,
    scanner: Arc<MockScanner>,
    cache: Arc<InMemoryResultCache>,
    service: ReportService,
}

fn harness(fetcher: MockFetcher) -> Harness {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(fetcher);
    let scanner = Arc::new(MockScanner::new());
    let cache = Arc::new(InMemoryResultCache::new());
    let service = ReportService::builder(test_config(&temp_dir))
        .fetcher(fetcher.clone())
        .scanner(scanner.clone())
        .cache(cache.clone())
        .build()
        .unwrap();
    Harness {
        temp_dir,
        fetcher,
        scanner,
        cache,
        service,
    }
}

fn request() -> MediaRequest {
    MediaRequest::plain("example.org", "abc123")
}

#[tokio::test]
async fn test_concurrent_downloads_share_one_fetch() {
    let h = harness(
        MockFetcher::new(b"harmless bytes".to_vec())
            .with_header("content-type", "image/png")
            .with_header("content-disposition", "inline; filename=cat.png")
            .with_header("x-upstream-secret", "hidden"),
    );
    let request = request();

    let (a, b) = tokio::join!(
        h.service.scanned_download(&request),
        h.service.scanned_download(&request),
    );
    let a = a.unwrap();
    let b = b.unwrap();

    assert_eq!(h.fetcher.calls(), 1);
    assert_eq!(h.scanner.calls(), 1);
    assert_eq!(
        h.fetcher.urls(),
        vec!["https://hs.example/_matrix/media/v1/download/example.org/abc123".to_string()]
    );
    assert_eq!(a.path(), b.path());
    assert_eq!(std::fs::read(a.path()).unwrap(), b"harmless bytes");
    assert_eq!(a.headers, b.headers);
    assert_eq!(a.headers.len(), 2);
    assert_eq!(a.headers["content-type"], "image/png");
    assert!(!a.headers.contains_key("x-upstream-secret"));

    let path = a.path().to_path_buf();
    drop(a);
    assert!(path.exists());
    drop(b);
    assert!(!path.exists());
    assert_eq!(leftover_entries(&work_root(&h.temp_dir)), 0);
}

#[tokio::test]
async fn test_get_report_unscanned_does_no_work() {
    let h = harness(MockFetcher::new(b"bytes".to_vec()));

    let report = h.service.get_report(&request()).await.unwrap();

    assert_eq!(report, ScanReport::unscanned());
    assert_eq!(h.fetcher.calls(), 0);
    assert_eq!(h.scanner.calls(), 0);
    assert!(!work_root(&h.temp_dir).exists());
}

#[tokio::test]
async fn test_get_report_after_clean_scan() {
    let h = harness(MockFetcher::new(b"bytes".to_vec()));

    let result = h.service.generate_report(&request()).await.unwrap();
    assert!(result.clean);
    assert_eq!(result.info, "ok");

    let report = h.service.get_report(&request()).await.unwrap();
    assert_eq!(
        report,
        ScanReport {
            scanned: true,
            clean: Some(true),
            info: Some("ok".to_string()),
        }
    );
    assert_eq!(h.fetcher.calls(), 1);
    assert_eq!(h.cache.len(), 1);
}

#[tokio::test]
async fn test_generate_report_leaves_nothing_behind() {
    let h = harness(MockFetcher::new(b"bytes".to_vec()));

    let result = h.service.generate_report(&request()).await.unwrap();

    assert!(result.file_path.starts_with(work_root(&h.temp_dir)));
    assert!(!result.file_path.exists());
    assert_eq!(leftover_entries(&work_root(&h.temp_dir)), 0);
}

#[tokio::test]
async fn test_invalid_key_is_bad_request_and_not_cached() {
    let (ciphertext, mut file) = encrypt_attachment(b"secret", "mxc://example.org/enc1");
    file.key.k = "c2hvcnQ".to_string();
    let h = harness(MockFetcher::new(ciphertext));
    let request = MediaRequest::encrypted(file).unwrap();

    let err = h.service.generate_report(&request).await.unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert_eq!(err.reason(), "MCS_MEDIA_FAILED_TO_DECRYPT");
    assert!(matches!(
        err.client_kind(),
        Some(ClientErrorKind::Decryption(_))
    ));
    assert_eq!(h.scanner.calls(), 0);
    assert_eq!(
        h.service.get_report(&request).await.unwrap(),
        ScanReport::unscanned()
    );
    assert_eq!(leftover_entries(&work_root(&h.temp_dir)), 0);
}

#[tokio::test]
async fn test_upstream_status_is_bad_gateway_then_retry_succeeds() {
    let h = harness(
        MockFetcher::new(b"bytes".to_vec()).fail_next(HttpError::with_status(404, "Not Found")),
    );

    let err = h.service.generate_report(&request()).await.unwrap_err();
    assert_eq!(err.status_code(), 502);
    assert_eq!(err.reason(), "MCS_MEDIA_REQUEST_FAILED");
    assert!(matches!(
        err.client_kind(),
        Some(ClientErrorKind::UpstreamFetch { status: 404, .. })
    ));
    assert!(h.cache.is_empty());
    assert_eq!(leftover_entries(&work_root(&h.temp_dir)), 0);

    let result = h.service.generate_report(&request()).await.unwrap();
    assert!(result.clean);
    assert_eq!(h.fetcher.calls(), 2);
}

#[tokio::test]
async fn test_abandoned_failure_does_not_answer_the_retry() {
    let h = harness(
        MockFetcher::new(b"bytes".to_vec())
            .with_delay(Duration::from_millis(50))
            .fail_next(HttpError::with_status(404, "Not Found")),
    );

    let abandoned =
        tokio::time::timeout(Duration::from_millis(10), h.service.generate_report(&request()))
            .await;
    assert!(abandoned.is_err());
    tokio::time::sleep(Duration::from_millis(200)).await;

    let result = h.service.generate_report(&request()).await.unwrap();
    assert!(result.clean);
    assert_eq!(h.fetcher.calls(), 2);
    assert_eq!(leftover_entries(&work_root(&h.temp_dir)), 0);
}

#[tokio::test]
async fn test_abandoned_download_leaves_nothing_behind() {
    let h = harness(
        MockFetcher::new(b"harmless bytes".to_vec()).with_delay(Duration::from_millis(50)),
    );

    let abandoned =
        tokio::time::timeout(Duration::from_millis(10), h.service.scanned_download(&request()))
            .await;
    assert!(abandoned.is_err());
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(h.fetcher.calls(), 1);
    assert_eq!(h.scanner.calls(), 1);
    assert_eq!(h.cache.len(), 1);
    assert_eq!(leftover_entries(&work_root(&h.temp_dir)), 0);
}

#[tokio::test]
async fn test_transport_fault_is_internal_error() {
    let h = harness(
        MockFetcher::new(b"bytes".to_vec()).fail_next(HttpError::new("connection reset")),
    );

    let err = h.service.generate_report(&request()).await.unwrap_err();

    assert_eq!(err.status_code(), 500);
    assert!(matches!(err.kind(), MediagateErrorKind::Http(_)));
    assert!(h.cache.is_empty());
}

#[tokio::test]
async fn test_infected_file_is_forbidden_and_cached() {
    let h = harness(MockFetcher::new(INFECTED.to_vec()));

    let result = h.service.generate_report(&request()).await.unwrap();
    assert!(!result.clean);
    assert_eq!(result.exit_code, 1);

    let err = h.service.scanned_download(&request()).await.unwrap_err();
    assert_eq!(err.status_code(), 403);
    assert_eq!(err.reason(), "MCS_MEDIA_NOT_CLEAN");

    let report = h.service.get_report(&request()).await.unwrap();
    assert_eq!(
        report,
        ScanReport {
            scanned: true,
            clean: Some(false),
            info: Some("Eicar-Test-Signature FOUND".to_string()),
        }
    );
    assert_eq!(h.scanner.calls(), 1);
    assert_eq!(h.fetcher.calls(), 2);
    assert_eq!(leftover_entries(&work_root(&h.temp_dir)), 0);
}

#[tokio::test]
async fn test_cached_verdict_still_fetches() {
    let h = harness(MockFetcher::new(b"bytes".to_vec()));

    h.service.generate_report(&request()).await.unwrap();
    let download = h.service.scanned_download(&request()).await.unwrap();

    assert_eq!(h.fetcher.calls(), 2);
    assert_eq!(h.scanner.calls(), 1);
    assert_eq!(std::fs::read(download.path()).unwrap(), b"bytes");
}

#[tokio::test]
async fn test_clear_report_cache_forces_rescan() {
    let h = harness(MockFetcher::new(b"bytes".to_vec()));

    h.service.generate_report(&request()).await.unwrap();
    h.service.clear_report_cache();
    assert_eq!(
        h.service.get_report(&request()).await.unwrap(),
        ScanReport::unscanned()
    );

    h.service.generate_report(&request()).await.unwrap();
    assert_eq!(h.scanner.calls(), 2);
}

#[tokio::test]
async fn test_encrypted_media_is_scanned_as_plaintext() {
    let (ciphertext, file) = encrypt_attachment(INFECTED, "mxc://example.org/enc1");
    let h = harness(MockFetcher::new(ciphertext));
    let request = MediaRequest::encrypted(file).unwrap();

    let result = h.service.generate_report(&request).await.unwrap();

    assert!(!result.clean);
    assert_eq!(
        h.scanner.scanned()[0].file_name().unwrap(),
        DECRYPTED_FILE
    );
    assert_eq!(
        h.fetcher.urls(),
        vec!["https://hs.example/_matrix/media/v1/download/example.org/enc1".to_string()]
    );

    // The plaintext request for the same media has its own key.
    let plain = MediaRequest::plain("example.org", "enc1");
    assert_eq!(
        h.service.get_report(&plain).await.unwrap(),
        ScanReport::unscanned()
    );
}

#[tokio::test]
async fn test_clean_encrypted_download_serves_ciphertext() {
    let (ciphertext, file) = encrypt_attachment(b"holiday photo", "mxc://example.org/enc2");
    let h = harness(MockFetcher::new(ciphertext.clone()));
    let request = MediaRequest::encrypted(file).unwrap();

    let download = h.service.scanned_download(&request).await.unwrap();

    assert_eq!(std::fs::read(download.path()).unwrap(), ciphertext);
}

#[tokio::test]
async fn test_scanner_spawn_failure_is_not_cached() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(MockFetcher::new(b"bytes".to_vec()));
    let service = ReportService::builder(test_config(&temp_dir))
        .fetcher(fetcher.clone())
        .build()
        .unwrap();

    let err = service.generate_report(&request()).await.unwrap_err();
    assert_eq!(err.status_code(), 500);
    assert!(matches!(err.kind(), MediagateErrorKind::Scan(_)));

    let err = service.generate_report(&request()).await.unwrap_err();
    assert!(matches!(err.kind(), MediagateErrorKind::Scan(_)));
    assert_eq!(fetcher.calls(), 2);
    assert_eq!(
        service.get_report(&request()).await.unwrap(),
        ScanReport::unscanned()
    );
    assert_eq!(leftover_entries(&work_root(&temp_dir)), 0);
}

#[tokio::test]
async fn test_malformed_request_is_rejected_before_fetching() {
    let h = harness(MockFetcher::new(b"bytes".to_vec()));

    let err = h
        .service
        .generate_report(&MediaRequest::plain("example.org", ".."))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert_eq!(h.fetcher.calls(), 0);
}

#[test]
fn test_builder_rejects_invalid_config() {
    let config: ReportConfig = serde_json::from_str(
        r#"{"base_url":"","temp_directory":"/tmp","script":"./scan.sh"}"#,
    )
    .unwrap();
    assert!(ReportService::builder(config).build().is_err());
}
