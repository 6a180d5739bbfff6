//! HTTP API for the report service.

use axum::{
    Router,
    body::Body,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use futures::StreamExt;
use mediagate_core::{EncryptedFile, MediaRequest, ScanReport, ScanResult};
use mediagate_error::{
    ClientError, ClientErrorKind, MediagateError, StorageError, StorageErrorKind,
};
use mediagate_report::{ReportService, ScannedDownload};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

const DOWNLOAD: &str = "/_matrix/media_proxy/unstable/download/:domain/:media_id";
const DOWNLOAD_ENCRYPTED: &str = "/_matrix/media_proxy/unstable/download_encrypted";
const SCAN: &str = "/_matrix/media_proxy/unstable/scan/:domain/:media_id";
const SCAN_ENCRYPTED: &str = "/_matrix/media_proxy/unstable/scan_encrypted";
const SCAN_REPORT: &str = "/_matrix/media_proxy/unstable/scan_report/:domain/:media_id";
const SCAN_REPORT_ENCRYPTED: &str = "/_matrix/media_proxy/unstable/scan_report_encrypted";

/// API state containing the report service.
#[derive(Clone)]
pub struct AppState {
    service: Arc<ReportService>,
}

impl AppState {
    /// Creates new API state.
    pub fn new(service: Arc<ReportService>) -> Self {
        Self { service }
    }
}

/// Creates the gateway router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(DOWNLOAD, get(download))
        .route(DOWNLOAD_ENCRYPTED, post(download_encrypted))
        .route(SCAN, get(scan))
        .route(SCAN_ENCRYPTED, post(scan_encrypted))
        .route(SCAN_REPORT, get(scan_report))
        .route(SCAN_REPORT_ENCRYPTED, post(scan_report_encrypted))
        .with_state(state)
}

/// Body of the `*_encrypted` routes.
#[derive(Debug, Deserialize)]
struct EncryptedBody {
    file: EncryptedFile,
}

/// Turn an `*_encrypted` body into a request, rejecting malformed JSON.
fn encrypted_request(
    body: Result<Json<EncryptedBody>, JsonRejection>,
) -> Result<MediaRequest, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "Rejected encrypted request body");
        ClientError::new(ClientErrorKind::BadRequest(rejection.body_text()))
    })?;
    tracing::debug!(url = %body.file.url, "Encrypted media request");
    Ok(MediaRequest::encrypted(body.file)?)
}

/// Body of the scan routes.
#[derive(Debug, Serialize)]
struct ScanResponse {
    clean: bool,
    info: String,
}

impl From<ScanResult> for ScanResponse {
    fn from(result: ScanResult) -> Self {
        Self {
            clean: result.clean,
            info: result.info,
        }
    }
}

/// Error response: `{"reason": ..., "info": ...}` with the mapped status.
#[derive(Debug)]
pub struct ApiError(MediagateError);

impl<T> From<T> for ApiError
where
    T: Into<MediagateError>,
{
    fn from(err: T) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let info = match self.0.client_kind() {
            Some(kind) => kind.to_string(),
            None => {
                tracing::error!(error = %self.0, "Request failed");
                "Internal server error".to_string()
            }
        };
        (status, Json(json!({"reason": self.0.reason(), "info": info}))).into_response()
    }
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

#[tracing::instrument(skip(state))]
async fn download(
    State(state): State<AppState>,
    Path((domain, media_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let request = MediaRequest::plain(domain, media_id);
    let download = state.service.scanned_download(&request).await?;
    deliver(download).await
}

#[tracing::instrument(skip(state, body))]
async fn download_encrypted(
    State(state): State<AppState>,
    body: Result<Json<EncryptedBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = encrypted_request(body)?;
    let download = state.service.scanned_download(&request).await?;
    deliver(download).await
}

#[tracing::instrument(skip(state))]
async fn scan(
    State(state): State<AppState>,
    Path((domain, media_id)): Path<(String, String)>,
) -> Result<Json<ScanResponse>, ApiError> {
    let request = MediaRequest::plain(domain, media_id);
    let result = state.service.generate_report(&request).await?;
    Ok(Json(result.into()))
}

#[tracing::instrument(skip(state, body))]
async fn scan_encrypted(
    State(state): State<AppState>,
    body: Result<Json<EncryptedBody>, JsonRejection>,
) -> Result<Json<ScanResponse>, ApiError> {
    let request = encrypted_request(body)?;
    let result = state.service.generate_report(&request).await?;
    Ok(Json(result.into()))
}

#[tracing::instrument(skip(state))]
async fn scan_report(
    State(state): State<AppState>,
    Path((domain, media_id)): Path<(String, String)>,
) -> Result<Json<ScanReport>, ApiError> {
    let request = MediaRequest::plain(domain, media_id);
    Ok(Json(state.service.get_report(&request).await?))
}

#[tracing::instrument(skip(state, body))]
async fn scan_report_encrypted(
    State(state): State<AppState>,
    body: Result<Json<EncryptedBody>, JsonRejection>,
) -> Result<Json<ScanReport>, ApiError> {
    let request = encrypted_request(body)?;
    Ok(Json(state.service.get_report(&request).await?))
}

/// Stream a scanned file with its whitelisted headers.
///
/// The download handle travels with the body so the file outlives the
/// handler until the last chunk is sent.
async fn deliver(download: ScannedDownload) -> Result<Response, ApiError> {
    let file = tokio::fs::File::open(download.path()).await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileRead(format!(
            "{}: {}",
            download.path().display(),
            e
        )))
    })?;

    let held = Arc::clone(&download.file);
    let stream = ReaderStream::new(file).map(move |chunk| {
        let _keep_alive = &held;
        chunk
    });

    let mut response = Body::from_stream(stream).into_response();
    for (name, value) in &download.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => tracing::debug!(header = %name, "Skipping unrepresentable header"),
        }
    }
    Ok(response)
}
