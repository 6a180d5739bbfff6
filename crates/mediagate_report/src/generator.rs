//! The fetch, decrypt and scan pipeline.

use crate::{Decryptor, MediaFetcher, Scanner};
use mediagate_cache::ResultCache;
use mediagate_core::{ReportConfig, ResolvedMedia, ScanResult};
use mediagate_error::{
    ClientError, ClientErrorKind, HttpError, MediagateError, MediagateResult, StorageError,
    StorageErrorKind,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempPath;
use tracing::instrument;
use uuid::Uuid;

/// Name of the downloaded file inside a workspace.
pub const FETCHED_FILE: &str = "fetched";

/// Name of the decrypted file inside a workspace.
pub const DECRYPTED_FILE: &str = "decrypted";

/// Outcome of one pipeline run.
///
/// For a clean verdict `file` holds the fetched bytes, moved out of the
/// workspace so they outlive it. The file is deleted when the last clone of
/// the handle is dropped.
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    /// Scan result; `file_path` points at `file` when there is one
    pub result: ScanResult,
    /// Retained fetched file, clean verdicts only
    pub file: Option<Arc<TempPath>>,
}

/// Runs the pipeline for one resolved request inside a workspace.
pub struct ReportGenerator {
    config: ReportConfig,
    fetcher: Arc<dyn MediaFetcher>,
    decryptor: Arc<dyn Decryptor>,
    scanner: Arc<dyn Scanner>,
    cache: Arc<dyn ResultCache>,
}

impl ReportGenerator {
    /// Assemble a generator from its collaborators.
    pub fn new(
        config: ReportConfig,
        fetcher: Arc<dyn MediaFetcher>,
        decryptor: Arc<dyn Decryptor>,
        scanner: Arc<dyn Scanner>,
        cache: Arc<dyn ResultCache>,
    ) -> Self {
        Self {
            config,
            fetcher,
            decryptor,
            scanner,
            cache,
        }
    }

    /// Fetch, decrypt and scan `resolved` using `workspace` for scratch files.
    ///
    /// The media is always fetched. A cached verdict then short-circuits
    /// decryption and scanning; the returned result carries this fetch's file
    /// and headers. Fresh verdicts are cached under the request key.
    ///
    /// # Errors
    ///
    /// - upstream status errors become a bad-gateway client error
    /// - transport faults are returned as they are
    /// - any decryption failure becomes a bad-request client error
    /// - scanner and storage failures are returned as they are
    #[instrument(
        skip(self, resolved, workspace),
        fields(
            key = %resolved.key,
            domain = %resolved.media.domain,
            media_id = %resolved.media.media_id,
            encrypted = resolved.file.is_some()
        )
    )]
    pub async fn generate(
        &self,
        resolved: &ResolvedMedia,
        workspace: &Path,
    ) -> MediagateResult<GeneratedReport> {
        let fetched = workspace.join(FETCHED_FILE);
        let media = self
            .fetcher
            .fetch(&resolved.download_url, &fetched)
            .await
            .map_err(|e| upstream_error(e, &resolved.download_url))?;
        tracing::debug!(url = %resolved.download_url, size = media.size, "Fetched media");

        if let Some(cached) = self.cache.get(&resolved.key) {
            tracing::debug!(clean = cached.clean, "Reusing cached verdict");
            let result = ScanResult::from_verdict(cached.verdict(), &fetched, media.headers);
            return self.retain(result, &fetched).await;
        }

        let target = match &resolved.file {
            Some(file) => {
                let decrypted = workspace.join(DECRYPTED_FILE);
                self.decryptor
                    .decrypt(&fetched, &decrypted, file)
                    .await
                    .map_err(|e| {
                        tracing::warn!(error = %e, "Decryption failed");
                        ClientError::new(ClientErrorKind::Decryption(e.to_string()))
                    })?;
                decrypted
            }
            None => fetched.clone(),
        };

        let verdict = self.scanner.scan(&target).await?;
        tracing::info!(
            clean = verdict.clean,
            exit_code = verdict.exit_code,
            "Scanned media"
        );

        let result = ScanResult::from_verdict(verdict, &fetched, media.headers);
        let report = self.retain(result, &fetched).await?;
        self.cache.set(resolved.key, report.result.clone());
        Ok(report)
    }

    /// Move a clean file out of the workspace.
    async fn retain(
        &self,
        mut result: ScanResult,
        fetched: &Path,
    ) -> MediagateResult<GeneratedReport> {
        if !result.clean {
            return Ok(GeneratedReport { result, file: None });
        }

        let retained: PathBuf = self
            .config
            .temp_directory()
            .join(format!("mediagate-retained-{}", Uuid::new_v4()));
        tokio::fs::rename(fetched, &retained).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileMove(format!(
                "{} to {}: {}",
                fetched.display(),
                retained.display(),
                e
            )))
        })?;

        let file = match TempPath::try_from_path(&retained) {
            Ok(path) => Arc::new(path),
            Err(e) => {
                let _ = tokio::fs::remove_file(&retained).await;
                return Err(StorageError::new(StorageErrorKind::FileMove(format!(
                    "{}: {}",
                    retained.display(),
                    e
                )))
                .into());
            }
        };
        result.file_path = retained;
        Ok(GeneratedReport {
            result,
            file: Some(file),
        })
    }
}

fn upstream_error(error: HttpError, url: &str) -> MediagateError {
    match error.status {
        Some(status) => {
            tracing::warn!(status, url, "Upstream refused media request");
            ClientError::new(ClientErrorKind::UpstreamFetch {
                status,
                url: url.to_string(),
            })
            .into()
        }
        None => error.into(),
    }
}
