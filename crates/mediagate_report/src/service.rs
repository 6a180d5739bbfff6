//! The report service: caching, coalescing and workspace scoping around the
//! pipeline.

use crate::{
    AttachmentDecryptor, CommandScanner, Decryptor, GeneratedReport, HttpFetcher, MediaFetcher,
    ReportGenerator, ScannedDownload, Scanner,
};
use mediagate_cache::{InMemoryResultCache, RequestCoalescer, ResultCache};
use mediagate_core::{MediaRequest, ReportConfig, ResultKey, ScanReport, ScanResult};
use mediagate_error::{InternalError, MediagateResult};
use mediagate_storage::with_workspace;
use std::sync::Arc;
use tracing::instrument;

/// Entry point for every gateway operation.
///
/// Concurrent calls that resolve to the same result key share one pipeline
/// run. The run executes on its own tokio task, so a caller that goes away
/// neither cancels it for the others nor leaves its workspace behind.
pub struct ReportService {
    config: ReportConfig,
    generator: Arc<ReportGenerator>,
    cache: Arc<dyn ResultCache>,
    coalescer: RequestCoalescer<ResultKey, MediagateResult<GeneratedReport>>,
}

impl ReportService {
    /// Create a service with the production collaborators.
    pub fn new(config: ReportConfig) -> Self {
        let scanner = CommandScanner::new(config.script().clone());
        Self::assemble(
            config,
            Arc::new(HttpFetcher::new()),
            Arc::new(AttachmentDecryptor::new()),
            Arc::new(scanner),
            Arc::new(InMemoryResultCache::new()),
        )
    }

    /// Start building a service with substitute collaborators.
    pub fn builder(config: ReportConfig) -> ReportServiceBuilder {
        ReportServiceBuilder {
            config,
            fetcher: None,
            decryptor: None,
            scanner: None,
            cache: None,
        }
    }

    fn assemble(
        config: ReportConfig,
        fetcher: Arc<dyn MediaFetcher>,
        decryptor: Arc<dyn Decryptor>,
        scanner: Arc<dyn Scanner>,
        cache: Arc<dyn ResultCache>,
    ) -> Self {
        tracing::debug!(
            base_url = %config.base_url(),
            temp_directory = %config.temp_directory().display(),
            "Creating report service"
        );
        let generator = ReportGenerator::new(
            config.clone(),
            fetcher,
            decryptor,
            scanner,
            Arc::clone(&cache),
        );
        Self {
            config,
            generator: Arc::new(generator),
            cache,
            coalescer: RequestCoalescer::new(),
        }
    }

    /// Service configuration.
    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Cached verdict for `request`, without doing any work.
    #[instrument(skip(self, request), fields(media = %request.media))]
    pub async fn get_report(&self, request: &MediaRequest) -> MediagateResult<ScanReport> {
        let resolved = request.resolve(self.config.base_url())?;
        let report = match self.cache.get(&resolved.key) {
            Some(result) => ScanReport::from(&result),
            None => ScanReport::unscanned(),
        };
        tracing::debug!(key = %resolved.key, scanned = report.scanned, "Looked up report");
        Ok(report)
    }

    /// Fetch and scan `request`, reusing a cached verdict when there is one.
    #[instrument(skip(self, request), fields(media = %request.media))]
    pub async fn generate_report(&self, request: &MediaRequest) -> MediagateResult<ScanResult> {
        let report = self.run(request).await?;
        Ok(report.result)
    }

    /// Fetch and scan `request`, and hand out the file if it is clean.
    ///
    /// # Errors
    ///
    /// An unclean verdict is a forbidden client error.
    #[instrument(skip(self, request), fields(media = %request.media))]
    pub async fn scanned_download(
        &self,
        request: &MediaRequest,
    ) -> MediagateResult<ScannedDownload> {
        let report = self.run(request).await?;
        ScannedDownload::from_report(report)
    }

    /// Forget every cached verdict.
    pub fn clear_report_cache(&self) {
        self.cache.clear();
    }

    async fn run(&self, request: &MediaRequest) -> MediagateResult<GeneratedReport> {
        let resolved = request.resolve(self.config.base_url())?;
        let generator = Arc::clone(&self.generator);
        let root = self.config.temp_directory().clone();

        self.coalescer
            .run(resolved.key, move || {
                let task = tokio::spawn(async move {
                    with_workspace(&root, move |workspace| async move {
                        generator.generate(&resolved, &workspace).await
                    })
                    .await
                });
                async move {
                    task.await.unwrap_or_else(|e| {
                        tracing::error!(error = %e, "Report pipeline task failed");
                        Err(InternalError::new(format!("Report pipeline task failed: {}", e))
                            .into())
                    })
                }
            })
            .await
    }
}

/// Builder for [`ReportService`] with substitutable collaborators.
///
/// Anything left unset gets the production implementation.
pub struct ReportServiceBuilder {
    config: ReportConfig,
    fetcher: Option<Arc<dyn MediaFetcher>>,
    decryptor: Option<Arc<dyn Decryptor>>,
    scanner: Option<Arc<dyn Scanner>>,
    cache: Option<Arc<dyn ResultCache>>,
}

impl ReportServiceBuilder {
    /// Use `fetcher` to download media.
    pub fn fetcher(mut self, fetcher: Arc<dyn MediaFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Use `decryptor` for encrypted media.
    pub fn decryptor(mut self, decryptor: Arc<dyn Decryptor>) -> Self {
        self.decryptor = Some(decryptor);
        self
    }

    /// Use `scanner` to produce verdicts.
    pub fn scanner(mut self, scanner: Arc<dyn Scanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// Store verdicts in `cache`.
    pub fn cache(mut self, cache: Arc<dyn ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build the service.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the configuration is invalid.
    pub fn build(self) -> MediagateResult<ReportService> {
        self.config.validate()?;
        let fetcher: Arc<dyn MediaFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new()),
        };
        let decryptor: Arc<dyn Decryptor> = match self.decryptor {
            Some(decryptor) => decryptor,
            None => Arc::new(AttachmentDecryptor::new()),
        };
        let scanner: Arc<dyn Scanner> = match self.scanner {
            Some(scanner) => scanner,
            None => Arc::new(CommandScanner::new(self.config.script().clone())),
        };
        let cache: Arc<dyn ResultCache> = match self.cache {
            Some(cache) => cache,
            None => Arc::new(InMemoryResultCache::new()),
        };
        Ok(ReportService::assemble(
            self.config,
            fetcher,
            decryptor,
            scanner,
            cache,
        ))
    }
}
