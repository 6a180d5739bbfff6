//! Mock fetcher and scanner for testing.

use async_trait::async_trait;
use mediagate_core::Verdict;
use mediagate_error::{HttpError, MediagateResult};
use mediagate_report::{FetchedMedia, MediaFetcher, Scanner};
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Fetcher that serves a fixed body, optionally failing first.
pub struct MockFetcher {
    body: Vec<u8>,
    headers: BTreeMap<String, String>,
    delay: Option<Duration>,
    failures: Mutex<VecDeque<HttpError>>,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl MockFetcher {
    /// Serve `body` on every call.
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            headers: BTreeMap::new(),
            delay: None,
            failures: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    /// Report `name: value` as a response header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Sleep for `delay` before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail the next unfailed call with `error`.
    pub fn fail_next(self, error: HttpError) -> Self {
        self.failures.lock().unwrap().push_back(error);
        self
    }

    /// Number of fetches attempted.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// URLs fetched, in order.
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaFetcher for MockFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<FetchedMedia, HttpError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());
        match self.delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }

        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }

        tokio::fs::write(destination, &self.body).await.unwrap();
        Ok(FetchedMedia {
            headers: self.headers.clone(),
            size: self.body.len() as u64,
        })
    }
}

/// Scanner that flags any file containing `EICAR`.
pub struct MockScanner {
    calls: AtomicUsize,
    scanned: Mutex<Vec<PathBuf>>,
}

impl MockScanner {
    /// Create a scanner with no calls recorded.
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            scanned: Mutex::new(Vec::new()),
        }
    }

    /// Number of scans performed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Paths scanned, in order.
    pub fn scanned(&self) -> Vec<PathBuf> {
        self.scanned.lock().unwrap().clone()
    }
}

#[async_trait]
impl Scanner for MockScanner {
    async fn scan(&self, path: &Path) -> MediagateResult<Verdict> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.scanned.lock().unwrap().push(path.to_path_buf());

        let content = tokio::fs::read(path).await.unwrap();
        let infected = content.windows(5).any(|window| window == b"EICAR");
        Ok(if infected {
            Verdict {
                clean: false,
                info: "Eicar-Test-Signature FOUND".to_string(),
                exit_code: 1,
            }
        } else {
            Verdict {
                clean: true,
                info: "ok".to_string(),
                exit_code: 0,
            }
        })
    }
}
