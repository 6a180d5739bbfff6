//! Per-invocation temporary directories.

use mediagate_error::{MediagateResult, StorageError, StorageErrorKind};
use std::future::Future;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Name prefix of every workspace directory.
const WORKSPACE_PREFIX: &str = "mediagate-";

/// Exclusively owned temporary directory.
///
/// Created as `{root}/mediagate-{uuid}`. The tree is removed by
/// [`Workspace::remove`], or synchronously on drop if the owner never got
/// that far (for example because its future was cancelled).
///
/// # Example Structure
///
/// ```text
/// /tmp/mediagate/
/// └── mediagate-6f0c.../
///     ├── fetched      (downloaded bytes)
///     └── decrypted    (plaintext, encrypted media only)
/// ```
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    removed: bool,
}

impl Workspace {
    /// Create a fresh workspace under `root`.
    ///
    /// `root` is created if it does not exist. The workspace directory itself
    /// must not exist yet.
    ///
    /// # Errors
    ///
    /// Returns a storage error if either directory cannot be created.
    #[tracing::instrument(skip(root), fields(root = %root.as_ref().display()))]
    pub async fn create(root: impl AsRef<Path>) -> MediagateResult<Self> {
        let root = root.as_ref();

        tokio::fs::create_dir_all(root).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                root.display(),
                e
            )))
        })?;

        let path = root.join(format!("{}{}", WORKSPACE_PREFIX, Uuid::new_v4()));
        tokio::fs::create_dir(&path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;

        tracing::debug!(path = %path.display(), "Created workspace");
        Ok(Self {
            path,
            removed: false,
        })
    }

    /// Workspace directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file named `name` inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Remove the workspace and everything in it.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the tree cannot be removed.
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn remove(mut self) -> MediagateResult<()> {
        let result = tokio::fs::remove_dir_all(&self.path).await;
        self.removed = true;

        match result {
            Ok(()) => {
                tracing::debug!("Removed workspace");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::new(StorageErrorKind::DirectoryRemoval(format!(
                "{}: {}",
                self.path.display(),
                e
            )))
            .into()),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Removed abandoned workspace");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove abandoned workspace"
                );
            }
        }
    }
}

/// Run `operation` inside a fresh workspace under `root`.
///
/// The operation receives the workspace directory. The directory is removed
/// once the operation finishes, whether it succeeded or failed, and also if
/// the returned future is dropped before it completes. A failure to remove
/// the directory is logged and does not replace the operation's outcome.
///
/// # Errors
///
/// Returns a storage error if the workspace cannot be created, otherwise
/// whatever the operation returns.
///
/// # Example
///
/// ```
/// use mediagate_storage::with_workspace;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let root = std::env::temp_dir().join("mediagate-doc");
/// let seen = with_workspace(&root, |dir| async move {
///     tokio::fs::write(dir.join("fetched"), b"bytes").await.unwrap();
///     Ok(dir)
/// })
/// .await
/// .unwrap();
/// assert!(!seen.exists());
/// # }
/// ```
pub async fn with_workspace<T, F, Fut>(root: &Path, operation: F) -> MediagateResult<T>
where
    F: FnOnce(PathBuf) -> Fut,
    Fut: Future<Output = MediagateResult<T>>,
{
    let workspace = Workspace::create(root).await?;
    let outcome = operation(workspace.path().to_path_buf()).await;

    if let Err(e) = workspace.remove().await {
        tracing::warn!(error = %e, "Failed to remove workspace");
    }
    outcome
}
