//! Shared, append-only package pool.

use std::future::Future;
use std::path::{Path, PathBuf};

use crate::error::{PublishError, Result};

/// Intermediate artifact store shared by all entries of one run
pub trait ArtifactPool: Send + Sync + 'static {
    /// Pool name
    fn name(&self) -> &str;

    /// Append `file` to the pool under its own file name.
    ///
    /// Appending a name that is already present replaces it.
    fn append(&self, file: &Path) -> impl Future<Output = Result<PathBuf>> + Send;
}

/// Pool stored as `<root>/<name>/` on the local filesystem
#[derive(Debug, Clone)]
pub struct DirectoryPool {
    name: String,
    dir: PathBuf,
}

impl DirectoryPool {
    /// Pool `name` under `root`
    pub fn new(root: &Path, name: &str) -> Self {
        Self {
            name: name.to_string(),
            dir: root.join(name),
        }
    }

    /// Directory holding the pooled files
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactPool for DirectoryPool {
    fn name(&self) -> &str {
        &self.name
    }

    async fn append(&self, file: &Path) -> Result<PathBuf> {
        let upload_failed = |reason: String| PublishError::PoolUploadFailed {
            pool: self.name.clone(),
            file: file.display().to_string(),
            reason,
        };

        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| upload_failed("path has no file name".to_string()))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| upload_failed(e.to_string()))?;

        // Copy beside the destination, then rename, so readers never see a partial file
        let dest = self.dir.join(file_name);
        let partial = self.dir.join(format!(".{}.partial", file_name));
        tokio::fs::copy(file, &partial)
            .await
            .map_err(|e| upload_failed(e.to_string()))?;
        tokio::fs::rename(&partial, &dest)
            .await
            .map_err(|e| upload_failed(e.to_string()))?;

        log::info!("Pooled {} into '{}'", file_name, self.name);
        Ok(dest)
    }
}
