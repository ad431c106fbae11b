//! Release host backed by a local directory, one subdirectory per tag.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{PublishError, Result};
use crate::publish::{PublishedAsset, ReleaseHandle, ReleaseHost};

/// Releases stored as `<root>/<tag>/<asset>`
#[derive(Debug, Clone)]
pub struct DirectoryReleaseHost {
    root: PathBuf,
}

impl DirectoryReleaseHost {
    /// Host rooted at `root`
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Directory of the release for `tag`
    pub fn release_dir(&self, tag: &str) -> PathBuf {
        self.root.join(tag)
    }
}

fn host_failed(operation: &str, e: std::io::Error) -> PublishError {
    PublishError::HostFailed {
        operation: operation.to_string(),
        reason: e.to_string(),
    }
}

impl ReleaseHost for DirectoryReleaseHost {
    async fn ensure_release(&self, tag: &str) -> Result<ReleaseHandle> {
        let dir = self.release_dir(tag);
        // create_dir_all succeeds when a sibling got there first
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| host_failed("create release", e))?;

        let mut assets = HashMap::new();
        let mut listing = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| host_failed("list assets", e))?;
        let mut next_id = 1u64;
        while let Some(item) = listing
            .next_entry()
            .await
            .map_err(|e| host_failed("list assets", e))?
        {
            if let Some(name) = item.file_name().to_str()
                && !name.starts_with('.')
            {
                assets.insert(name.to_string(), next_id);
                next_id += 1;
            }
        }

        Ok(ReleaseHandle {
            id: 0,
            tag: tag.to_string(),
            html_url: Some(dir.display().to_string()),
            assets,
        })
    }

    async fn upload_asset(
        &self,
        release: &ReleaseHandle,
        path: &Path,
        name: &str,
    ) -> Result<PublishedAsset> {
        let dir = self.release_dir(&release.tag);
        let dest = dir.join(name);
        let partial = dir.join(format!(".{}.partial", name));

        let size = tokio::fs::copy(path, &partial)
            .await
            .map_err(|e| host_failed("upload asset", e))?;
        tokio::fs::rename(&partial, &dest)
            .await
            .map_err(|e| host_failed("upload asset", e))?;

        Ok(PublishedAsset {
            name: name.to_string(),
            size,
            url: dest.display().to_string(),
        })
    }
}
