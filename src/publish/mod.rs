//! Publication targets: the shared package pool and the release host.
//!
//! The core only relies on two contracts here. The pool accepts appends
//! keyed by file name. The release host creates or reuses one release per
//! tag and attaches assets to it, replacing an asset of the same name.

mod directory;
mod pool;

pub use directory::DirectoryReleaseHost;
pub use pool::{ArtifactPool, DirectoryPool};

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::config::{HostKind, ReleaseConfig};
use crate::error::Result;
use crate::github::{GitHubReleaseConfig, GitHubReleaseManager};

/// A release as seen by the publishing entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseHandle {
    /// Host-specific release id
    pub id: u64,
    /// Tag the release is keyed by
    pub tag: String,
    /// Human-facing URL, if the host has one
    pub html_url: Option<String>,
    /// Assets already attached, name to asset id
    pub assets: HashMap<String, u64>,
}

/// An asset attached to a release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedAsset {
    /// Asset file name
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Download location
    pub url: String,
}

/// External release-hosting service
pub trait ReleaseHost: Send + Sync + 'static {
    /// Return the release for `tag`, creating it if it does not exist yet.
    ///
    /// Must tolerate a sibling entry creating the same release concurrently.
    fn ensure_release(&self, tag: &str) -> impl Future<Output = Result<ReleaseHandle>> + Send;

    /// Attach `path` to `release` as `name`, replacing a same-named asset
    fn upload_asset(
        &self,
        release: &ReleaseHandle,
        path: &Path,
        name: &str,
    ) -> impl Future<Output = Result<PublishedAsset>> + Send;
}

/// Release host selected by configuration
#[derive(Debug)]
pub enum AnyReleaseHost {
    /// GitHub releases
    GitHub(GitHubReleaseManager),
    /// Local directory
    Directory(DirectoryReleaseHost),
}

impl AnyReleaseHost {
    /// Build the host named in `[release]`
    pub fn from_config(config: &ReleaseConfig) -> Result<Self> {
        match config.release.host {
            HostKind::Github => {
                let (owner, repo) = config.release.owner_repo()?;
                let github = GitHubReleaseConfig {
                    owner,
                    repo,
                    api_url: config.release.api_url.clone(),
                    uploads_url: config.release.uploads_url.clone(),
                    token: None,
                };
                Ok(Self::GitHub(GitHubReleaseManager::new(github)?))
            }
            HostKind::Directory => Ok(Self::Directory(DirectoryReleaseHost::new(
                config.resolve(&config.release.directory),
            ))),
        }
    }
}

impl ReleaseHost for AnyReleaseHost {
    async fn ensure_release(&self, tag: &str) -> Result<ReleaseHandle> {
        match self {
            Self::GitHub(host) => host.ensure_release(tag).await,
            Self::Directory(host) => host.ensure_release(tag).await,
        }
    }

    async fn upload_asset(
        &self,
        release: &ReleaseHandle,
        path: &Path,
        name: &str,
    ) -> Result<PublishedAsset> {
        match self {
            Self::GitHub(host) => host.upload_asset(release, path, name).await,
            Self::Directory(host) => host.upload_asset(release, path, name).await,
        }
    }
}

/// Hex SHA-256 of a file
pub async fn sha256_file(path: &Path) -> Result<String> {
    let content = tokio::fs::read(path).await?;
    Ok(hex::encode(Sha256::digest(&content)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn digest_is_stable_for_same_content() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::write(&a, b"abc").unwrap();
        std::fs::write(&b, b"abc").unwrap();

        let digest = sha256_file(&a).await.unwrap();
        assert_eq!(digest, sha256_file(&b).await.unwrap());
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn directory_host_from_config() {
        let mut config = ReleaseConfig::default();
        config.release.host = HostKind::Directory;
        assert!(matches!(
            AnyReleaseHost::from_config(&config).unwrap(),
            AnyReleaseHost::Directory(_)
        ));
    }
}
