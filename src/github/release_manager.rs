//! GitHub Release management for publishing canonical artifacts

use std::collections::HashMap;
use std::path::Path;

use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use serde::{Deserialize, Serialize};

use crate::error::{PublishError, ReleaseError, Result};
use crate::publish::{PublishedAsset, ReleaseHandle, ReleaseHost};

/// Configuration for GitHub releases
#[derive(Debug, Clone)]
pub struct GitHubReleaseConfig {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// REST API base URL
    pub api_url: String,
    /// Asset upload base URL
    pub uploads_url: String,
    /// GitHub token (from environment when `None`)
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReleaseModel {
    id: u64,
    html_url: String,
    #[serde(default)]
    assets: Vec<AssetModel>,
}

#[derive(Debug, Deserialize)]
struct AssetModel {
    id: u64,
    name: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    browser_download_url: String,
}

#[derive(Debug, Serialize)]
struct CreateRelease<'a> {
    tag_name: &'a str,
    name: &'a str,
    draft: bool,
    prerelease: bool,
}

/// GitHub release manager
#[derive(Debug)]
pub struct GitHubReleaseManager {
    client: Client,
    config: GitHubReleaseConfig,
    token: String,
}

fn host_failed(operation: &str, reason: impl Into<String>) -> ReleaseError {
    PublishError::HostFailed {
        operation: operation.to_string(),
        reason: reason.into(),
    }
    .into()
}

/// Turn a non-success response into a `HostFailed` error carrying the body
async fn check(operation: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(host_failed(operation, format!("{}: {}", status, body)))
}

impl GitHubReleaseManager {
    /// Create new GitHub release manager
    pub fn new(config: GitHubReleaseConfig) -> Result<Self> {
        let token = config
            .token
            .clone()
            .or_else(|| std::env::var("GH_TOKEN").ok())
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|t| !t.is_empty())
            .ok_or(PublishError::MissingToken)?;

        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config,
            token,
        })
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    fn repo_url(&self, rest: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.owner,
            self.config.repo,
            rest
        )
    }

    fn upload_url(&self, release_id: u64, name: &str) -> Result<url::Url> {
        let raw = format!(
            "{}/repos/{}/{}/releases/{}/assets",
            self.config.uploads_url.trim_end_matches('/'),
            self.config.owner,
            self.config.repo,
            release_id
        );
        let mut url =
            url::Url::parse(&raw).map_err(|e| host_failed("build upload url", e.to_string()))?;
        url.query_pairs_mut().append_pair("name", name);
        Ok(url)
    }

    /// Look up the release for `tag`; `Ok(None)` when it does not exist
    pub async fn get_release_by_tag(&self, tag: &str) -> Result<Option<ReleaseHandle>> {
        let response = self
            .authed(self.client.get(self.repo_url(&format!("releases/tags/{}", tag))))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let release: ReleaseModel = check("get release", response).await?.json().await?;
        Ok(Some(to_handle(tag, release)))
    }

    /// Create a published release for `tag`; `Ok(None)` if it already exists
    async fn create_release(&self, tag: &str) -> Result<Option<ReleaseHandle>> {
        // Tags that parse as semver with a pre-release part are marked prerelease
        let prerelease = semver::Version::parse(tag.strip_prefix('v').unwrap_or(tag))
            .map(|v| !v.pre.is_empty())
            .unwrap_or(false);

        let body = CreateRelease {
            tag_name: tag,
            name: tag,
            draft: false,
            prerelease,
        };
        let response = self
            .authed(self.client.post(self.repo_url("releases")))
            .json(&body)
            .send()
            .await?;

        // 422 already_exists: a sibling entry created it first
        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            return Ok(None);
        }
        let release: ReleaseModel = check("create release", response).await?.json().await?;
        Ok(Some(to_handle(tag, release)))
    }

    /// Delete one asset (used before re-uploading a same-named asset)
    pub async fn delete_asset(&self, asset_id: u64) -> Result<()> {
        let response = self
            .authed(
                self.client
                    .delete(self.repo_url(&format!("releases/assets/{}", asset_id))),
            )
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check("delete asset", response).await?;
        Ok(())
    }
}

fn to_handle(tag: &str, release: ReleaseModel) -> ReleaseHandle {
    ReleaseHandle {
        id: release.id,
        tag: tag.to_string(),
        html_url: Some(release.html_url),
        assets: release
            .assets
            .into_iter()
            .map(|asset| (asset.name, asset.id))
            .collect::<HashMap<_, _>>(),
    }
}

impl ReleaseHost for GitHubReleaseManager {
    async fn ensure_release(&self, tag: &str) -> Result<ReleaseHandle> {
        if let Some(existing) = self.get_release_by_tag(tag).await? {
            log::debug!("Reusing release {} for tag {}", existing.id, tag);
            return Ok(existing);
        }

        if let Some(created) = self.create_release(tag).await? {
            log::info!("Created release {} for tag {}", created.id, tag);
            return Ok(created);
        }

        // Lost the creation race: the release exists now
        self.get_release_by_tag(tag)
            .await?
            .ok_or_else(|| host_failed("create release", format!("release for {} vanished", tag)))
    }

    async fn upload_asset(
        &self,
        release: &ReleaseHandle,
        path: &Path,
        name: &str,
    ) -> Result<PublishedAsset> {
        if let Some(&asset_id) = release.assets.get(name) {
            log::info!("Replacing existing asset {} on release {}", name, release.tag);
            self.delete_asset(asset_id).await?;
        }

        let content = Bytes::from(tokio::fs::read(path).await?);
        let url = self.upload_url(release.id, name)?;

        let response = self
            .authed(self.client.post(url))
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(content)
            .send()
            .await?;
        let asset: AssetModel = check("upload asset", response).await?.json().await?;

        Ok(PublishedAsset {
            name: asset.name,
            size: asset.size,
            url: asset.browser_download_url,
        })
    }
}
