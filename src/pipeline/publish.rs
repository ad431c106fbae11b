//! Publication: pool upload of packages and release publish of the
//! canonical artifact.

use std::path::PathBuf;

use crate::config::ReleaseConfig;
use crate::error::{PublishError, Result};
use crate::matrix::PlatformEntry;
use crate::pipeline::collect::canonical_path;
use crate::publish::{ArtifactPool, PublishedAsset, ReleaseHost, sha256_file};
use crate::trigger::TriggerEvent;

/// What a successful release publish produced
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    /// Canonical artifact that was attached
    pub canonical: PathBuf,
    /// SHA-256 of the attached file
    pub sha256: String,
    /// Asset as reported by the host
    pub asset: PublishedAsset,
    /// Release URL, if the host has one
    pub release_url: Option<String>,
}

/// Append every package file to the shared pool
pub async fn upload_packages<P: ArtifactPool>(
    pool: &P,
    entry: &PlatformEntry,
    packages: &[PathBuf],
) -> Result<Vec<PathBuf>> {
    let mut pooled = Vec::with_capacity(packages.len());
    for package in packages {
        pooled.push(pool.append(package).await?);
    }
    log::info!(
        "[{}] {} package(s) uploaded to pool '{}'",
        entry.id(),
        pooled.len(),
        pool.name()
    );
    Ok(pooled)
}

/// Fail unless the canonical artifact is present as a regular file
pub async fn require_canonical(config: &ReleaseConfig, entry: &PlatformEntry) -> Result<PathBuf> {
    let canonical = canonical_path(config, entry);
    match tokio::fs::metadata(&canonical).await {
        Ok(metadata) if metadata.is_file() => Ok(canonical),
        _ => Err(PublishError::MissingCanonicalArtifact {
            platform: entry.id().to_string(),
            expected: canonical,
        }
        .into()),
    }
}

/// Attach the canonical artifact to the release keyed by the trigger tag.
///
/// Strict: a missing canonical artifact fails the entry and nothing is
/// sent to the host. Re-running with the file present re-attaches it
/// under the same name.
pub async fn publish_release<H: ReleaseHost>(
    host: &H,
    config: &ReleaseConfig,
    entry: &PlatformEntry,
    trigger: &TriggerEvent,
) -> Result<PublishOutcome> {
    let canonical = require_canonical(config, entry).await?;
    let sha256 = sha256_file(&canonical).await?;

    let release = host.ensure_release(trigger.tag()).await?;
    let asset = host
        .upload_asset(&release, &canonical, &entry.canonical_output_name)
        .await?;

    log::info!(
        "[{}] Published {} ({} bytes, sha256 {}) to release {}",
        entry.id(),
        asset.name,
        asset.size,
        sha256,
        trigger
    );

    Ok(PublishOutcome {
        canonical,
        sha256,
        asset,
        release_url: release.html_url,
    })
}
