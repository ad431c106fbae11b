//! Artifact collection: move the build output to its canonical name.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::ReleaseConfig;
use crate::error::{CollectError, Result};
use crate::matrix::PlatformEntry;

/// Where the entry's canonical artifact lives
pub fn canonical_path(config: &ReleaseConfig, entry: &PlatformEntry) -> PathBuf {
    config.output_root().join(&entry.canonical_output_name)
}

/// Move the build output to `output_root/canonical_output_name`.
///
/// A missing build output is a path-contract failure: nothing is created at
/// the canonical location.
pub async fn collect(config: &ReleaseConfig, entry: &PlatformEntry) -> Result<PathBuf> {
    let source = config.resolve(&entry.primary_output_path);

    let metadata = match tokio::fs::metadata(&source).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::error!(
                "[{}] Expected build output at {} is missing",
                entry.id(),
                source.display()
            );
            return Err(CollectError::MissingBuildOutput {
                platform: entry.id().to_string(),
                expected: source,
            }
            .into());
        }
        Err(e) => return Err(e.into()),
    };
    if !metadata.is_file() {
        return Err(CollectError::NotAFile { path: source }.into());
    }

    let dest = canonical_path(config, entry);
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    move_file(&source, &dest).await?;
    log::info!("[{}] {} -> {}", entry.id(), source.display(), dest.display());
    Ok(dest)
}

/// Rename, falling back to copy + remove when rename cannot cross filesystems
async fn move_file(from: &Path, to: &Path) -> Result<()> {
    let move_failed = |source: std::io::Error| CollectError::MoveFailed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    let rename_err = match tokio::fs::rename(from, to).await {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };
    log::debug!("rename {} failed ({}), copying instead", from.display(), rename_err);

    tokio::fs::copy(from, to).await.map_err(move_failed)?;
    if let Err(e) = tokio::fs::remove_file(from).await {
        // Leave no half-moved artifact behind
        let _ = tokio::fs::remove_file(to).await;
        return Err(move_failed(e).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Platform;

    fn config_in(dir: &Path) -> ReleaseConfig {
        ReleaseConfig {
            source_dir: dir.to_path_buf(),
            ..ReleaseConfig::default()
        }
    }

    #[tokio::test]
    async fn existing_canonical_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let entry = PlatformEntry::native(Platform::Mac, "app");

        let dest = canonical_path(&config, &entry);
        std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
        std::fs::write(&dest, b"stale").unwrap();

        let source = config.resolve(&entry.primary_output_path);
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        std::fs::write(&source, b"fresh").unwrap();

        collect(&config, &entry).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"fresh");
        assert!(!source.exists());
    }

    #[tokio::test]
    async fn directory_at_output_path_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let entry = PlatformEntry::native(Platform::Linux, "app");
        std::fs::create_dir_all(config.resolve(&entry.primary_output_path)).unwrap();

        let err = collect(&config, &entry).await.unwrap_err();
        assert!(matches!(
            err,
            crate::ReleaseError::Collect(CollectError::NotAFile { .. })
        ));
        assert!(!canonical_path(&config, &entry).exists());
    }
}
