//! Package build: the secondary packaging tool, run independently of the
//! primary build with the same extra flags.

use std::path::{Path, PathBuf};

use crate::config::ReleaseConfig;
use crate::error::{PackageError, Result};
use crate::matrix::PlatformEntry;
use crate::process::{CommandRunner, CommandSpec};

/// Output directory for an entry, relative to the source tree
pub fn package_out_dir(config: &ReleaseConfig, entry: &PlatformEntry) -> PathBuf {
    config.package.out_dir.join(entry.id())
}

/// The packaging command for an entry
pub fn package_command(config: &ReleaseConfig, entry: &PlatformEntry) -> CommandSpec {
    CommandSpec::new(config.package.program.clone(), &config.source_dir)
        .args(config.package.args.iter().cloned())
        .args(entry.extra_flags.iter().cloned())
        .arg("--out")
        .arg(package_out_dir(config, entry).display().to_string())
}

/// Files in `dir` matching `pattern`, sorted by path
pub fn find_packages(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let invalid = |reason: String| PackageError::InvalidPattern {
        pattern: pattern.to_string(),
        reason,
    };

    let full = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        pattern
    );
    let mut files = Vec::new();
    for path in glob::glob(&full).map_err(|e| invalid(e.to_string()))? {
        let path = path.map_err(|e| invalid(e.to_string()))?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Build the entry's packages and return the files produced
pub async fn package<R: CommandRunner>(
    runner: &R,
    config: &ReleaseConfig,
    entry: &PlatformEntry,
) -> Result<Vec<PathBuf>> {
    let out_dir = config.resolve(&package_out_dir(config, entry));

    // Start from an empty directory so only this run's packages are collected
    if tokio::fs::try_exists(&out_dir).await? {
        tokio::fs::remove_dir_all(&out_dir).await?;
    }
    tokio::fs::create_dir_all(&out_dir).await?;

    let spec = package_command(config, entry);
    log::info!("[{}] {}", entry.id(), spec);

    let output = runner
        .run(&spec)
        .await
        .map_err(|e| PackageError::BuildFailed {
            platform: entry.id().to_string(),
            code: None,
            diagnostics: e.to_string(),
        })?;

    if !output.success() {
        let diagnostics = output.diagnostics();
        log::error!("[{}] Package build failed:\n{}", entry.id(), diagnostics);
        return Err(PackageError::BuildFailed {
            platform: entry.id().to_string(),
            code: output.code,
            diagnostics,
        }
        .into());
    }

    let files = find_packages(&out_dir, &config.package.pattern)?;
    if files.is_empty() {
        return Err(PackageError::NoPackages {
            dir: out_dir,
            pattern: config.package.pattern.clone(),
        }
        .into());
    }

    for file in &files {
        log::info!("[{}] Packaged {}", entry.id(), file.display());
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{LINUX_MUSL_TARGET, Platform};

    #[test]
    fn package_command_shares_extra_flags() {
        let config = ReleaseConfig::default();
        let entry = PlatformEntry::cross(Platform::Linux, "app", LINUX_MUSL_TARGET);
        let spec = package_command(&config, &entry);
        assert_eq!(spec.program, "maturin");
        assert_eq!(&spec.args[..4], &["build", "--release", "--target", LINUX_MUSL_TARGET]);
        assert_eq!(spec.args[4], "--out");
        assert!(spec.args[5].ends_with("linux"));
    }

    #[test]
    fn find_packages_filters_by_pattern() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b-1.0-py3-none-any.whl"), b"").unwrap();
        std::fs::write(dir.path().join("a-1.0-py3-none-any.whl"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let found = find_packages(dir.path(), "*.whl").unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a-1.0-py3-none-any.whl", "b-1.0-py3-none-any.whl"]);
    }
}
