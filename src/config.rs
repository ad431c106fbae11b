//! `release.toml` configuration.
//!
//! Every key has a default, so a missing file yields a usable configuration
//! built around the default three-platform matrix.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::matrix::{BuildMatrix, PlatformEntry};
use crate::trigger::{DEFAULT_PATTERN, ReleasePattern};

/// File looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "release.toml";

/// Top-level configuration for a release run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Executable base name used in canonical artifact names
    pub base_name: String,
    /// Source tree; relative paths below resolve against it
    pub source_dir: PathBuf,
    /// Shared root for canonical artifacts and run reports
    pub output_root: PathBuf,
    /// Tag pattern that triggers a release
    pub tag_pattern: String,
    /// Kill external processes running longer than this
    pub stage_timeout_secs: Option<u64>,
    /// Package builder settings
    pub package: PackageConfig,
    /// Artifact pool settings
    pub pool: PoolConfig,
    /// Release host settings
    pub release: HostConfig,
    /// Toolchain provisioning settings
    pub provision: ProvisionConfig,
    /// Matrix rows; the default matrix is used when absent
    pub entries: Option<Vec<PlatformEntry>>,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            base_name: "app".to_string(),
            source_dir: PathBuf::from("."),
            output_root: PathBuf::from("dist"),
            tag_pattern: DEFAULT_PATTERN.to_string(),
            stage_timeout_secs: None,
            package: PackageConfig::default(),
            pool: PoolConfig::default(),
            release: HostConfig::default(),
            provision: ProvisionConfig::default(),
            entries: None,
        }
    }
}

/// Secondary packaging tool invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    /// Tool to run
    pub program: String,
    /// Arguments placed before the entry's extra flags
    pub args: Vec<String>,
    /// Fixed local directory the tool writes into
    pub out_dir: PathBuf,
    /// Glob selecting package files inside the output directory
    pub pattern: String,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            program: "maturin".to_string(),
            args: vec!["build".to_string(), "--release".to_string()],
            out_dir: PathBuf::from("target/wheels"),
            pattern: "*.whl".to_string(),
        }
    }
}

/// Shared, append-only package pool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Fixed pool name shared by all entries
    pub name: String,
    /// Directory holding pools
    pub root: PathBuf,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "wheels".to_string(),
            root: PathBuf::from("dist/pool"),
        }
    }
}

/// Which release host receives canonical artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostKind {
    /// GitHub releases API
    Github,
    /// Local directory per tag
    Directory,
}

/// Release host settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Host implementation
    pub host: HostKind,
    /// `owner/repo`; falls back to `GITHUB_REPOSITORY`
    pub repository: Option<String>,
    /// Root directory for the directory host
    pub directory: PathBuf,
    /// GitHub REST API base
    pub api_url: String,
    /// GitHub asset upload base
    pub uploads_url: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            host: HostKind::Github,
            repository: None,
            directory: PathBuf::from("dist/releases"),
            api_url: "https://api.github.com".to_string(),
            uploads_url: "https://uploads.github.com".to_string(),
        }
    }
}

impl HostConfig {
    /// Resolve `(owner, repo)` from config or `GITHUB_REPOSITORY`
    pub fn owner_repo(&self) -> Result<(String, String)> {
        let raw = self
            .repository
            .clone()
            .or_else(|| std::env::var("GITHUB_REPOSITORY").ok())
            .ok_or_else(|| ConfigError::Missing {
                key: "release.repository".to_string(),
            })?;

        match raw.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok((owner.to_string(), repo.to_string()))
            }
            _ => Err(ConfigError::Invalid {
                key: "release.repository".to_string(),
                reason: format!("expected owner/repo, got '{}'", raw),
            }
            .into()),
        }
    }
}

/// Toolchain provisioning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Command prefix that installs system packages
    pub installer: Vec<String>,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            installer: vec![
                "sudo".to_string(),
                "apt-get".to_string(),
                "install".to_string(),
                "-y".to_string(),
            ],
        }
    }
}

impl ReleaseConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist; otherwise `release.toml` in the working
    /// directory is used when present and defaults apply when it is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !required && !path.exists() {
            log::debug!("No {} found, using defaults", path.display());
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::ReadFailed {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|e| match e {
            crate::ReleaseError::Toml(source) => ConfigError::ParseFailed {
                path: path.clone(),
                source,
            }
            .into(),
            other => other,
        })?;

        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check pattern, matrix and required values
    pub fn validate(&self) -> Result<()> {
        if self.base_name.is_empty() {
            return Err(ConfigError::Missing {
                key: "base_name".to_string(),
            }
            .into());
        }
        if self.pool.name.is_empty() || self.pool.name.contains(['/', '\\']) {
            return Err(ConfigError::Invalid {
                key: "pool.name".to_string(),
                reason: "must be a non-empty plain name".to_string(),
            }
            .into());
        }
        if self.stage_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid {
                key: "stage_timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }
        self.pattern()?;
        self.matrix()?;
        Ok(())
    }

    /// Parsed tag pattern
    pub fn pattern(&self) -> Result<ReleasePattern> {
        ReleasePattern::parse(&self.tag_pattern)
    }

    /// Validated build matrix
    pub fn matrix(&self) -> Result<BuildMatrix> {
        match &self.entries {
            Some(entries) => BuildMatrix::new(entries.clone()),
            None => {
                let matrix = BuildMatrix::default_for(&self.base_name);
                matrix.validate()?;
                Ok(matrix)
            }
        }
    }

    /// Resolve a path against the source tree
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.source_dir.join(path)
        }
    }

    /// Absolute-or-source-relative output root
    pub fn output_root(&self) -> PathBuf {
        self.resolve(&self.output_root)
    }

    /// Per-process timeout, if configured
    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Platform;

    #[test]
    fn empty_file_yields_default_matrix() {
        let config = ReleaseConfig::from_toml("").unwrap();
        let matrix = config.matrix().unwrap();
        assert_eq!(matrix.entries().len(), 3);
        assert_eq!(config.pool.name, "wheels");
        assert_eq!(config.package.program, "maturin");
    }

    #[test]
    fn entries_override_the_default_matrix() {
        let config = ReleaseConfig::from_toml(
            r#"
            base_name = "stamp"

            [[entries]]
            platform = "linux"
            extra_flags = ["target=musl"]
            primary_output_path = "target/musl/release/stamp"
            canonical_output_name = "stamp-linux"

            [[entries]]
            platform = "windows"
            primary_output_path = "target/release/stamp.exe"
            canonical_output_name = "stamp-windows.exe"
            "#,
        )
        .unwrap();

        let matrix = config.matrix().unwrap();
        assert_eq!(matrix.entries().len(), 2);
        let linux = matrix.get(Platform::Linux).unwrap();
        assert!(!linux.provision);
        assert_eq!(linux.extra_flags, vec!["target=musl".to_string()]);
    }

    #[test]
    fn duplicate_names_fail_at_load() {
        let result = ReleaseConfig::from_toml(
            r#"
            [[entries]]
            platform = "linux"
            primary_output_path = "target/release/app"
            canonical_output_name = "app"

            [[entries]]
            platform = "mac"
            primary_output_path = "target/release/app"
            canonical_output_name = "app"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn bad_pattern_fails_at_load() {
        assert!(ReleaseConfig::from_toml(r#"tag_pattern = "*.*""#).is_err());
    }

    #[test]
    fn repository_must_be_owner_slash_repo() {
        let mut host = HostConfig {
            repository: Some("acme/app".to_string()),
            ..HostConfig::default()
        };
        assert_eq!(
            host.owner_repo().unwrap(),
            ("acme".to_string(), "app".to_string())
        );

        host.repository = Some("acme".to_string());
        assert!(host.owner_repo().is_err());
    }

    #[test]
    fn relative_paths_resolve_against_source_dir() {
        let config = ReleaseConfig {
            source_dir: PathBuf::from("/src/app"),
            ..ReleaseConfig::default()
        };
        assert_eq!(config.output_root(), PathBuf::from("/src/app/dist"));
        assert_eq!(
            config.resolve(Path::new("/abs/out")),
            PathBuf::from("/abs/out")
        );
    }
}
