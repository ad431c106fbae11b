//! Error types for release matrix operations.
//!
//! Each pipeline stage has its own error enum so that a failed entry can be
//! reported with the stage that terminated it and an actionable message.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for release matrix operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all release matrix operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Trigger tag errors
    #[error("Trigger error: {0}")]
    Trigger(#[from] TriggerError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Build matrix errors
    #[error("Matrix error: {0}")]
    Matrix(#[from] MatrixError),

    /// Toolchain provisioning errors
    #[error("Provisioning error: {0}")]
    Provision(#[from] ProvisionError),

    /// Primary build errors
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Package build errors
    #[error("Packaging error: {0}")]
    Package(#[from] PackageError),

    /// Artifact collection errors
    #[error("Collect error: {0}")]
    Collect(#[from] CollectError),

    /// Publication errors
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    /// State persistence errors
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Trigger tag errors
#[derive(Error, Debug)]
pub enum TriggerError {
    /// Tag does not match the release pattern
    #[error("Tag '{tag}' does not match release pattern '{pattern}'")]
    NoMatch {
        /// Pushed tag
        tag: String,
        /// Configured pattern
        pattern: String,
    },

    /// Release pattern itself is malformed
    #[error("Invalid release pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Pattern string
        pattern: String,
        /// Reason for the error
        reason: String,
    },

    /// No tag given and none found in the environment
    #[error("No tag given and GITHUB_REF_NAME is not set")]
    Missing,
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config at {path}: {source}")]
    ReadFailed {
        /// Config path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file could not be parsed
    #[error("Failed to parse config at {path}: {source}")]
    ParseFailed {
        /// Config path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },

    /// Required value missing
    #[error("Missing configuration value: {key}")]
    Missing {
        /// Key name
        key: String,
    },

    /// Value present but unusable
    #[error("Invalid configuration value for '{key}': {reason}")]
    Invalid {
        /// Key name
        key: String,
        /// Reason for the error
        reason: String,
    },
}

/// Build matrix validation errors
#[derive(Error, Debug)]
pub enum MatrixError {
    /// Matrix has no entries
    #[error("Build matrix has no entries")]
    Empty,

    /// Two entries share a canonical output name
    #[error("Canonical output name '{name}' is used by both '{first}' and '{second}'")]
    DuplicateCanonicalName {
        /// Duplicated name
        name: String,
        /// First entry using it
        first: String,
        /// Second entry using it
        second: String,
    },

    /// Two entries share a platform id
    #[error("Platform '{platform}' appears more than once in the matrix")]
    DuplicatePlatform {
        /// Platform id
        platform: String,
    },

    /// An entry is internally inconsistent
    #[error("Invalid entry '{platform}': {reason}")]
    InvalidEntry {
        /// Platform id
        platform: String,
        /// Reason for the error
        reason: String,
    },

    /// Requested platform is not in the matrix
    #[error("Platform '{platform}' is not in the build matrix")]
    UnknownPlatform {
        /// Platform id
        platform: String,
    },

    /// A native entry was started on a machine of another OS
    #[error(
        "Entry '{platform}' builds natively and cannot run on a {host} host; \
         its output would not be a {platform} executable"
    )]
    ForeignPlatform {
        /// Platform id of the entry
        platform: String,
        /// OS of the running machine
        host: String,
    },
}

/// Toolchain provisioning errors
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// System package install failed
    #[error("Installing system packages {packages:?} failed: {reason}")]
    InstallFailed {
        /// Packages requested
        packages: Vec<String>,
        /// Reason for the error
        reason: String,
    },

    /// Adding the compiler target failed
    #[error("Adding compiler target '{target}' failed: {reason}")]
    TargetAddFailed {
        /// Target triple
        target: String,
        /// Reason for the error
        reason: String,
    },

    /// Post-install verification failed
    #[error("Verification '{check}' failed: {reason}")]
    VerifyFailed {
        /// Check that failed
        check: String,
        /// Reason for the error
        reason: String,
    },
}

/// Primary build errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// Compiler reported an error
    #[error("Compilation failed for '{platform}' (exit code {code:?}):\n{diagnostics}")]
    CompileFailed {
        /// Platform id
        platform: String,
        /// Exit code
        code: Option<i32>,
        /// Full compiler diagnostics
        diagnostics: String,
    },

    /// Lock file does not match the manifest
    #[error("Lock file mismatch for '{platform}':\n{diagnostics}")]
    LockMismatch {
        /// Platform id
        platform: String,
        /// Full compiler diagnostics
        diagnostics: String,
    },
}

/// Package build errors
#[derive(Error, Debug)]
pub enum PackageError {
    /// Packaging tool reported an error
    #[error("Package build failed for '{platform}' (exit code {code:?}):\n{diagnostics}")]
    BuildFailed {
        /// Platform id
        platform: String,
        /// Exit code
        code: Option<i32>,
        /// Full tool diagnostics
        diagnostics: String,
    },

    /// Tool exited cleanly but produced nothing
    #[error("Packaging tool produced no files matching '{pattern}' in {dir}")]
    NoPackages {
        /// Output directory
        dir: PathBuf,
        /// Expected file pattern
        pattern: String,
    },

    /// Output pattern is malformed
    #[error("Invalid package pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Pattern string
        pattern: String,
        /// Reason for the error
        reason: String,
    },
}

/// Artifact collection (path-contract) errors
#[derive(Error, Debug)]
pub enum CollectError {
    /// Build output is not where the entry says it is
    #[error(
        "Build output for '{platform}' not found at {expected}. \
         The build flags and primary_output_path disagree."
    )]
    MissingBuildOutput {
        /// Platform id
        platform: String,
        /// Expected path
        expected: PathBuf,
    },

    /// Build output path exists but is not a regular file
    #[error("Build output at {path} is not a regular file")]
    NotAFile {
        /// Offending path
        path: PathBuf,
    },

    /// Move failed
    #[error("Moving {from} to {to} failed: {source}")]
    MoveFailed {
        /// Source path
        from: PathBuf,
        /// Destination path
        to: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Publication errors
#[derive(Error, Debug)]
pub enum PublishError {
    /// Canonical artifact absent at publish time
    #[error(
        "Canonical artifact for '{platform}' not found at {expected}; refusing to publish a partial release"
    )]
    MissingCanonicalArtifact {
        /// Platform id
        platform: String,
        /// Expected path
        expected: PathBuf,
    },

    /// Pool append failed
    #[error("Uploading '{file}' to pool '{pool}' failed: {reason}")]
    PoolUploadFailed {
        /// Pool name
        pool: String,
        /// File name
        file: String,
        /// Reason for the error
        reason: String,
    },

    /// Release host rejected a request
    #[error("Release host error during {operation}: {reason}")]
    HostFailed {
        /// Operation that failed
        operation: String,
        /// Reason for the error
        reason: String,
    },

    /// No token available for the release host
    #[error("Release token not provided. Set GH_TOKEN or GITHUB_TOKEN.")]
    MissingToken,
}

/// Run report persistence errors
#[derive(Error, Debug)]
pub enum StateError {
    /// Report not found
    #[error("No run report found at {path}")]
    NotFound {
        /// Expected path
        path: PathBuf,
    },

    /// Report unreadable
    #[error("Run report corrupted: {reason}")]
    Corrupted {
        /// Reason for the error
        reason: String,
    },

    /// Illegal state transition
    #[error("Illegal transition from {from:?} to {to:?}")]
    IllegalTransition {
        /// Current state
        from: crate::state::EntryState,
        /// Requested state
        to: crate::state::EntryState,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// External command could not be started or timed out
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl ReleaseError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Trigger(TriggerError::NoMatch { pattern, .. }) => vec![
                format!("Push a tag matching '{}' (for example 1.2.3)", pattern),
            ],
            ReleaseError::Matrix(MatrixError::DuplicateCanonicalName { .. }) => vec![
                "Give every [[entries]] row a distinct canonical_output_name".to_string(),
            ],
            ReleaseError::Matrix(MatrixError::ForeignPlatform { platform, .. }) => vec![
                format!("Run this entry on a {} runner", platform),
                "Use `release_matrix run --host` to select only entries this machine can build"
                    .to_string(),
            ],
            ReleaseError::Provision(_) => vec![
                "Check that the installer command works on this runner".to_string(),
                "Re-run only this entry: release_matrix entry <TAG> --platform <P>".to_string(),
            ],
            ReleaseError::Build(BuildError::LockMismatch { .. }) => vec![
                "Run `cargo update` locally and commit Cargo.lock".to_string(),
            ],
            ReleaseError::Collect(CollectError::MissingBuildOutput { .. }) => vec![
                "Make primary_output_path agree with the entry's --target flag".to_string(),
                "Cross builds land under target/<triple>/release/, native ones under target/release/"
                    .to_string(),
            ],
            ReleaseError::Publish(PublishError::MissingCanonicalArtifact { .. }) => vec![
                "Run the full entry so the canonical artifact is produced before publishing"
                    .to_string(),
            ],
            ReleaseError::Publish(PublishError::MissingToken) => vec![
                "Export GH_TOKEN or GITHUB_TOKEN with release write permission".to_string(),
            ],
            ReleaseError::Publish(PublishError::HostFailed { .. }) => vec![
                "Already published artifacts are kept; re-run only the failed entry".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
