//! Primary executable build: a locked, release-mode cargo build.

use crate::config::ReleaseConfig;
use crate::error::{BuildError, Result};
use crate::matrix::PlatformEntry;
use crate::process::{CommandRunner, CommandSpec};

/// The build command for an entry
pub fn build_command(config: &ReleaseConfig, entry: &PlatformEntry) -> CommandSpec {
    CommandSpec::new("cargo", &config.source_dir)
        .args(["build", "--release", "--locked"])
        .args(entry.extra_flags.iter().cloned())
}

/// Whether cargo refused to touch the lock file under `--locked`
fn is_lock_mismatch(diagnostics: &str) -> bool {
    diagnostics.contains("--locked was passed")
        || (diagnostics.contains("lock file") && diagnostics.contains("needs to be updated"))
}

/// Build the entry's executable. No retry: any failure is final.
pub async fn build<R: CommandRunner>(
    runner: &R,
    config: &ReleaseConfig,
    entry: &PlatformEntry,
) -> Result<()> {
    let spec = build_command(config, entry);
    log::info!("[{}] {}", entry.id(), spec);

    let output = runner
        .run(&spec)
        .await
        .map_err(|e| BuildError::CompileFailed {
            platform: entry.id().to_string(),
            code: None,
            diagnostics: e.to_string(),
        })?;

    if output.success() {
        log::info!("[{}] Build finished", entry.id());
        return Ok(());
    }

    let diagnostics = output.diagnostics();
    log::error!("[{}] Build failed:\n{}", entry.id(), diagnostics);

    if is_lock_mismatch(&diagnostics) {
        return Err(BuildError::LockMismatch {
            platform: entry.id().to_string(),
            diagnostics,
        }
        .into());
    }

    Err(BuildError::CompileFailed {
        platform: entry.id().to_string(),
        code: output.code,
        diagnostics,
    }
    .into())
}
