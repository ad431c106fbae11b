//! Toolchain provisioning.
//!
//! Entries without `provision = true` are a guaranteed no-op: not a single
//! command is run for them.

use crate::config::ReleaseConfig;
use crate::error::{ConfigError, ProvisionError, Result};
use crate::matrix::PlatformEntry;
use crate::process::{CommandRunner, CommandSpec};

/// Install and verify the entry's non-default toolchain.
///
/// Returns `true` when anything was installed, `false` for the no-op path.
pub async fn provision<R: CommandRunner>(
    runner: &R,
    config: &ReleaseConfig,
    entry: &PlatformEntry,
) -> Result<bool> {
    if !entry.provision {
        log::info!("[{}] Default toolchain, nothing to provision", entry.id());
        return Ok(false);
    }

    let target = entry
        .toolchain_target
        .as_deref()
        .ok_or_else(|| ConfigError::Missing {
            key: format!("entries.{}.toolchain_target", entry.id()),
        })?;
    let dir = &config.source_dir;

    if !entry.system_packages.is_empty() {
        let install_failed = |reason: String| ProvisionError::InstallFailed {
            packages: entry.system_packages.clone(),
            reason,
        };

        let spec = CommandSpec::from_argv(&config.provision.installer, dir)
            .ok_or_else(|| ConfigError::Missing {
                key: "provision.installer".to_string(),
            })?
            .args(entry.system_packages.iter().cloned());

        log::info!("[{}] Installing {}", entry.id(), entry.system_packages.join(" "));
        let output = runner
            .run(&spec)
            .await
            .map_err(|e| install_failed(e.to_string()))?;
        if !output.success() {
            return Err(install_failed(output.diagnostics()).into());
        }
    }

    let add_failed = |reason: String| ProvisionError::TargetAddFailed {
        target: target.to_string(),
        reason,
    };
    log::info!("[{}] Adding compiler target {}", entry.id(), target);
    let spec = CommandSpec::new("rustup", dir).args(["target", "add", target]);
    let output = runner
        .run(&spec)
        .await
        .map_err(|e| add_failed(e.to_string()))?;
    if !output.success() {
        return Err(add_failed(output.diagnostics()).into());
    }

    verify_target(runner, config, entry, target).await?;

    for argv in &entry.verify {
        let spec = CommandSpec::from_argv(argv, dir).ok_or_else(|| ConfigError::Invalid {
            key: format!("entries.{}.verify", entry.id()),
            reason: "empty command".to_string(),
        })?;
        let verify_failed = |reason: String| ProvisionError::VerifyFailed {
            check: spec.to_string(),
            reason,
        };
        let output = runner
            .run(&spec)
            .await
            .map_err(|e| verify_failed(e.to_string()))?;
        if !output.success() {
            return Err(verify_failed(output.diagnostics()).into());
        }
        log::debug!("[{}] {} ok", entry.id(), spec);
    }

    log::info!("[{}] Toolchain for {} ready", entry.id(), target);
    Ok(true)
}

/// Confirm rustup lists the target as installed
async fn verify_target<R: CommandRunner>(
    runner: &R,
    config: &ReleaseConfig,
    entry: &PlatformEntry,
    target: &str,
) -> Result<()> {
    let spec = CommandSpec::new("rustup", &config.source_dir).args(["target", "list", "--installed"]);
    let verify_failed = |reason: String| ProvisionError::VerifyFailed {
        check: spec.to_string(),
        reason,
    };

    let output = runner
        .run(&spec)
        .await
        .map_err(|e| verify_failed(e.to_string()))?;
    if !output.success() {
        return Err(verify_failed(output.diagnostics()).into());
    }
    if !output.stdout.lines().any(|line| line.trim() == target) {
        return Err(verify_failed(format!("{} is not listed as installed", target)).into());
    }

    log::debug!("[{}] rustup reports {} installed", entry.id(), target);
    Ok(())
}
