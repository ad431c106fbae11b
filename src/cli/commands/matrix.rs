//! `matrix`: validate and print the build matrix.

use crate::cli::OutputManager;
use crate::config::ReleaseConfig;
use crate::error::Result;

pub(super) fn execute_matrix(config: &ReleaseConfig, output: &OutputManager) -> Result<i32> {
    let matrix = config.matrix()?;

    output.section("Build matrix");
    for entry in matrix.entries() {
        output.println(&format!(
            "{:<8} {} -> {}",
            entry.id(),
            entry.primary_output_path.display(),
            entry.canonical_output_name
        ));
        match &entry.toolchain_target {
            Some(target) if entry.provision => {
                output.indent(&format!("provision: {}", target));
                if !entry.system_packages.is_empty() {
                    output.indent(&format!("packages: {}", entry.system_packages.join(" ")));
                }
            }
            _ => output.indent("provision: none"),
        }
        if !entry.extra_flags.is_empty() {
            output.indent(&format!("flags: {}", entry.extra_flags.join(" ")));
        }
        for check in &entry.verify {
            output.verbose(&format!("verify: {}", check.join(" ")));
        }
    }
    output.success(&format!("{} entries, canonical names unique", matrix.entries().len()));
    Ok(0)
}
