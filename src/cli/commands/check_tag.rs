//! `check-tag`: would this tag trigger a run?

use crate::cli::OutputManager;
use crate::config::ReleaseConfig;
use crate::error::Result;

use super::resolve_trigger;

pub(super) fn execute_check_tag(
    tag: Option<&str>,
    config: &ReleaseConfig,
    output: &OutputManager,
) -> Result<i32> {
    match resolve_trigger(tag, config, output)? {
        Some(trigger) => {
            output.success(&format!("Tag '{}' triggers a release run", trigger));
            if let Some(version) = trigger.version() {
                output.verbose(&format!("version {}", version));
            }
            Ok(0)
        }
        None => Ok(1),
    }
}
