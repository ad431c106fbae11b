//! `publish`: attach an existing canonical artifact without rebuilding.

use crate::cli::OutputManager;
use crate::config::ReleaseConfig;
use crate::error::Result;
use crate::matrix::Platform;

use super::{live_pipeline, resolve_trigger};

pub(super) async fn execute_publish(
    tag: Option<&str>,
    platform: Platform,
    config: ReleaseConfig,
    output: &OutputManager,
) -> Result<i32> {
    let Some(trigger) = resolve_trigger(tag, &config, output)? else {
        return Ok(0);
    };
    let entry = config.matrix()?.get(platform)?.clone();

    let pipeline = live_pipeline(config)?;
    let outcome = pipeline.publish_only(&entry, &trigger).await?;

    output.success(&format!(
        "{}: published {} to {}",
        platform, outcome.asset.name, trigger
    ));
    output.indent(&format!("from {}", outcome.canonical.display()));
    output.indent(&format!("sha256 {}", outcome.sha256));
    if let Some(url) = outcome.release_url {
        output.indent(&url);
    }
    Ok(0)
}
