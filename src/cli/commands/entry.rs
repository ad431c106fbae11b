//! `entry`: run one matrix entry, typically to remediate a failed run.

use crate::cli::OutputManager;
use crate::config::ReleaseConfig;
use crate::error::{ReleaseError, Result, StateError};
use crate::matrix::Platform;
use crate::state::RunReport;

use super::{live_pipeline, report_manager, resolve_trigger};

pub(super) async fn execute_entry(
    tag: Option<&str>,
    platform: Platform,
    config: ReleaseConfig,
    output: &OutputManager,
) -> Result<i32> {
    let Some(trigger) = resolve_trigger(tag, &config, output)? else {
        return Ok(0);
    };
    let entry = config.matrix()?.get(platform)?.clone();
    let reports = report_manager(&config);

    output.info(&format!("Releasing {} for {}", trigger, platform));
    let pipeline = live_pipeline(config)?;
    let entry_report = pipeline.run_entry(&entry, &trigger).await;
    let succeeded = entry_report.succeeded();
    output.entry_report(&entry_report);

    // Fold the result into the run report so `status` reflects the remediation
    let mut report = match reports.load(trigger.tag()) {
        Ok(report) => report,
        Err(ReleaseError::State(StateError::NotFound { .. })) => RunReport::new(trigger.tag()),
        Err(e) => return Err(e),
    };
    match report.entries.iter_mut().find(|e| e.platform == platform) {
        Some(slot) => *slot = entry_report,
        None => report.entries.push(entry_report),
    }
    report.finished_at = Some(chrono::Utc::now());
    reports.save(&report)?;

    Ok(if succeeded { 0 } else { 1 })
}
