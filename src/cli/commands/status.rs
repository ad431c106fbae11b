//! `status`: print the persisted report of a run.

use crate::cli::OutputManager;
use crate::config::ReleaseConfig;
use crate::error::Result;
use crate::trigger::TriggerEvent;

use super::report_manager;

pub(super) fn execute_status(
    tag: Option<&str>,
    json: bool,
    config: &ReleaseConfig,
    output: &OutputManager,
) -> Result<i32> {
    let tag = TriggerEvent::resolve_tag(tag)?;
    let report = report_manager(config).load(&tag)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output.run_report(&report);
        output.println(&format!("Started: {}", report.started_at));
        if let Some(finished) = report.finished_at {
            output.println(&format!(
                "Finished: {} ({}s)",
                finished,
                (finished - report.started_at).num_seconds()
            ));
        }
    }

    Ok(if report.succeeded() { 0 } else { 1 })
}
