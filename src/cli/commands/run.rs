//! `run`: fan the trigger out over the matrix.

use crate::cli::OutputManager;
use crate::config::ReleaseConfig;
use crate::error::{MatrixError, Result};
use crate::matrix::{Platform, PlatformEntry};
use crate::orchestrator::Orchestrator;

use super::{live_pipeline, report_manager, resolve_trigger};

pub(super) async fn execute_run(
    tag: Option<&str>,
    platforms: &[Platform],
    host_only: bool,
    config: ReleaseConfig,
    output: &OutputManager,
) -> Result<i32> {
    let Some(trigger) = resolve_trigger(tag, &config, output)? else {
        return Ok(0);
    };

    let matrix = config.matrix()?;
    let entries: Vec<PlatformEntry> = if host_only {
        matrix.for_host()
    } else if platforms.is_empty() {
        // Native entries for other OSes belong to other runners
        let host = Platform::host();
        let runnable = matrix.runnable_on(host);
        for skipped in matrix.entries().iter().filter(|e| !e.runnable_on(host)) {
            output.warn(&format!(
                "Skipping {}: it builds natively and this machine is not {}",
                skipped.id(),
                skipped.id()
            ));
        }
        runnable
    } else {
        // Explicitly requested foreign entries fail in the pipeline
        matrix.select(platforms)?
    };
    if entries.is_empty() {
        return Err(MatrixError::Empty.into());
    }

    let reports = report_manager(&config);
    output.info(&format!(
        "Releasing {} for {}",
        trigger,
        entries
            .iter()
            .map(PlatformEntry::id)
            .collect::<Vec<_>>()
            .join(", ")
    ));

    let orchestrator = Orchestrator::new(live_pipeline(config)?);
    let report = orchestrator.run(&trigger, &entries).await;

    let path = reports.save(&report)?;
    output.run_report(&report);
    output.verbose(&format!("report: {}", path.display()));

    Ok(if report.succeeded() { 0 } else { 1 })
}
