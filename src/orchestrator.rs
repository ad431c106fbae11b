//! Fan-out of one trigger over the build matrix.
//!
//! Each entry runs in its own task. A failing entry never cancels its
//! siblings; the run report is simply the collection of terminal states.

use chrono::Utc;
use tokio::task::JoinSet;

use crate::matrix::PlatformEntry;
use crate::pipeline::Pipeline;
use crate::process::CommandRunner;
use crate::publish::{ArtifactPool, ReleaseHost};
use crate::state::{EntryReport, RunReport};
use crate::trigger::TriggerEvent;

/// Runs matrix entries in parallel
pub struct Orchestrator<R, P, H> {
    pipeline: Pipeline<R, P, H>,
}

impl<R, P, H> Orchestrator<R, P, H>
where
    R: CommandRunner,
    P: ArtifactPool,
    H: ReleaseHost,
{
    /// Orchestrator over `pipeline`
    pub fn new(pipeline: Pipeline<R, P, H>) -> Self {
        Self { pipeline }
    }

    /// Run every entry to a terminal state; entries are reported in the
    /// order given, whatever order they finish in.
    pub async fn run(&self, trigger: &TriggerEvent, entries: &[PlatformEntry]) -> RunReport {
        let mut report = RunReport::new(trigger.tag());
        let mut tasks = JoinSet::new();

        for (index, entry) in entries.iter().cloned().enumerate() {
            let pipeline = self.pipeline.clone();
            let trigger = trigger.clone();
            tasks.spawn(async move { (index, pipeline.run_entry(&entry, &trigger).await) });
        }

        let mut slots: Vec<Option<EntryReport>> = vec![None; entries.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, entry_report)) => slots[index] = Some(entry_report),
                Err(e) => log::error!("Entry task did not complete: {}", e),
            }
        }

        report.entries = slots
            .into_iter()
            .zip(entries)
            .map(|(slot, entry)| {
                slot.unwrap_or_else(|| {
                    let mut lost = EntryReport::new(entry.platform);
                    lost.fail(None, "entry task panicked or was cancelled");
                    lost
                })
            })
            .collect();
        report.finished_at = Some(Utc::now());

        let failed = report.failed().count();
        if failed == 0 {
            log::info!("Release {}: all {} entries published", trigger, entries.len());
        } else {
            log::error!("Release {}: {} of {} entries failed", trigger, failed, entries.len());
        }

        report
    }
}
