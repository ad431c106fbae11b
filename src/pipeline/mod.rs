//! Per-entry release pipeline.
//!
//! One platform entry runs Provision → Build → Package → Collect → Publish in
//! strict sequence. The first failing stage moves the entry to `Failed` and
//! nothing after it runs. Nothing is retried.

pub mod build;
pub mod collect;
pub mod package;
pub mod provision;
pub mod publish;

use std::sync::Arc;

use crate::config::ReleaseConfig;
use crate::error::ReleaseError;
use crate::matrix::{Platform, PlatformEntry};
use crate::process::CommandRunner;
use crate::publish::{ArtifactPool, ReleaseHost};
use crate::state::{EntryReport, Stage};
use crate::trigger::TriggerEvent;

pub use publish::PublishOutcome;

type StageResult<T> = std::result::Result<T, (Stage, ReleaseError)>;

fn at<T>(stage: Stage, result: crate::error::Result<T>) -> StageResult<T> {
    result.map_err(|e| (stage, e))
}

/// Everything an entry needs to run, shared cheaply between entry tasks
pub struct Pipeline<R, P, H> {
    config: Arc<ReleaseConfig>,
    runner: Arc<R>,
    pool: Arc<P>,
    host: Arc<H>,
    runs_on: Option<Platform>,
}

impl<R, P, H> Clone for Pipeline<R, P, H> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            runner: Arc::clone(&self.runner),
            pool: Arc::clone(&self.pool),
            host: Arc::clone(&self.host),
            runs_on: self.runs_on,
        }
    }
}

impl<R, P, H> Pipeline<R, P, H>
where
    R: CommandRunner,
    P: ArtifactPool,
    H: ReleaseHost,
{
    /// Assemble a pipeline for entries running on this machine
    pub fn new(config: ReleaseConfig, runner: R, pool: P, host: H) -> Self {
        Self {
            config: Arc::new(config),
            runner: Arc::new(runner),
            pool: Arc::new(pool),
            host: Arc::new(host),
            runs_on: Platform::host(),
        }
    }

    /// Treat the machine as running `platform` when deciding which native
    /// entries may build here
    pub fn running_on(mut self, platform: Option<Platform>) -> Self {
        self.runs_on = platform;
        self
    }

    /// Run every stage for one entry and report its terminal state
    pub async fn run_entry(&self, entry: &PlatformEntry, trigger: &TriggerEvent) -> EntryReport {
        let mut report = EntryReport::new(entry.platform);
        log::info!("[{}] Starting release {}", entry.id(), trigger);

        if let Err((stage, error)) = self.drive(entry, trigger, &mut report).await {
            log::error!("[{}] {} stage failed: {}", entry.id(), stage.name(), error);
            report.fail(Some(stage), error.to_string());
        } else {
            log::info!("[{}] Published", entry.id());
        }

        report
    }

    async fn drive(
        &self,
        entry: &PlatformEntry,
        trigger: &TriggerEvent,
        report: &mut EntryReport,
    ) -> StageResult<()> {
        let config = self.config.as_ref();
        let runner = self.runner.as_ref();

        // A native build on the wrong OS would publish a foreign executable
        at(Stage::Provision, entry.ensure_runnable_on(self.runs_on))?;
        report.provisioned = at(
            Stage::Provision,
            provision::provision(runner, config, entry).await,
        )?;
        at(Stage::Provision, report.complete(Stage::Provision))?;

        at(Stage::Build, build::build(runner, config, entry).await)?;
        at(Stage::Build, report.complete(Stage::Build))?;

        let packages = at(Stage::Package, package::package(runner, config, entry).await)?;
        at(Stage::Package, report.complete(Stage::Package))?;

        let canonical = at(Stage::Collect, collect::collect(config, entry).await)?;
        report.canonical_artifact = Some(canonical);
        at(Stage::Collect, report.complete(Stage::Collect))?;

        // Check presence before touching the pool so a broken entry publishes nothing
        at(Stage::Publish, publish::require_canonical(config, entry).await)?;
        report.packages = at(
            Stage::Publish,
            publish::upload_packages(self.pool.as_ref(), entry, &packages).await,
        )?;
        let outcome = at(
            Stage::Publish,
            publish::publish_release(self.host.as_ref(), config, entry, trigger).await,
        )?;
        report.sha256 = Some(outcome.sha256);
        report.asset_url = Some(outcome.asset.url);
        at(Stage::Publish, report.complete(Stage::Publish))?;

        Ok(())
    }

    /// Release-publish an existing canonical artifact without building.
    ///
    /// Used to re-attach an artifact after a failed publish.
    pub async fn publish_only(
        &self,
        entry: &PlatformEntry,
        trigger: &TriggerEvent,
    ) -> crate::error::Result<PublishOutcome> {
        entry.ensure_runnable_on(self.runs_on)?;
        publish::publish_release(self.host.as_ref(), &self.config, entry, trigger).await
    }
}
