//! Command execution.
//!
//! Each command loads configuration, resolves the trigger where it needs
//! one and returns the process exit code.

mod check_tag;
mod entry;
mod matrix;
mod publish;
mod run;
mod status;

use crate::cli::{Args, Command, OutputManager};
use crate::config::ReleaseConfig;
use crate::error::{ReleaseError, Result, TriggerError};
use crate::pipeline::Pipeline;
use crate::process::ProcessRunner;
use crate::publish::{AnyReleaseHost, DirectoryPool};
use crate::state::ReportManager;
use crate::trigger::TriggerEvent;

/// Pipeline wired to real processes, the pool directory and the configured host
pub(crate) type LivePipeline = Pipeline<ProcessRunner, DirectoryPool, AnyReleaseHost>;

/// Execute the parsed command
pub async fn execute_command(args: Args) -> Result<i32> {
    let output = OutputManager::new(args.verbose, args.quiet);

    let result = match ReleaseConfig::load(args.config.as_deref()) {
        Ok(config) => dispatch(&args.command, config, &output).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => Ok(code),
        Err(e) => {
            output.error(&format!("Command '{}' failed: {}", args.command.name(), e));
            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                output.println("\n💡 Recovery suggestions:");
                for suggestion in suggestions {
                    output.println(&format!("  • {}", suggestion));
                }
            }
            Ok(1)
        }
    }
}

async fn dispatch(command: &Command, config: ReleaseConfig, output: &OutputManager) -> Result<i32> {
    match command {
        Command::Run {
            tag,
            platforms,
            host,
        } => run::execute_run(tag.as_deref(), platforms, *host, config, output).await,
        Command::Entry { tag, platform } => {
            entry::execute_entry(tag.as_deref(), *platform, config, output).await
        }
        Command::Publish { tag, platform } => {
            publish::execute_publish(tag.as_deref(), *platform, config, output).await
        }
        Command::Matrix => matrix::execute_matrix(&config, output),
        Command::CheckTag { tag } => check_tag::execute_check_tag(tag.as_deref(), &config, output),
        Command::Status { tag, json } => {
            status::execute_status(tag.as_deref(), *json, &config, output)
        }
    }
}

/// Resolve the trigger; `None` when the tag does not match the pattern
pub(super) fn resolve_trigger(
    tag: Option<&str>,
    config: &ReleaseConfig,
    output: &OutputManager,
) -> Result<Option<TriggerEvent>> {
    let tag = TriggerEvent::resolve_tag(tag)?;
    let pattern = config.pattern()?;
    match TriggerEvent::from_tag(&tag, &pattern) {
        Ok(trigger) => Ok(Some(trigger)),
        Err(ReleaseError::Trigger(TriggerError::NoMatch { .. })) => {
            output.info(&format!(
                "Tag '{}' does not match '{}', no run triggered",
                tag, pattern
            ));
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Wire the pipeline used by `run`, `entry` and `publish`
pub(super) fn live_pipeline(config: ReleaseConfig) -> Result<LivePipeline> {
    let runner = ProcessRunner::with_timeout(config.stage_timeout());
    let pool = DirectoryPool::new(&config.resolve(&config.pool.root), &config.pool.name);
    let host = AnyReleaseHost::from_config(&config)?;
    Ok(Pipeline::new(config, runner, pool, host))
}

/// Where run reports for this configuration are kept
pub(super) fn report_manager(config: &ReleaseConfig) -> ReportManager {
    ReportManager::new(config.output_root())
}
