//! Per-entry state machine and the run-level report.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StateError};
use crate::matrix::Platform;

/// Pipeline stage of a platform entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    /// Toolchain provisioning
    Provision,
    /// Primary executable build
    Build,
    /// Package build
    Package,
    /// Rename into the canonical name
    Collect,
    /// Pool upload and release publish
    Publish,
}

impl Stage {
    /// Human-readable stage name
    pub fn name(self) -> &'static str {
        match self {
            Stage::Provision => "provision",
            Stage::Build => "build",
            Stage::Package => "package",
            Stage::Collect => "collect",
            Stage::Publish => "publish",
        }
    }

    /// State reached when this stage completes
    pub fn completes_to(self) -> EntryState {
        match self {
            Stage::Provision => EntryState::Provisioned,
            Stage::Build => EntryState::Built,
            Stage::Package => EntryState::Packaged,
            Stage::Collect => EntryState::Collected,
            Stage::Publish => EntryState::Published,
        }
    }
}

/// Lifecycle of one platform entry
///
/// `Pending → Provisioned → Built → Packaged → Collected → Published`, with
/// `Failed` reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryState {
    /// Not started
    Pending,
    /// Toolchain ready (or nothing to provision)
    Provisioned,
    /// Executable built
    Built,
    /// Package files produced
    Packaged,
    /// Executable renamed to its canonical name
    Collected,
    /// Packages pooled and executable attached to the release
    Published,
    /// A stage failed; terminal
    Failed,
}

impl EntryState {
    /// Linear successor, `None` for terminal states
    pub fn next(self) -> Option<EntryState> {
        match self {
            EntryState::Pending => Some(EntryState::Provisioned),
            EntryState::Provisioned => Some(EntryState::Built),
            EntryState::Built => Some(EntryState::Packaged),
            EntryState::Packaged => Some(EntryState::Collected),
            EntryState::Collected => Some(EntryState::Published),
            EntryState::Published | EntryState::Failed => None,
        }
    }

    /// Whether no further transition is possible
    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    /// Move to `to`, allowed only for the linear successor or `Failed`
    pub fn advance(self, to: EntryState) -> Result<EntryState> {
        let allowed = match to {
            EntryState::Failed => !self.is_terminal(),
            other => self.next() == Some(other),
        };
        if allowed {
            Ok(to)
        } else {
            Err(StateError::IllegalTransition { from: self, to }.into())
        }
    }
}

/// Why an entry failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Stage that failed, `None` for failures outside a stage
    pub stage: Option<Stage>,
    /// Error message, including tool diagnostics
    pub message: String,
}

/// Outcome of one platform entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryReport {
    /// Platform of the entry
    pub platform: Platform,
    /// Current or terminal state
    pub state: EntryState,
    /// Failure details when `state` is `Failed`
    pub failure: Option<FailureRecord>,
    /// Whether provisioning actually installed anything
    pub provisioned: bool,
    /// Package files appended to the pool
    pub packages: Vec<PathBuf>,
    /// Canonical artifact path
    pub canonical_artifact: Option<PathBuf>,
    /// SHA-256 of the published artifact
    pub sha256: Option<String>,
    /// Release asset URL, when the host reports one
    pub asset_url: Option<String>,
    /// When the entry started
    pub started_at: DateTime<Utc>,
    /// When the entry reached a terminal state
    pub finished_at: Option<DateTime<Utc>>,
}

impl EntryReport {
    /// Fresh report in `Pending`
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            state: EntryState::Pending,
            failure: None,
            provisioned: false,
            packages: Vec::new(),
            canonical_artifact: None,
            sha256: None,
            asset_url: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Record completion of `stage`
    pub fn complete(&mut self, stage: Stage) -> Result<()> {
        self.state = self.state.advance(stage.completes_to())?;
        if self.state.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Move to `Failed`, recording the stage that was running
    pub fn fail(&mut self, stage: Option<Stage>, message: impl Into<String>) {
        self.failure = Some(FailureRecord {
            stage,
            message: message.into(),
        });
        self.state = EntryState::Failed;
        self.finished_at = Some(Utc::now());
    }

    /// Whether the entry finished publishing
    pub fn succeeded(&self) -> bool {
        self.state == EntryState::Published
    }
}

/// Outcome of a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Triggering tag
    pub tag: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the last entry finished
    pub finished_at: Option<DateTime<Utc>>,
    /// Entry outcomes in matrix order
    pub entries: Vec<EntryReport>,
}

impl RunReport {
    /// Empty report for `tag`
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            entries: Vec::new(),
        }
    }

    /// Logical AND over all entries; an empty run did not succeed
    pub fn succeeded(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(EntryReport::succeeded)
    }

    /// Entries that ended in `Failed`
    pub fn failed(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries.iter().filter(|e| e.state == EntryState::Failed)
    }

    /// Entry for one platform
    pub fn entry(&self, platform: Platform) -> Option<&EntryReport> {
        self.entries.iter().find(|e| e.platform == platform)
    }
}
