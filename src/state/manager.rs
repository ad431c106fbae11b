//! Run report persistence.
//!
//! Reports are written atomically (temp file + rename) so a concurrent
//! reader never observes a half-written file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, StateError};
use crate::state::RunReport;

/// Reads and writes run reports under one directory
#[derive(Debug, Clone)]
pub struct ReportManager {
    dir: PathBuf,
}

impl ReportManager {
    /// Manager storing reports in `dir`
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Report file for `tag`
    pub fn report_path(&self, tag: &str) -> PathBuf {
        self.dir.join(format!("run-{}.json", tag))
    }

    /// Persist a report, replacing any previous one for the same tag
    pub fn save(&self, report: &RunReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let path = self.report_path(&report.tag);
        let temp_path = path.with_extension("json.tmp");
        let serialized = serde_json::to_string_pretty(report)?;

        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(serialized.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &path)?;

        log::debug!("Saved run report to {}", path.display());
        Ok(path)
    }

    /// Load the report for `tag`
    pub fn load(&self, tag: &str) -> Result<RunReport> {
        let path = self.report_path(tag);
        if !path.exists() {
            return Err(StateError::NotFound { path }.into());
        }

        let content = fs::read_to_string(&path)?;
        let report: RunReport =
            serde_json::from_str(&content).map_err(|e| StateError::Corrupted {
                reason: format!("{}: {}", path.display(), e),
            })?;

        if report.tag != tag {
            return Err(StateError::Corrupted {
                reason: format!(
                    "{} holds tag '{}', expected '{}'",
                    path.display(),
                    report.tag,
                    tag
                ),
            }
            .into());
        }

        Ok(report)
    }
}
