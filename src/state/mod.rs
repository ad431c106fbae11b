//! Entry state tracking and run reports.
//!
//! Each platform entry walks a linear state machine; the run report collects
//! every entry's terminal state and is persisted as JSON next to the
//! canonical artifacts.

mod manager;
mod run_state;

pub use manager::ReportManager;
pub use run_state::{EntryReport, EntryState, FailureRecord, RunReport, Stage};
