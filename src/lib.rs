//! # release_matrix
//!
//! Tag-triggered, multi-platform release orchestration.
//!
//! A release tag fans out into one independent pipeline per build matrix
//! entry. Every entry provisions its toolchain when needed, builds the
//! executable, builds its distribution packages, moves the executable to a
//! unique canonical name and publishes. Packages go to a shared pool and
//! the canonical executable is attached to the release for the tag.
//!
//! ## Usage
//!
//! ```bash
//! release_matrix run 2.3.1                      # every matrix entry
//! release_matrix entry 2.3.1 --platform linux   # re-run one entry
//! release_matrix publish 2.3.1 --platform mac   # re-attach an artifact
//! release_matrix status 2.3.1
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod matrix;
pub mod orchestrator;
pub mod pipeline;
pub mod process;
pub mod publish;
pub mod state;
pub mod trigger;

pub use config::ReleaseConfig;
pub use error::{ReleaseError, Result};
pub use matrix::{BuildMatrix, Platform, PlatformEntry};
pub use orchestrator::Orchestrator;
pub use pipeline::{Pipeline, PublishOutcome};
pub use process::{CommandOutput, CommandRunner, CommandSpec, ProcessRunner};
pub use publish::{AnyReleaseHost, ArtifactPool, DirectoryPool, DirectoryReleaseHost, ReleaseHost};
pub use state::{EntryReport, EntryState, ReportManager, RunReport, Stage};
pub use trigger::{ReleasePattern, TriggerEvent};
