//! Command line argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::matrix::Platform;

/// Tag-triggered multi-platform release orchestration
#[derive(Parser, Debug)]
#[command(
    name = "release_matrix",
    version,
    about = "Build, package and publish one executable per platform for a release tag",
    long_about = "Build, package and publish one executable per platform for a release tag.

Usage:
  release_matrix run 2.3.1
  release_matrix run --host            # only entries for this machine's OS
  release_matrix entry 2.3.1 --platform linux
  release_matrix publish 2.3.1 --platform windows
  release_matrix check-tag 2.3.1

TAG defaults to GITHUB_REF_NAME when omitted."
)]
pub struct Args {
    /// Configuration file (default: ./release.toml when present)
    #[arg(long, short = 'c', global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress all output except errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show per-entry details (digests, pooled packages, full diagnostics)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every selected matrix entry in parallel for a tag
    Run {
        /// Release tag
        #[arg(value_name = "TAG")]
        tag: Option<String>,

        /// Restrict to these platforms (repeatable)
        #[arg(long = "platform", short = 'p', value_parser = parse_platform)]
        platforms: Vec<Platform>,

        /// Restrict to the platform of the running machine
        #[arg(long, conflicts_with = "platforms")]
        host: bool,
    },

    /// Run a single matrix entry end to end
    Entry {
        /// Release tag
        #[arg(value_name = "TAG")]
        tag: Option<String>,

        /// Platform to run
        #[arg(long, short = 'p', value_parser = parse_platform)]
        platform: Platform,
    },

    /// Attach an already collected canonical artifact to the release
    Publish {
        /// Release tag
        #[arg(value_name = "TAG")]
        tag: Option<String>,

        /// Platform whose artifact is published
        #[arg(long, short = 'p', value_parser = parse_platform)]
        platform: Platform,
    },

    /// Validate and print the build matrix
    Matrix,

    /// Exit 0 if TAG would trigger a run, 1 otherwise
    CheckTag {
        /// Tag to test
        #[arg(value_name = "TAG")]
        tag: Option<String>,
    },

    /// Print the persisted report of a previous run
    Status {
        /// Release tag
        #[arg(value_name = "TAG")]
        tag: Option<String>,

        /// Print the raw JSON report
        #[arg(long)]
        json: bool,
    },
}

impl Command {
    /// Name of the command, for messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::Run { .. } => "run",
            Command::Entry { .. } => "entry",
            Command::Publish { .. } => "publish",
            Command::Matrix => "matrix",
            Command::CheckTag { .. } => "check-tag",
            Command::Status { .. } => "status",
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

fn parse_platform(value: &str) -> Result<Platform, String> {
    Platform::from_id(value).map_err(|e| e.to_string())
}
