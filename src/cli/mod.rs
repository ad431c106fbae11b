//! Command line interface for release_matrix.

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command};
pub use commands::execute_command;
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point, returning the process exit code
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute_command(args).await
}
