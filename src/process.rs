//! External command execution.
//!
//! Every stage reaches the compiler, the packaging tool and the system
//! installer through [`CommandRunner`], so stage logic can run against a
//! scripted runner in tests.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use crate::error::{CliError, ReleaseError, Result};

/// A command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name or path
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Working directory
    pub current_dir: PathBuf,
}

impl CommandSpec {
    /// Command running `program` in `dir`
    pub fn new(program: impl Into<String>, dir: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: dir.to_path_buf(),
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Build from an argv vector (`[program, args..]`)
    pub fn from_argv(argv: &[String], dir: &Path) -> Option<Self> {
        let (program, rest) = argv.split_first()?;
        Some(Self::new(program.clone(), dir).args(rest.iter().cloned()))
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the command exited with status 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stderr, or stdout when stderr is empty
    pub fn diagnostics(&self) -> String {
        if self.stderr.trim().is_empty() {
            self.stdout.clone()
        } else {
            self.stderr.clone()
        }
    }
}

/// Runs external commands.
///
/// An `Err` means the command could not be started or did not finish; a
/// command that ran and exited non-zero is an `Ok` with a failing
/// [`CommandOutput`], so each stage can classify its own failure.
pub trait CommandRunner: Send + Sync + 'static {
    /// Run a command to completion and capture its output
    fn run(&self, spec: &CommandSpec) -> impl Future<Output = Result<CommandOutput>> + Send;
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    /// Runner with no timeout
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner that kills processes exceeding `timeout`
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let exec_failed = |reason: String| {
            ReleaseError::Cli(CliError::ExecutionFailed {
                command: spec.to_string(),
                reason,
            })
        };

        let program = which::which(&spec.program)
            .map_err(|e| exec_failed(format!("'{}' not found on PATH: {}", spec.program, e)))?;

        log::debug!("Running: {} (in {})", spec, spec.current_dir.display());

        let child = tokio::process::Command::new(&program)
            .args(&spec.args)
            .current_dir(&spec.current_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| exec_failed(e.to_string()))?;

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| exec_failed(format!("timed out after {}s", limit.as_secs())))?,
            None => child.wait_with_output().await,
        }
        .map_err(|e| exec_failed(e.to_string()))?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_program_and_args() {
        let spec = CommandSpec::new("cargo", Path::new("."))
            .arg("build")
            .args(["--release", "--locked"]);
        assert_eq!(spec.to_string(), "cargo build --release --locked");
    }

    #[test]
    fn from_argv_needs_a_program() {
        assert!(CommandSpec::from_argv(&[], Path::new(".")).is_none());
        let spec = CommandSpec::from_argv(
            &["musl-gcc".to_string(), "--version".to_string()],
            Path::new("."),
        )
        .unwrap();
        assert_eq!(spec.program, "musl-gcc");
        assert_eq!(spec.args, vec!["--version".to_string()]);
    }

    #[test]
    fn diagnostics_prefer_stderr() {
        let out = CommandOutput {
            code: Some(1),
            stdout: "compiling".to_string(),
            stderr: "error: boom".to_string(),
        };
        assert_eq!(out.diagnostics(), "error: boom");
        assert_eq!(CommandOutput::failed(1, "").diagnostics(), "");
    }

    #[tokio::test]
    async fn missing_program_is_an_execution_error() {
        let runner = ProcessRunner::new();
        let spec = CommandSpec::new("definitely-not-a-real-tool-4c1f", Path::new("."));
        let err = runner.run(&spec).await.unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::Cli(CliError::ExecutionFailed { .. })
        ));
    }
}
