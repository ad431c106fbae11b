//! Shared fixtures: a scratch source tree and a scripted command runner.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use release_matrix::config::HostKind;
use release_matrix::error::PublishError;
use release_matrix::matrix::{Platform, PlatformEntry};
use release_matrix::publish::{PublishedAsset, ReleaseHandle};
use release_matrix::{
    CommandOutput, CommandRunner, CommandSpec, DirectoryPool, DirectoryReleaseHost, Pipeline,
    ReleaseConfig, ReleaseHost, Result,
};
use tempfile::TempDir;

pub type TestPipeline = Pipeline<FakeRunner, DirectoryPool, DirectoryReleaseHost>;

struct Failure {
    program: String,
    needle: Option<String>,
    output: CommandOutput,
}

#[derive(Default)]
struct RunnerState {
    calls: Vec<CommandSpec>,
    failures: Vec<Failure>,
    omit_outputs: Vec<Platform>,
    panics: Vec<String>,
}

/// Stands in for cargo, rustup, the installer and the package tool.
///
/// `cargo build` writes the primary output of every entry whose extra
/// flags match the command line. The package tool writes one wheel into
/// its `--out` directory. Clones share recorded calls.
#[derive(Clone)]
pub struct FakeRunner {
    entries: Vec<PlatformEntry>,
    package_program: String,
    state: Arc<Mutex<RunnerState>>,
}

impl FakeRunner {
    pub fn new(config: &ReleaseConfig, entries: &[PlatformEntry]) -> Self {
        Self {
            entries: entries.to_vec(),
            package_program: config.package.program.clone(),
            state: Arc::default(),
        }
    }

    /// Fail any `program` call whose arguments contain `needle`
    pub fn fail_on(&self, program: &str, needle: Option<&str>, output: CommandOutput) {
        self.state.lock().unwrap().failures.push(Failure {
            program: program.to_string(),
            needle: needle.map(str::to_string),
            output,
        });
    }

    /// Let `cargo build` succeed without leaving the platform's output behind
    pub fn omit_output(&self, platform: Platform) {
        self.state.lock().unwrap().omit_outputs.push(platform);
    }

    /// Panic inside any call to `program`
    pub fn panic_on(&self, program: &str) {
        self.state.lock().unwrap().panics.push(program.to_string());
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, program: &str) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == program)
            .collect()
    }

    fn respond(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(spec.clone());
        if state.panics.contains(&spec.program) {
            drop(state);
            panic!("scripted panic in {}", spec.program);
        }

        let scripted = state.failures.iter().find(|f| {
            f.program == spec.program
                && f.needle
                    .as_ref()
                    .is_none_or(|needle| spec.args.iter().any(|a| a == needle))
        });
        if let Some(failure) = scripted {
            return Ok(failure.output.clone());
        }

        match spec.program.as_str() {
            "cargo" => {
                let flags = spec
                    .args
                    .iter()
                    .skip_while(|a| *a != "--locked")
                    .skip(1)
                    .cloned()
                    .collect::<Vec<_>>();
                for entry in &self.entries {
                    if entry.extra_flags == flags && !state.omit_outputs.contains(&entry.platform)
                    {
                        let out = spec.current_dir.join(&entry.primary_output_path);
                        std::fs::create_dir_all(out.parent().unwrap())?;
                        std::fs::write(&out, format!("binary for {}", entry.id()))?;
                    }
                }
                Ok(CommandOutput::ok("Finished release"))
            }
            "rustup" if spec.args.iter().any(|a| a == "list") => {
                let installed = self
                    .entries
                    .iter()
                    .filter_map(|e| e.toolchain_target.clone())
                    .chain(["x86_64-unknown-linux-gnu".to_string()])
                    .collect::<Vec<_>>()
                    .join("\n");
                Ok(CommandOutput::ok(installed))
            }
            program if program == self.package_program => {
                let out = spec
                    .args
                    .iter()
                    .skip_while(|a| *a != "--out")
                    .nth(1)
                    .map(PathBuf::from)
                    .unwrap();
                let out = spec.current_dir.join(out);
                let tag = out.file_name().unwrap().to_string_lossy().into_owned();
                std::fs::create_dir_all(&out)?;
                std::fs::write(out.join(format!("app-1.0.0-py3-none-{tag}.whl")), b"wheel")?;
                Ok(CommandOutput::ok(""))
            }
            _ => Ok(CommandOutput::ok("")),
        }
    }
}

impl CommandRunner for FakeRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        Ok(self.respond(spec)?)
    }
}

/// Directory host that rejects one asset name the way a flaky API would
pub struct FailingHost {
    inner: DirectoryReleaseHost,
    asset: String,
}

impl FailingHost {
    pub fn new(inner: DirectoryReleaseHost, asset: &str) -> Self {
        Self {
            inner,
            asset: asset.to_string(),
        }
    }
}

impl ReleaseHost for FailingHost {
    async fn ensure_release(&self, tag: &str) -> Result<ReleaseHandle> {
        self.inner.ensure_release(tag).await
    }

    async fn upload_asset(
        &self,
        release: &ReleaseHandle,
        path: &Path,
        name: &str,
    ) -> Result<PublishedAsset> {
        if name == self.asset {
            return Err(PublishError::HostFailed {
                operation: format!("upload {}", name),
                reason: "502 Bad Gateway".to_string(),
            }
            .into());
        }
        self.inner.upload_asset(release, path, name).await
    }
}

/// Scratch source tree with a directory release host
pub struct Fixture {
    pub dir: TempDir,
    pub config: ReleaseConfig,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ReleaseConfig {
            source_dir: dir.path().to_path_buf(),
            ..ReleaseConfig::default()
        };
        config.release.host = HostKind::Directory;
        Self { dir, config }
    }

    pub fn entry(&self, platform: Platform) -> PlatformEntry {
        self.config.matrix().unwrap().get(platform).unwrap().clone()
    }

    pub fn runner(&self, entries: &[PlatformEntry]) -> FakeRunner {
        FakeRunner::new(&self.config, entries)
    }

    /// Pipeline on a mac machine, whatever OS runs the tests
    pub fn pipeline(&self, runner: &FakeRunner) -> TestPipeline {
        self.pipeline_on(runner, Platform::Mac)
    }

    pub fn pipeline_on(&self, runner: &FakeRunner, platform: Platform) -> TestPipeline {
        self.pipeline_with_host(runner, self.host(), platform)
    }

    pub fn pipeline_with_host<H: ReleaseHost>(
        &self,
        runner: &FakeRunner,
        host: H,
        platform: Platform,
    ) -> Pipeline<FakeRunner, DirectoryPool, H> {
        Pipeline::new(
            self.config.clone(),
            runner.clone(),
            DirectoryPool::new(&self.pool_root(), &self.config.pool.name),
            host,
        )
        .running_on(Some(platform))
    }

    pub fn host(&self) -> DirectoryReleaseHost {
        DirectoryReleaseHost::new(self.config.resolve(&self.config.release.directory))
    }

    pub fn pool_root(&self) -> PathBuf {
        self.config.resolve(&self.config.pool.root)
    }

    pub fn pool_dir(&self) -> PathBuf {
        self.pool_root().join(&self.config.pool.name)
    }

    pub fn canonical(&self, entry: &PlatformEntry) -> PathBuf {
        self.config.output_root().join(&entry.canonical_output_name)
    }

    pub fn release_asset(&self, tag: &str, name: &str) -> PathBuf {
        self.host().release_dir(tag).join(name)
    }

    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(relative)
    }
}
