//! The static build matrix: one immutable [`PlatformEntry`] per target OS.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MatrixError, Result};

/// Cross target used by the default linux entry
pub const LINUX_MUSL_TARGET: &str = "x86_64-unknown-linux-musl";

/// Host operating system selected by a matrix entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Linux runners
    Linux,
    /// macOS runners
    #[serde(alias = "macos")]
    Mac,
    /// Windows runners
    Windows,
}

impl Platform {
    /// Every supported platform, in matrix order
    pub const ALL: [Platform; 3] = [Platform::Linux, Platform::Mac, Platform::Windows];

    /// Identifier used in config, CLI and reports
    pub fn id(self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Mac => "mac",
            Platform::Windows => "windows",
        }
    }

    /// Suffix appended to the base name in canonical artifact names
    pub fn suffix(self) -> &'static str {
        self.id()
    }

    /// Executable extension, present only on windows
    pub fn exe_extension(self) -> &'static str {
        match self {
            Platform::Windows => ".exe",
            _ => "",
        }
    }

    /// Platform of the running host, if supported
    ///
    /// Uses runtime detection via `std::env::consts::OS`.
    pub fn host() -> Option<Self> {
        match std::env::consts::OS {
            "linux" => Some(Platform::Linux),
            "macos" => Some(Platform::Mac),
            "windows" => Some(Platform::Windows),
            _ => None,
        }
    }

    /// Parse a platform id (`linux`, `mac`/`macos`, `windows`)
    pub fn from_id(id: &str) -> Result<Self> {
        match id {
            "linux" => Ok(Platform::Linux),
            "mac" | "macos" => Ok(Platform::Mac),
            "windows" => Ok(Platform::Windows),
            other => Err(MatrixError::UnknownPlatform {
                platform: other.to_string(),
            }
            .into()),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// One row of the build matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformEntry {
    /// Host OS for this entry
    pub platform: Platform,
    /// Whether this entry needs a non-default toolchain installed first
    #[serde(default)]
    pub provision: bool,
    /// Compiler target to add when provisioning
    #[serde(default)]
    pub toolchain_target: Option<String>,
    /// System packages to install when provisioning
    #[serde(default)]
    pub system_packages: Vec<String>,
    /// Extra capability checks run after provisioning
    #[serde(default)]
    pub verify: Vec<Vec<String>>,
    /// Flags passed identically to the primary build and the package build
    #[serde(default)]
    pub extra_flags: Vec<String>,
    /// Where the compiler leaves the executable, relative to the source tree
    pub primary_output_path: PathBuf,
    /// File name the executable is published under
    pub canonical_output_name: String,
}

impl PlatformEntry {
    /// Native entry: no provisioning, output under `target/release/`
    pub fn native(platform: Platform, base_name: &str) -> Self {
        let exe = platform.exe_extension();
        Self {
            platform,
            provision: false,
            toolchain_target: None,
            system_packages: Vec::new(),
            verify: Vec::new(),
            extra_flags: Vec::new(),
            primary_output_path: Path::new("target")
                .join("release")
                .join(format!("{base_name}{exe}")),
            canonical_output_name: canonical_name(base_name, platform),
        }
    }

    /// Cross entry: provisions `target`, output under `target/<target>/release/`
    pub fn cross(platform: Platform, base_name: &str, target: &str) -> Self {
        let exe = platform.exe_extension();
        Self {
            platform,
            provision: true,
            toolchain_target: Some(target.to_string()),
            system_packages: Vec::new(),
            verify: Vec::new(),
            extra_flags: vec!["--target".to_string(), target.to_string()],
            primary_output_path: Path::new("target")
                .join(target)
                .join("release")
                .join(format!("{base_name}{exe}")),
            canonical_output_name: canonical_name(base_name, platform),
        }
    }

    /// Platform id of this entry
    pub fn id(&self) -> &'static str {
        self.platform.id()
    }

    /// Whether this entry can build on a machine running `host`.
    ///
    /// Entries with a compiler target cross-compile and run anywhere; native
    /// entries only on their own OS.
    pub fn runnable_on(&self, host: Option<Platform>) -> bool {
        self.toolchain_target.is_some() || host == Some(self.platform)
    }

    /// Fail with [`MatrixError::ForeignPlatform`] unless runnable on `host`
    pub fn ensure_runnable_on(&self, host: Option<Platform>) -> Result<()> {
        if self.runnable_on(host) {
            return Ok(());
        }
        Err(MatrixError::ForeignPlatform {
            platform: self.id().to_string(),
            host: host.map_or("unsupported", Platform::id).to_string(),
        }
        .into())
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: String| MatrixError::InvalidEntry {
            platform: self.id().to_string(),
            reason,
        };

        if self.provision && self.toolchain_target.is_none() {
            return Err(invalid("provision = true requires toolchain_target".to_string()).into());
        }

        let name = &self.canonical_output_name;
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name == "."
            || name == ".."
        {
            return Err(invalid(format!(
                "canonical_output_name '{}' must be a plain file name",
                name
            ))
            .into());
        }

        let windows = self.platform == Platform::Windows;
        let output_is_exe = self
            .primary_output_path
            .extension()
            .is_some_and(|ext| ext == "exe");
        let canonical_is_exe = name.ends_with(".exe");

        if windows && !(output_is_exe && canonical_is_exe) {
            return Err(invalid(
                "windows entries must carry the .exe suffix on both output paths".to_string(),
            )
            .into());
        }
        if !windows && (output_is_exe || canonical_is_exe) {
            return Err(invalid(".exe suffix is reserved for the windows entry".to_string()).into());
        }

        Ok(())
    }
}

/// Canonical artifact name: `{base}-{suffix}[.exe]`
pub fn canonical_name(base_name: &str, platform: Platform) -> String {
    format!("{}-{}{}", base_name, platform.suffix(), platform.exe_extension())
}

/// Fixed set of platform entries known ahead of time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMatrix {
    entries: Vec<PlatformEntry>,
}

impl BuildMatrix {
    /// Build and validate a matrix
    pub fn new(entries: Vec<PlatformEntry>) -> Result<Self> {
        let matrix = Self { entries };
        matrix.validate()?;
        Ok(matrix)
    }

    /// Linux (musl cross build), mac and windows entries for `base_name`
    pub fn default_for(base_name: &str) -> Self {
        let mut linux = PlatformEntry::cross(Platform::Linux, base_name, LINUX_MUSL_TARGET);
        linux.system_packages = vec!["musl-tools".to_string()];
        linux.verify = vec![vec!["musl-gcc".to_string(), "--version".to_string()]];

        Self {
            entries: vec![
                linux,
                PlatformEntry::native(Platform::Mac, base_name),
                PlatformEntry::native(Platform::Windows, base_name),
            ],
        }
    }

    /// Check every per-entry rule and the cross-entry uniqueness rules
    pub fn validate(&self) -> Result<()> {
        if self.entries.is_empty() {
            return Err(MatrixError::Empty.into());
        }

        let mut platforms = HashSet::new();
        let mut names: HashMap<&str, &str> = HashMap::new();

        for entry in &self.entries {
            entry.validate()?;

            if !platforms.insert(entry.platform) {
                return Err(MatrixError::DuplicatePlatform {
                    platform: entry.id().to_string(),
                }
                .into());
            }

            if let Some(first) = names.insert(&entry.canonical_output_name, entry.id()) {
                return Err(MatrixError::DuplicateCanonicalName {
                    name: entry.canonical_output_name.clone(),
                    first: first.to_string(),
                    second: entry.id().to_string(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// All entries in matrix order
    pub fn entries(&self) -> &[PlatformEntry] {
        &self.entries
    }

    /// Entry for one platform
    pub fn get(&self, platform: Platform) -> Result<&PlatformEntry> {
        self.entries
            .iter()
            .find(|e| e.platform == platform)
            .ok_or_else(|| {
                MatrixError::UnknownPlatform {
                    platform: platform.id().to_string(),
                }
                .into()
            })
    }

    /// Entries for the given platforms, in matrix order; empty selects all
    pub fn select(&self, platforms: &[Platform]) -> Result<Vec<PlatformEntry>> {
        if platforms.is_empty() {
            return Ok(self.entries.clone());
        }
        for &platform in platforms {
            self.get(platform)?;
        }
        Ok(self
            .entries
            .iter()
            .filter(|e| platforms.contains(&e.platform))
            .cloned()
            .collect())
    }

    /// Entries that can build on `host`, in matrix order
    pub fn runnable_on(&self, host: Option<Platform>) -> Vec<PlatformEntry> {
        self.entries
            .iter()
            .filter(|e| e.runnable_on(host))
            .cloned()
            .collect()
    }

    /// Entries whose platform is the running host
    pub fn for_host(&self) -> Vec<PlatformEntry> {
        match Platform::host() {
            Some(host) => self
                .entries
                .iter()
                .filter(|e| e.platform == host)
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_canonical_names_are_distinct() {
        let matrix = BuildMatrix::default_for("app");
        matrix.validate().unwrap();

        let names: HashSet<_> = matrix
            .entries()
            .iter()
            .map(|e| e.canonical_output_name.as_str())
            .collect();
        assert_eq!(names.len(), matrix.entries().len());
        assert!(names.contains("app-linux"));
        assert!(names.contains("app-mac"));
        assert!(names.contains("app-windows.exe"));
    }

    #[test]
    fn only_linux_is_provisioned_by_default() {
        let matrix = BuildMatrix::default_for("app");
        let linux = matrix.get(Platform::Linux).unwrap();
        assert!(linux.provision);
        assert_eq!(linux.toolchain_target.as_deref(), Some(LINUX_MUSL_TARGET));
        assert_eq!(
            linux.primary_output_path,
            Path::new("target").join(LINUX_MUSL_TARGET).join("release").join("app")
        );
        assert!(!matrix.get(Platform::Mac).unwrap().provision);
        assert!(!matrix.get(Platform::Windows).unwrap().provision);
    }

    #[test]
    fn duplicate_canonical_name_is_rejected() {
        let mut mac = PlatformEntry::native(Platform::Mac, "app");
        mac.canonical_output_name = "app-linux".to_string();
        let result = BuildMatrix::new(vec![PlatformEntry::native(Platform::Linux, "app"), mac]);
        assert!(matches!(
            result,
            Err(crate::ReleaseError::Matrix(MatrixError::DuplicateCanonicalName { .. }))
        ));
    }

    #[test]
    fn windows_entry_requires_exe() {
        let mut windows = PlatformEntry::native(Platform::Windows, "app");
        windows.canonical_output_name = "app-windows".to_string();
        assert!(BuildMatrix::new(vec![windows]).is_err());

        let mut linux = PlatformEntry::native(Platform::Linux, "app");
        linux.canonical_output_name = "app-linux.exe".to_string();
        assert!(BuildMatrix::new(vec![linux]).is_err());
    }

    #[test]
    fn provision_without_target_is_rejected() {
        let mut linux = PlatformEntry::native(Platform::Linux, "app");
        linux.provision = true;
        assert!(BuildMatrix::new(vec![linux]).is_err());
    }

    #[test]
    fn canonical_name_must_be_a_file_name() {
        let mut linux = PlatformEntry::native(Platform::Linux, "app");
        linux.canonical_output_name = "bin/app-linux".to_string();
        assert!(BuildMatrix::new(vec![linux]).is_err());
    }

    #[test]
    fn select_keeps_matrix_order_and_rejects_unknown() {
        let matrix = BuildMatrix::default_for("app");
        let picked = matrix.select(&[Platform::Windows, Platform::Linux]).unwrap();
        assert_eq!(picked[0].platform, Platform::Linux);
        assert_eq!(picked[1].platform, Platform::Windows);

        let only_mac = BuildMatrix::new(vec![PlatformEntry::native(Platform::Mac, "app")]).unwrap();
        assert!(only_mac.select(&[Platform::Linux]).is_err());
    }

    #[test]
    fn native_entries_only_run_on_their_own_os() {
        let matrix = BuildMatrix::default_for("app");
        let mac = matrix.get(Platform::Mac).unwrap();
        assert!(mac.runnable_on(Some(Platform::Mac)));
        assert!(!mac.runnable_on(Some(Platform::Linux)));
        assert!(!mac.runnable_on(None));

        let err = mac.ensure_runnable_on(Some(Platform::Linux)).unwrap_err();
        assert!(matches!(
            err,
            crate::ReleaseError::Matrix(MatrixError::ForeignPlatform { ref platform, ref host })
                if platform == "mac" && host == "linux"
        ));

        // The musl entry cross-compiles, so any host will do
        assert!(matrix.get(Platform::Linux).unwrap().runnable_on(Some(Platform::Mac)));

        let on_windows: Vec<_> = matrix
            .runnable_on(Some(Platform::Windows))
            .into_iter()
            .map(|e| e.platform)
            .collect();
        assert_eq!(on_windows, vec![Platform::Linux, Platform::Windows]);
    }

    #[test]
    fn platform_ids_round_trip_through_from_id() {
        for platform in Platform::ALL {
            assert_eq!(Platform::from_id(platform.id()).unwrap(), platform);
        }
        assert_eq!(Platform::from_id("macos").unwrap(), Platform::Mac);
        assert!(Platform::from_id("beos").is_err());
    }
}
