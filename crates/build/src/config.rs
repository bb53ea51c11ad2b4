//! Engine install layout and build tuning.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

fn exe(name: &str) -> String {
    format!("{name}{}", std::env::consts::EXE_SUFFIX)
}

/// Where the engine keeps its toolchain, runtimes and entry template.
///
/// Every path except `root` is relative to `root` unless absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineLayout {
    pub root: PathBuf,
    /// Compiler SDK executable.
    pub sdk: PathBuf,
    /// Folder of the entry project used for publishing.
    pub entry_project: PathBuf,
    /// File name of the entry project's csproj inside `entry_project`.
    pub entry_csproj: String,
    /// Rig executable launched for live preview.
    pub rig_exe: PathBuf,
    /// Entry executable used to run a build outside the editor.
    pub entry_exe: PathBuf,
    /// Package library never copied into a build (the engine ships its own).
    pub framework_library: String,
}

impl Default for EngineLayout {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            sdk: Path::new("dotnet").join(exe("dotnet")),
            entry_project: Path::new("Runtime").join("Release"),
            entry_csproj: "Entry for Publish.csproj".to_string(),
            rig_exe: Path::new("Runtime").join("Debug").join(exe("Rigged")),
            entry_exe: Path::new("Runtime").join("Debug").join(exe("Entry")),
            framework_library: "Framework.dll".to_string(),
        }
    }
}

impl EngineLayout {
    /// Default layout under `root`.
    #[must_use]
    pub fn under(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    #[must_use]
    pub fn sdk_path(&self) -> PathBuf {
        self.resolve(&self.sdk)
    }

    #[must_use]
    pub fn entry_project_dir(&self) -> PathBuf {
        self.resolve(&self.entry_project)
    }

    #[must_use]
    pub fn entry_csproj_path(&self) -> PathBuf {
        self.entry_project_dir().join(&self.entry_csproj)
    }

    #[must_use]
    pub fn rig_exe_path(&self) -> PathBuf {
        self.resolve(&self.rig_exe)
    }

    #[must_use]
    pub fn entry_exe_path(&self) -> PathBuf {
        self.resolve(&self.entry_exe)
    }

    /// File name of the published executable for a product.
    #[must_use]
    pub fn published_exe_name(product_name: &str) -> String {
        exe(product_name)
    }
}

/// Build tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Seconds a single compiler run may take before it is killed.
    pub compile_timeout_secs: u64,
    /// Compiler lines kept for the background build report.
    pub log_capacity: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            compile_timeout_secs: 30,
            log_capacity: 32,
        }
    }
}

impl BuildConfig {
    #[must_use]
    pub const fn compile_timeout(&self) -> Duration {
        Duration::from_secs(self.compile_timeout_secs)
    }
}
