//! Immutable description of one build invocation.

use std::path::PathBuf;

use rigbridge_core::Project;

/// What the executor should produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildMode {
    /// Compile the game library into the project's build folder.
    Library,
    /// Compile the library, then bundle a runnable build into `dir`.
    Publish { dir: PathBuf },
}

/// One build request. `project` is `None` when the editor has no project
/// open; the executor reports that as a failure rather than the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRequest {
    pub project: Option<Project>,
    pub mode: BuildMode,
}

impl BuildRequest {
    #[must_use]
    pub const fn library(project: Option<Project>) -> Self {
        Self {
            project,
            mode: BuildMode::Library,
        }
    }

    #[must_use]
    pub fn publish(project: Option<Project>, dir: impl Into<PathBuf>) -> Self {
        Self {
            project,
            mode: BuildMode::Publish { dir: dir.into() },
        }
    }

    #[must_use]
    pub const fn is_publish(&self) -> bool {
        matches!(self.mode, BuildMode::Publish { .. })
    }

    /// Target folder when publishing.
    #[must_use]
    pub fn publish_dir(&self) -> Option<&PathBuf> {
        match &self.mode {
            BuildMode::Publish { dir } => Some(dir),
            BuildMode::Library => None,
        }
    }
}
