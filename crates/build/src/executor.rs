//! Validate, compile and copy: one complete project build.
//!
//! Preconditions are checked in a fixed order and the first failure wins
//! before anything on disk is touched. After validation every step runs in
//! sequence and stops at the first unrecoverable error; partially copied
//! files are left for the next build's folder deletion.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rigbridge_core::{Project, fs};
use tracing::{debug, error, info, warn};

use crate::compiler::{Compiler, CompilerInvocation};
use crate::config::EngineLayout;
use crate::log_ring::{LogLine, LogRing};
use crate::request::BuildRequest;
use crate::taxonomy::ErrorCode;

/// Files a successful build produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildArtifacts {
    /// Game library inside the project's build folder.
    pub library: PathBuf,
    /// Package libraries copied next to it.
    pub package_libraries: Vec<PathBuf>,
    /// Published executable, when publishing.
    pub published_exe: Option<PathBuf>,
}

/// Result of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub result: Result<BuildArtifacts, ErrorCode>,
    /// Compiler lines, kept only for [`ErrorCode::UserCodeCompileError`].
    pub log: Vec<LogLine>,
    /// Source modification stamp the build was started for (0 if unknown).
    pub source_stamp: i64,
}

impl BuildOutcome {
    #[must_use]
    pub const fn failed(code: ErrorCode) -> Self {
        Self {
            result: Err(code),
            log: Vec::new(),
            source_stamp: 0,
        }
    }

    /// `0` on success, otherwise the taxonomy value.
    #[must_use]
    pub const fn code(&self) -> i32 {
        ErrorCode::code_of(&self.result)
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    #[must_use]
    pub fn error(&self) -> Option<ErrorCode> {
        match self.result {
            Ok(_) => None,
            Err(code) => Some(code),
        }
    }

    /// Compiler lines to show the user; empty unless user code failed to
    /// compile.
    #[must_use]
    pub fn compile_errors(&self) -> &[LogLine] {
        match self.result {
            Err(ErrorCode::UserCodeCompileError) => &self.log,
            _ => &[],
        }
    }
}

/// Runs builds against one engine install.
#[derive(Clone)]
pub struct BuildExecutor {
    compiler: Arc<dyn Compiler>,
    engine: EngineLayout,
}

impl std::fmt::Debug for BuildExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildExecutor")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl BuildExecutor {
    pub fn new(compiler: Arc<dyn Compiler>, engine: EngineLayout) -> Self {
        Self { compiler, engine }
    }

    #[must_use]
    pub const fn engine(&self) -> &EngineLayout {
        &self.engine
    }

    /// Check every precondition of `request` without side effects.
    ///
    /// # Errors
    /// The first failing precondition, in this order: project present,
    /// developer name, project folder path, project folder exists, csproj
    /// exists, compiler toolchain, product name, then for publishing the
    /// publish folder path and the entry project.
    pub fn validate<'a>(&self, request: &'a BuildRequest) -> Result<&'a Project, ErrorCode> {
        let project = request
            .project
            .as_ref()
            .ok_or(ErrorCode::ProjectObjectNull)?;
        let info = project.info();

        if !fs::is_valid_file_name(&info.developer_name) {
            return Err(ErrorCode::DeveloperNameInvalid);
        }
        if !fs::is_path_valid(project.project_dir()) {
            return Err(ErrorCode::ProjectFolderInvalid);
        }
        if !project.project_dir().is_dir() {
            return Err(ErrorCode::ProjectFolderMissing);
        }
        if !project.csproj_path().is_file() {
            return Err(ErrorCode::CsprojMissing);
        }
        if !self.compiler.is_available() {
            return Err(ErrorCode::CompilerToolchainMissing);
        }
        if !fs::is_valid_file_name(&info.product_name) {
            return Err(ErrorCode::ProductNameInvalid);
        }
        if let Some(dir) = request.publish_dir() {
            if !fs::is_path_valid(dir) {
                return Err(ErrorCode::PublishDirInvalid);
            }
            if !self.engine.entry_project_dir().is_dir() || !self.engine.entry_csproj_path().is_file()
            {
                return Err(ErrorCode::EntryProjectMissing);
            }
        }

        Ok(project)
    }

    /// Build (and optionally publish) the requested project.
    ///
    /// Compiler output is pushed into `log` as it is emitted; when user code
    /// fails to compile the outcome carries a copy of it.
    pub async fn build(&self, request: &BuildRequest, log: &LogRing) -> BuildOutcome {
        let result = match self.validate(request) {
            Ok(project) => self.run(project, request.publish_dir(), log).await,
            Err(code) => Err(code),
        };

        match &result {
            Ok(artifacts) => info!(library = %artifacts.library.display(), "Build succeeded"),
            Err(code) => warn!(code = code.code(), "{code}"),
        }

        let log = if matches!(result, Err(ErrorCode::UserCodeCompileError)) {
            log.snapshot()
        } else {
            Vec::new()
        };

        BuildOutcome {
            result,
            log,
            source_stamp: 0,
        }
    }

    async fn run(
        &self,
        project: &Project,
        publish_dir: Option<&PathBuf>,
        log: &LogRing,
    ) -> Result<BuildArtifacts, ErrorCode> {
        let info = project.info();
        let version = info.version().to_string();
        let library_name = project.library_name();
        let build_dir = project.build_dir();
        let temp_build = project.temp_build_dir();
        let publishing = publish_dir.is_some();

        step(fs::delete_dir(&build_dir), "delete build folder")?;

        let library = CompilerInvocation {
            working_dir: project.project_dir().to_path_buf(),
            csproj: project.csproj_path(),
            publish: false,
            debug: !publishing,
            assembly_name: library_name.clone(),
            version: version.clone(),
            output_path: temp_build.clone(),
            publish_dir: None,
            icon: None,
        };
        self.compile(&library, log).await?;

        let library_file = format!("{library_name}.dll");
        let result_library = temp_build.join(&library_file);
        if !result_library.is_file() {
            return Err(ErrorCode::ResultLibraryMissing);
        }

        let built_library = build_dir.join(&library_file);
        step(fs::copy_file(&result_library, &built_library), "copy game library")?;
        let package_libraries =
            self.copy_package_libraries(&project.library_dir(true), &build_dir)?;

        let mut artifacts = BuildArtifacts {
            library: built_library,
            package_libraries,
            published_exe: None,
        };

        if let Some(dir) = publish_dir {
            artifacts.published_exe = Some(self.publish(project, dir, &artifacts.library, log).await?);
        }

        step(fs::delete_dir(&project.temp_root()), "delete temp folder")?;
        Ok(artifacts)
    }

    async fn publish(
        &self,
        project: &Project,
        dir: &Path,
        built_library: &Path,
        log: &LogRing,
    ) -> Result<PathBuf, ErrorCode> {
        let info = project.info();
        let temp_publish = project.temp_publish_dir();
        let icon = project.icon_path();

        let entry = CompilerInvocation {
            working_dir: self.engine.entry_project_dir(),
            csproj: self.engine.entry_csproj_path(),
            publish: true,
            debug: false,
            assembly_name: info.product_name.clone(),
            version: info.version().to_string(),
            output_path: project.temp_build_dir(),
            publish_dir: Some(temp_publish.clone()),
            icon: icon.is_file().then_some(icon),
        };
        self.compile(&entry, log).await?;

        let exe_name = EngineLayout::published_exe_name(&info.product_name);
        let result_exe = temp_publish.join(&exe_name);
        if !result_exe.is_file() {
            return Err(ErrorCode::EntryResultMissing);
        }
        let published_exe = dir.join(&exe_name);
        step(fs::copy_file(&result_exe, &published_exe), "copy entry executable")?;

        if !built_library.is_file() {
            return Err(ErrorCode::ResultLibraryMissing);
        }
        let library_root = dir.join("Library");
        step(
            fs::copy_file(built_library, &library_root.join(fs::file_name_of(built_library))),
            "copy game library to publish folder",
        )?;
        self.copy_package_libraries(&project.library_dir(false), &library_root)?;

        let universe = project.universe_dir();
        if !universe.is_dir() {
            return Err(ErrorCode::AssetUniverseMissing);
        }
        step(
            fs::copy_tree(&universe, &dir.join("Universe")),
            "copy universe to publish folder",
        )?;

        info!(dir = %dir.display(), "Published project");
        Ok(published_exe)
    }

    async fn compile(&self, invocation: &CompilerInvocation, log: &LogRing) -> Result<(), ErrorCode> {
        match self.compiler.run(invocation, log).await {
            Ok(0) => Ok(()),
            Ok(exit_code) => {
                debug!(exit_code, csproj = %invocation.csproj.display(), "Compiler failed");
                Err(ErrorCode::UserCodeCompileError)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                error!(error = %e, "Compiler executable vanished");
                Err(ErrorCode::CompilerToolchainMissing)
            }
            Err(e) => {
                error!(error = %e, "Failed to run compiler");
                Err(ErrorCode::Unknown)
            }
        }
    }

    fn copy_package_libraries(&self, from: &Path, to: &Path) -> Result<Vec<PathBuf>, ErrorCode> {
        let found = step(fs::find_files(from, "*.dll", true), "list package libraries")?;
        let mut copied = Vec::with_capacity(found.len());
        for library in found {
            let name = fs::file_name_of(&library);
            if name == self.engine.framework_library {
                continue;
            }
            let target = to.join(&name);
            step(fs::copy_file(&library, &target), "copy package library")?;
            copied.push(target);
        }
        Ok(copied)
    }
}

fn step<T>(result: rigbridge_core::Result<T>, what: &str) -> Result<T, ErrorCode> {
    result.map_err(|e| {
        error!(error = %e, "Build step failed: {what}");
        ErrorCode::Unknown
    })
}
