//! The editor's frame loop owner.
//!
//! [`EditorSession`] holds the background build queue, the rig transceiver
//! and the open project, and advances all of them once per
//! [`EditorSession::tick`].

use rigbridge_build::{BackgroundBuildQueue, BuildOutcome, ErrorCode};
use rigbridge_core::{Project, ProjectType, ResultExt};
use rigbridge_transceiver::{
    CallFrame, PreviewRenderer, RenderOptions, RigLauncher, RigTransceiver, TransceiverError,
};
use tracing::{debug, error, info, warn};

use crate::features::{EditorFeatures, LightingParams};

/// What a finished background build means for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildReport {
    Succeeded,
    /// Compiler output, oldest line first.
    CompileErrors(Vec<String>),
    Failed { code: ErrorCode, message: String },
}

impl BuildReport {
    #[must_use]
    pub fn from_outcome(outcome: &BuildOutcome) -> Self {
        match outcome.error() {
            None => Self::Succeeded,
            Some(ErrorCode::UserCodeCompileError) => Self::CompileErrors(
                outcome
                    .compile_errors()
                    .iter()
                    .map(|line| line.text.clone())
                    .collect(),
            ),
            Some(code) => Self::Failed {
                code,
                message: code.to_string(),
            },
        }
    }
}

/// What the rig did this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RigActivity {
    NoProject,
    NotGameProject,
    /// The last build failed to compile; nothing to run.
    CompileError,
    /// A build is running; the rig is down and the preview frozen.
    Building,
    Exchanged { global_frame: u64 },
    /// The rig is up but this tick's exchange failed.
    Stalled { reason: String },
    Started,
    StartFailed { reason: String },
    WaitingToStart { next_frame: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub frame: u64,
    pub build: Option<BuildReport>,
    pub rig: RigActivity,
}

pub struct EditorSession<L: RigLauncher> {
    builds: BackgroundBuildQueue,
    rig: RigTransceiver<L>,
    project: Option<Project>,
    features: EditorFeatures,
    render_options: RenderOptions,
    frame: u64,
    compile_failed: bool,
}

impl<L: RigLauncher> std::fmt::Debug for EditorSession<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("frame", &self.frame)
            .field("project", &self.project.as_ref().map(Project::project_dir))
            .field("builds", &self.builds)
            .field("rig", &self.rig)
            .field("compile_failed", &self.compile_failed)
            .finish_non_exhaustive()
    }
}

impl<L: RigLauncher> EditorSession<L> {
    pub fn new(mut builds: BackgroundBuildQueue, rig: RigTransceiver<L>) -> Self {
        builds.on_completed(|outcome| {
            info!(
                code = outcome.code(),
                source_stamp = outcome.source_stamp,
                "Project built in background"
            );
        });
        Self {
            builds,
            rig,
            project: None,
            features: EditorFeatures::default(),
            render_options: RenderOptions::default(),
            frame: 0,
            compile_failed: false,
        }
    }

    /// Switch to `project`, stopping any rig of the previous one. The
    /// project's saved light map becomes the current lighting.
    pub fn open_project(&mut self, project: Option<Project>) {
        self.rig.abort();
        self.rig.reset_backoff();
        self.compile_failed = false;
        if let Some(project) = &project {
            info!(project = %project.project_dir().display(), "Project opened");
            let lighting = LightingParams {
                forced_daytime: self.features.lighting().forced_daytime,
                ..LightingParams::from(&project.info().light_map)
            };
            self.features.set_lighting(lighting);
        }
        self.features.mark_all_changed();
        self.project = project;
    }

    /// Change the lighting; the rig gets it on the next exchange and a
    /// changed light map is saved to the project's `Info.json`.
    pub fn set_lighting(&mut self, lighting: LightingParams) {
        self.features.set_lighting(lighting);
        let Some(project) = &mut self.project else {
            return;
        };
        let light_map = lighting.light_map();
        if project.info().light_map == light_map {
            return;
        }
        project.set_light_map(light_map);
        if project.save_info().ok_logged("save the light map").is_some() {
            debug!(path = %project.info_path().display(), "Light map saved");
        }
    }

    /// Advance one editor frame.
    pub fn tick(&mut self, input: &CallFrame, renderer: &mut dyn PreviewRenderer) -> TickReport {
        self.frame = self.frame.saturating_add(1);
        let build = self.report_build();
        let rig = self.drive_rig(input, renderer);
        TickReport {
            frame: self.frame,
            build,
            rig,
        }
    }

    fn poll_build(&mut self) -> Option<BuildOutcome> {
        self.builds.poll()?;
        self.builds.take_completed()
    }

    fn drive_rig(&mut self, input: &CallFrame, renderer: &mut dyn PreviewRenderer) -> RigActivity {
        let project_type = self.project.as_ref().map(|p| p.info().project_type);
        match project_type {
            None => {
                self.rig.abort();
                return RigActivity::NoProject;
            }
            Some(ProjectType::Artwork) => {
                self.rig.abort();
                return RigActivity::NotGameProject;
            }
            Some(ProjectType::Game) => {}
        }

        if self.builds.is_building() {
            if self.rig.is_running() {
                info!("Stopping rig while the project rebuilds");
                self.rig.abort();
            }
            self.render_frozen(renderer);
            return RigActivity::Building;
        }

        if self.compile_failed {
            self.render_frozen(renderer);
            return RigActivity::CompileError;
        }

        if self.rig.is_running() {
            return self.exchange(input, renderer);
        }

        self.try_start(renderer)
    }

    fn exchange(&mut self, input: &CallFrame, renderer: &mut dyn PreviewRenderer) -> RigActivity {
        self.features.flush(self.rig.settings_mut());
        let called = self.rig.call(input);
        let result = called.and_then(|()| {
            self.rig
                .respond(Some(&mut *renderer), &self.render_options)
                .map(|respond| respond.global_frame)
        });
        match result {
            Ok(global_frame) => RigActivity::Exchanged { global_frame },
            Err(err) => {
                debug!(error = %err, "No respond from rig this frame");
                self.render_frozen(renderer);
                RigActivity::Stalled {
                    reason: err.to_string(),
                }
            }
        }
    }

    fn try_start(&mut self, renderer: &mut dyn PreviewRenderer) -> RigActivity {
        let Some(project) = &self.project else {
            return RigActivity::NoProject;
        };
        let build = project.build_dir();
        let universe = project.universe_dir();

        let activity = match self.rig.start(self.frame, &build, &universe) {
            Ok(()) => {
                self.features.mark_all_changed();
                RigActivity::Started
            }
            Err(TransceiverError::BackoffPending { next_frame }) => {
                RigActivity::WaitingToStart { next_frame }
            }
            Err(err) => {
                warn!(error = %err, fail_count = self.rig.fail_count(), "Rig did not start");
                RigActivity::StartFailed {
                    reason: err.to_string(),
                }
            }
        };
        self.render_frozen(renderer);
        activity
    }

    fn render_frozen(&self, renderer: &mut dyn PreviewRenderer) {
        let options = RenderOptions {
            frozen: true,
            ..self.render_options
        };
        self.rig.update_last_responded_render(renderer, &options);
    }

    /// Queue a background build when the scripts changed since the last
    /// build. Returns whether a build was started.
    pub fn request_rebuild_if_stale(&mut self) -> bool {
        let Some(project) = &self.project else {
            return false;
        };
        if self.builds.is_building() {
            return false;
        }
        let stamp = project.script_modify_stamp();
        let built = self
            .builds
            .last_source_stamp()
            .max(project.build_library_modify_stamp());
        if stamp <= built {
            return false;
        }
        let accepted = self.builds.submit(Some(project.clone()), stamp);
        if accepted {
            self.rig.abort();
        }
        accepted
    }

    fn report_build(&mut self) -> Option<BuildReport> {
        let outcome = self.poll_build()?;
        Some(self.apply_build(&outcome))
    }

    fn apply_build(&mut self, outcome: &BuildOutcome) -> BuildReport {
        let report = BuildReport::from_outcome(outcome);
        self.compile_failed = !outcome.is_success();
        match &report {
            BuildReport::Succeeded => {
                self.rig.reset_backoff();
                self.features.mark_all_changed();
            }
            BuildReport::CompileErrors(lines) => {
                for line in lines {
                    error!(target: "compile", "{line}");
                }
            }
            BuildReport::Failed { message, .. } => error!("{message}"),
        }
        report
    }

    /// Quit the rig; call once when the editor closes.
    pub fn shutdown(&mut self) {
        self.rig.quit();
        info!(frames = self.frame, "Editor session closed");
    }

    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    #[must_use]
    pub const fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    #[must_use]
    pub const fn has_compile_error(&self) -> bool {
        self.compile_failed
    }

    #[must_use]
    pub const fn builds(&self) -> &BackgroundBuildQueue {
        &self.builds
    }

    #[must_use]
    pub const fn rig(&self) -> &RigTransceiver<L> {
        &self.rig
    }

    pub fn rig_mut(&mut self) -> &mut RigTransceiver<L> {
        &mut self.rig
    }

    pub fn features_mut(&mut self) -> &mut EditorFeatures {
        &mut self.features
    }

    pub fn set_render_options(&mut self, options: RenderOptions) {
        self.render_options = options;
    }
}
