//! Shared fixtures for session and demo rig tests.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rigbridge::EditorSession;
use rigbridge_build::{
    BackgroundBuildQueue, BuildExecutor, Compiler, CompilerInvocation, EngineLayout, LogLine,
    LogRing,
};
use rigbridge_core::{Project, ProjectType, UniverseInfo};
use rigbridge_ipc::{CallMessage, Color32, RenderView, RespondMessage};
use rigbridge_transceiver::{
    BackoffConfig, LaunchError, LinkError, PreviewRenderer, RenderOptions, RigConfig, RigLauncher,
    RigLink, RigTransceiver,
};
use tempfile::TempDir;
use tokio::runtime::Runtime;
use tokio::sync::Notify;

/// Compiler that prints canned lines and writes the library on success.
#[derive(Default)]
pub struct FakeCompiler {
    pub exit_code: i32,
    pub lines: Vec<LogLine>,
    pub gate: Option<Arc<Notify>>,
}

impl FakeCompiler {
    pub fn failing(lines: &[&str]) -> Self {
        Self {
            exit_code: 1,
            lines: lines.iter().map(|l| LogLine::stderr(*l)).collect(),
            gate: None,
        }
    }

    pub fn gated(gate: &Arc<Notify>) -> Self {
        Self {
            gate: Some(Arc::clone(gate)),
            ..Self::default()
        }
    }
}

#[async_trait]
impl Compiler for FakeCompiler {
    fn is_available(&self) -> bool {
        true
    }

    async fn run(&self, invocation: &CompilerInvocation, sink: &LogRing) -> std::io::Result<i32> {
        for line in &self.lines {
            sink.push(line.clone());
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.exit_code == 0 {
            let output = invocation
                .output_path
                .join(format!("{}.dll", invocation.assembly_name));
            std::fs::create_dir_all(&invocation.output_path)?;
            std::fs::write(output, b"binary")?;
        }
        Ok(self.exit_code)
    }
}

fn touch(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"x").unwrap();
}

pub fn info(project_type: ProjectType) -> UniverseInfo {
    UniverseInfo {
        product_name: "Skyward".to_string(),
        developer_name: "Lantern".to_string(),
        major_version: 1,
        minor_version: 0,
        patch_version: 0,
        project_type,
        ..UniverseInfo::default()
    }
}

/// A project folder with a csproj, one script and a universe folder.
pub fn project_fixture(dir: &TempDir, project_type: ProjectType) -> Project {
    let root = dir.path().join("Game");
    touch(&root.join("Game.csproj"));
    touch(&root.join("src").join("Player.cs"));
    touch(&root.join("Universe").join("Info.json"));
    Project::with_info(root, info(project_type))
}

pub fn engine_fixture(dir: &TempDir) -> EngineLayout {
    let layout = EngineLayout::under(dir.path().join("Engine"));
    touch(&layout.entry_csproj_path());
    layout
}

/// What the scripted rig saw.
#[derive(Debug, Default)]
pub struct RigScript {
    pub launches: Vec<(PathBuf, PathBuf)>,
    pub calls: Vec<CallMessage>,
    pub alive: bool,
    pub next_frame: u64,
    pub kills: usize,
    pub shutdowns: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FakeLauncher {
    pub script: Arc<Mutex<RigScript>>,
}

impl FakeLauncher {
    pub fn launch_count(&self) -> usize {
        self.script.lock().unwrap().launches.len()
    }

    pub fn kill_count(&self) -> usize {
        self.script.lock().unwrap().kills
    }

    pub fn shutdown_count(&self) -> usize {
        self.script.lock().unwrap().shutdowns
    }

    pub fn calls(&self) -> Vec<CallMessage> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn launches(&self) -> Vec<(PathBuf, PathBuf)> {
        self.script.lock().unwrap().launches.clone()
    }
}

impl RigLauncher for FakeLauncher {
    type Link = FakeLink;

    fn launch(&mut self, build: &Path, assets: &Path) -> Result<FakeLink, LaunchError> {
        let mut script = self.script.lock().unwrap();
        script
            .launches
            .push((build.to_path_buf(), assets.to_path_buf()));
        script.alive = true;
        Ok(FakeLink {
            script: Arc::clone(&self.script),
        })
    }
}

#[derive(Debug)]
pub struct FakeLink {
    script: Arc<Mutex<RigScript>>,
}

impl RigLink for FakeLink {
    fn send(&mut self, _seq: u64, call: &CallMessage) -> Result<(), LinkError> {
        self.script.lock().unwrap().calls.push(call.clone());
        Ok(())
    }

    fn await_respond(
        &mut self,
        _seq: u64,
        _timeout: Duration,
    ) -> Result<RespondMessage, LinkError> {
        let mut script = self.script.lock().unwrap();
        script.next_frame += 1;
        Ok(RespondMessage {
            global_frame: script.next_frame,
            sky_top: Color32::new(10, 20, 30, 255),
            ..RespondMessage::default()
        })
    }

    fn is_alive(&mut self) -> bool {
        self.script.lock().unwrap().alive
    }

    fn shutdown(&mut self) {
        let mut script = self.script.lock().unwrap();
        script.shutdowns += 1;
        script.alive = false;
    }

    fn kill(&mut self) {
        let mut script = self.script.lock().unwrap();
        script.kills += 1;
        script.alive = false;
    }
}

/// Records `(global_frame, frozen)` for every frame drawn.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub frames: Vec<(u64, bool)>,
}

impl PreviewRenderer for RecordingRenderer {
    fn render(&mut self, view: RenderView<'_>, options: &RenderOptions) {
        self.frames.push((view.global_frame, options.frozen));
    }
}

pub fn session(
    compiler: FakeCompiler,
    dir: &TempDir,
    runtime: &Runtime,
    launcher: &FakeLauncher,
) -> EditorSession<FakeLauncher> {
    let executor = BuildExecutor::new(Arc::new(compiler), engine_fixture(dir));
    let builds = BackgroundBuildQueue::new(executor, runtime.handle().clone(), 64);
    let rig = RigTransceiver::new(
        launcher.clone(),
        RigConfig::default(),
        BackoffConfig::default(),
    );
    EditorSession::new(builds, rig)
}
