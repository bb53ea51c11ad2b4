//! Scripted rig process for transceiver tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rigbridge_ipc::{CallMessage, Color32, RenderView, RespondMessage};
use rigbridge_transceiver::{
    BackoffConfig, LaunchError, LinkError, PreviewRenderer, RenderOptions, RigConfig, RigLauncher,
    RigLink, RigTransceiver,
};

/// Everything the fake rig saw and what it should do next.
#[derive(Debug, Default)]
pub struct Script {
    pub fail_launch: bool,
    pub attempts: usize,
    pub launches: Vec<(PathBuf, PathBuf)>,
    pub alive: bool,
    /// Scripted answers to `await_respond`, used before generated ones.
    pub replies: VecDeque<Result<RespondMessage, LinkError>>,
    pub calls: Vec<(u64, CallMessage)>,
    pub next_frame: u64,
    pub kills: usize,
    pub shutdowns: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FakeLauncher {
    pub script: Arc<Mutex<Script>>,
}

impl FakeLauncher {
    pub fn failing() -> Self {
        let launcher = Self::default();
        launcher.script.lock().unwrap().fail_launch = true;
        launcher
    }

    pub fn set_failing(&self, failing: bool) {
        self.script.lock().unwrap().fail_launch = failing;
    }

    pub fn launch_count(&self) -> usize {
        self.script.lock().unwrap().launches.len()
    }

    pub fn attempt_count(&self) -> usize {
        self.script.lock().unwrap().attempts
    }

    pub fn shutdown_count(&self) -> usize {
        self.script.lock().unwrap().shutdowns
    }

    pub fn kill_count(&self) -> usize {
        self.script.lock().unwrap().kills
    }

    pub fn set_alive(&self, alive: bool) {
        self.script.lock().unwrap().alive = alive;
    }

    pub fn queue_reply(&self, reply: Result<RespondMessage, LinkError>) {
        self.script.lock().unwrap().replies.push_back(reply);
    }

    pub fn calls(&self) -> Vec<(u64, CallMessage)> {
        self.script.lock().unwrap().calls.clone()
    }
}

impl RigLauncher for FakeLauncher {
    type Link = FakeLink;

    fn launch(&mut self, build: &Path, assets: &Path) -> Result<FakeLink, LaunchError> {
        let mut script = self.script.lock().unwrap();
        script.attempts += 1;
        if script.fail_launch {
            return Err(LaunchError::spawn_failed("scripted failure"));
        }
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
    script: Arc<Mutex<Script>>,
}

impl RigLink for FakeLink {
    fn send(&mut self, seq: u64, call: &CallMessage) -> Result<(), LinkError> {
        self.script.lock().unwrap().calls.push((seq, call.clone()));
        Ok(())
    }

    fn await_respond(
        &mut self,
        _seq: u64,
        _timeout: Duration,
    ) -> Result<RespondMessage, LinkError> {
        let mut script = self.script.lock().unwrap();
        if let Some(reply) = script.replies.pop_front() {
            return reply;
        }
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

/// Keeps the render-relevant parts of every view it is handed.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub frames: Vec<RenderedFrame>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFrame {
    pub global_frame: u64,
    pub sky_top: Color32,
    pub sky_bottom: Color32,
    pub gizmo_rects: usize,
    pub cursor_index: Option<i32>,
    pub frozen: bool,
}

impl PreviewRenderer for RecordingRenderer {
    fn render(&mut self, view: RenderView<'_>, options: &RenderOptions) {
        self.frames.push(RenderedFrame {
            global_frame: view.global_frame,
            sky_top: view.sky_top,
            sky_bottom: view.sky_bottom,
            gizmo_rects: view.gizmo_rects.len(),
            cursor_index: view.cursor_index,
            frozen: options.frozen,
        });
    }
}

pub fn transceiver(launcher: &FakeLauncher) -> RigTransceiver<FakeLauncher> {
    RigTransceiver::new(
        launcher.clone(),
        RigConfig::default(),
        BackoffConfig::default(),
    )
}

pub fn build_dir() -> &'static Path {
    Path::new("/project/Build")
}

pub fn universe_dir() -> &'static Path {
    Path::new("/project/Universe")
}
