//! Shared fixtures: a scripted compiler and an on-disk project skeleton.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rigbridge_build::{Compiler, CompilerInvocation, EngineLayout, LogLine, LogRing};
use rigbridge_core::{Project, ProjectType, UniverseInfo};
use tempfile::TempDir;
use tokio::sync::Notify;

/// Compiler that prints canned lines, optionally writes the files a real
/// compiler would, and can be held open until released.
#[derive(Default)]
pub struct FakeCompiler {
    pub missing: bool,
    pub exit_code: i32,
    pub lines: Vec<LogLine>,
    pub skip_outputs: bool,
    pub panics: bool,
    pub gate: Option<Arc<Notify>>,
    pub calls: Mutex<Vec<CompilerInvocation>>,
}

impl FakeCompiler {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failing(lines: &[&str]) -> Self {
        Self {
            exit_code: 1,
            lines: lines.iter().map(|l| LogLine::stderr(*l)).collect(),
            ..Self::default()
        }
    }

    pub fn invocations(&self) -> Vec<CompilerInvocation> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Compiler for FakeCompiler {
    fn is_available(&self) -> bool {
        !self.missing
    }

    async fn run(&self, invocation: &CompilerInvocation, sink: &LogRing) -> std::io::Result<i32> {
        self.calls.lock().unwrap().push(invocation.clone());
        for line in &self.lines {
            sink.push(line.clone());
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.panics {
            panic!("compiler exploded");
        }
        if self.exit_code == 0 && !self.skip_outputs {
            let output = if let Some(dir) = &invocation.publish_dir {
                dir.join(EngineLayout::published_exe_name(&invocation.assembly_name))
            } else {
                invocation
                    .output_path
                    .join(format!("{}.dll", invocation.assembly_name))
            };
            std::fs::create_dir_all(output.parent().unwrap())?;
            std::fs::write(&output, b"binary")?;
        }
        Ok(self.exit_code)
    }
}

pub fn info(product: &str, developer: &str) -> UniverseInfo {
    UniverseInfo {
        product_name: product.to_string(),
        developer_name: developer.to_string(),
        major_version: 1,
        minor_version: 2,
        patch_version: 3,
        project_type: ProjectType::Game,
        ..UniverseInfo::default()
    }
}

fn touch(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"x").unwrap();
}

/// A project folder with a csproj, one script, package libraries for both
/// configurations and a universe folder.
pub fn project_fixture(dir: &TempDir, info: UniverseInfo) -> Project {
    let root = dir.path().join("Game");
    touch(&root.join("Game.csproj"));
    touch(&root.join("src").join("Player.cs"));
    touch(&root.join("Universe").join("Info.json"));
    for config in ["Debug", "Release"] {
        touch(&root.join("lib").join(config).join("Physics.dll"));
        touch(&root.join("lib").join(config).join("Framework.dll"));
    }
    Project::with_info(root, info)
}

/// An engine folder with the publish entry project in place.
pub fn engine_fixture(dir: &TempDir) -> EngineLayout {
    let layout = EngineLayout::under(dir.path().join("Engine"));
    touch(&layout.entry_csproj_path());
    layout
}

pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

pub fn path_exists(path: impl AsRef<Path>) -> bool {
    PathBuf::from(path.as_ref()).exists()
}
