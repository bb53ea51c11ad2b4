//! CLI command handlers.
//!
//! Build failures are returned as [`ErrorCode`] errors so the binary can
//! turn them into distinct exit codes.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use rigbridge_build::{
    BackgroundBuildQueue, BuildExecutor, BuildOutcome, BuildRequest, DotnetCompiler, ErrorCode,
    LogRing, launch_published,
};
use rigbridge_core::Project;
use rigbridge_transceiver::{CallFrame, ProcessLauncher, RigTransceiver};
use tokio::runtime::Runtime;
use tokio::signal;
use tracing::{error, info};

use crate::cli::{Cli, Commands};
use crate::config::{BridgeConfig, load_config};
use crate::preview::LoggingRenderer;
use crate::session::{BuildReport, EditorSession};

/// Execute a CLI command.
///
/// # Errors
/// Whatever the command fails with; build failures carry their
/// [`ErrorCode`].
pub fn execute_command(cli: Cli, runtime: &Runtime) -> Result<()> {
    let config = load_config(Some(cli.project.as_path()), cli.config.as_deref())
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Build => cmd_build(&cli.project, &config, runtime, None),
        Commands::Publish { out } => cmd_build(&cli.project, &config, runtime, Some(out)),
        Commands::Run => cmd_run(&cli.project, &config, runtime),
        Commands::Preview { frames, fps } => {
            cmd_preview(&cli.project, &config, runtime, frames, fps)
        }
        Commands::Config => cmd_config(&config),
    }
}

/// Process exit code for an error: the magnitude of its taxonomy code, or
/// 1 for anything else.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<ErrorCode>()
        .and_then(|code| u8::try_from(code.code().unsigned_abs()).ok())
        .unwrap_or(1)
}

fn open_project(root: &Path) -> Result<Project> {
    Project::open(root).with_context(|| format!("Failed to open project at {}", root.display()))
}

fn executor(config: &BridgeConfig) -> BuildExecutor {
    let compiler = DotnetCompiler::new(config.engine.sdk_path(), config.build.compile_timeout());
    BuildExecutor::new(Arc::new(compiler), config.engine.clone())
}

fn cmd_build(
    root: &Path,
    config: &BridgeConfig,
    runtime: &Runtime,
    publish: Option<PathBuf>,
) -> Result<()> {
    let project = open_project(root)?;
    info!(
        product = %project.info().product_name,
        publish = publish.is_some(),
        "Building project"
    );

    let request = match publish {
        Some(dir) => BuildRequest::publish(Some(project), dir),
        None => BuildRequest::library(Some(project)),
    };
    let log = LogRing::new(config.build.log_capacity);
    let outcome = runtime.block_on(executor(config).build(&request, &log));
    report_outcome(&outcome)
}

fn report_outcome(outcome: &BuildOutcome) -> Result<()> {
    match BuildReport::from_outcome(outcome) {
        BuildReport::Succeeded => {
            if let Ok(artifacts) = &outcome.result {
                info!(
                    library = %artifacts.library.display(),
                    packages = artifacts.package_libraries.len(),
                    "Build succeeded"
                );
                if let Some(exe) = &artifacts.published_exe {
                    info!(exe = %exe.display(), "Published");
                }
            }
            Ok(())
        }
        BuildReport::CompileErrors(lines) => {
            for line in &lines {
                error!(target: "compile", "{line}");
            }
            Err(anyhow::Error::new(ErrorCode::UserCodeCompileError))
        }
        BuildReport::Failed { code, .. } => Err(anyhow::Error::new(code)),
    }
}

fn cmd_run(root: &Path, config: &BridgeConfig, runtime: &Runtime) -> Result<()> {
    let project = open_project(root)?;
    let pid = runtime
        .block_on(launch_published(&project, &config.engine))
        .map_err(anyhow::Error::new)?;
    info!(pid, "Project running");
    Ok(())
}

fn ctrl_c_flag(runtime: &Runtime) -> Arc<AtomicBool> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    runtime.spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, stopping preview");
                flag.store(true, Ordering::Release);
            }
            Err(err) => error!("Failed to listen for shutdown signal: {}", err),
        }
    });
    stop
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn cmd_preview(
    root: &Path,
    config: &BridgeConfig,
    runtime: &Runtime,
    frames: Option<u64>,
    fps: f64,
) -> Result<()> {
    if !(fps.is_finite() && fps > 0.0) {
        bail!("--fps must be a positive number, got {fps}");
    }
    let project = open_project(root)?;

    let builds = BackgroundBuildQueue::new(
        executor(config),
        runtime.handle().clone(),
        config.build.log_capacity,
    );
    let launcher = ProcessLauncher::new(
        config.engine.rig_exe_path(),
        config.rig.clone(),
        runtime.handle().clone(),
    );
    let rig = RigTransceiver::new(launcher, config.rig.clone(), config.backoff);
    let mut session = EditorSession::new(builds, rig);
    session.open_project(Some(project));

    let stop = ctrl_c_flag(runtime);
    let frame_time = Duration::try_from_secs_f64(fps.recip()).context("--fps is too small")?;
    let mut renderer = LoggingRenderer::new(fps.round().max(1.0) as u64);
    let input = CallFrame {
        screen_width: 1920,
        screen_height: 1080,
        monitor_width: 1920,
        monitor_height: 1080,
        ..CallFrame::default()
    };

    info!(fps, frames, "Preview started");
    let mut last_activity = None;
    while !stop.load(Ordering::Acquire) && frames.is_none_or(|max| session.frame() < max) {
        let started = Instant::now();
        session.request_rebuild_if_stale();
        let report = session.tick(&input, &mut renderer);

        match &report.build {
            Some(BuildReport::Succeeded) => info!(frame = report.frame, "Rebuilt project"),
            Some(BuildReport::CompileErrors(lines)) => {
                error!(frame = report.frame, lines = lines.len(), "Project has compile errors");
            }
            Some(BuildReport::Failed { message, .. }) => error!(frame = report.frame, "{message}"),
            None => {}
        }
        let activity = std::mem::discriminant(&report.rig);
        if last_activity != Some(activity) {
            info!(frame = report.frame, rig = ?report.rig, "Rig activity changed");
            last_activity = Some(activity);
        }

        std::thread::sleep(frame_time.saturating_sub(started.elapsed()));
    }

    session.shutdown();
    info!(
        frames = renderer.frames(),
        frozen = renderer.frozen_frames(),
        "Preview finished"
    );
    Ok(())
}

fn cmd_config(config: &BridgeConfig) -> Result<()> {
    let text = config.to_toml().context("Failed to render configuration")?;
    println!("{text}");
    Ok(())
}
