//! Run a project build outside the editor.

use std::process::Stdio;

use rigbridge_core::Project;
use tokio::process::Command;
use tracing::{error, info};

use crate::config::EngineLayout;
use crate::taxonomy::ErrorCode;

/// Arguments handed to the entry executable for a project.
#[must_use]
pub fn run_args(project: &Project) -> Vec<String> {
    vec![
        "DontCloseCmd".to_string(),
        format!("-uni:{}", project.universe_dir().display()),
        format!("-lib:{}", project.build_dir().display()),
    ]
}

/// Launch the engine's entry executable on the project's last build and
/// leave it running on its own.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
/// - [`ErrorCode::NoExecutableToRun`] if the entry executable is missing
/// - [`ErrorCode::Unknown`] if it cannot be spawned
pub async fn launch_published(project: &Project, engine: &EngineLayout) -> Result<u32, ErrorCode> {
    let exe = engine.entry_exe_path();
    if !exe.is_file() {
        return Err(ErrorCode::NoExecutableToRun);
    }

    let mut command = Command::new(&exe);
    command
        .args(run_args(project))
        .stdin(Stdio::null())
        .kill_on_drop(false);
    if let Some(dir) = exe.parent() {
        command.current_dir(dir);
    }

    let child = command.spawn().map_err(|e| {
        error!(error = %e, exe = %exe.display(), "Failed to launch build");
        ErrorCode::Unknown
    })?;

    let pid = child.id().unwrap_or_default();
    info!(pid, exe = %exe.display(), "Launched build");
    Ok(pid)
}
