//! External compiler seam.
//!
//! The executor only needs an exit code and the lines the compiler printed;
//! [`DotnetCompiler`] gets both from the SDK executable through
//! `tokio::process`.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::log_ring::{LogLine, LogRing};

/// Exit code reported for a compiler run that was killed on timeout.
pub const TIMED_OUT_EXIT_CODE: i32 = -1;

/// Arguments for one compiler run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerInvocation {
    /// Working directory of the compiler process.
    pub working_dir: PathBuf,
    pub csproj: PathBuf,
    /// `publish` instead of `build`.
    pub publish: bool,
    pub debug: bool,
    pub assembly_name: String,
    pub version: String,
    pub output_path: PathBuf,
    pub publish_dir: Option<PathBuf>,
    /// Only set when the icon file exists.
    pub icon: Option<PathBuf>,
}

impl CompilerInvocation {
    /// Command-line arguments after the SDK executable.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            if self.publish { "publish" } else { "build" }.to_string(),
            self.csproj.display().to_string(),
            "-c".to_string(),
            if self.debug { "debug" } else { "release" }.to_string(),
            "--no-dependencies".to_string(),
        ];

        if !self.assembly_name.trim().is_empty() {
            args.push(format!("-p:AssemblyName={}", self.assembly_name));
        }
        if !self.version.trim().is_empty() {
            args.push(format!("-p:Version={}", self.version));
        }
        if !self.output_path.as_os_str().is_empty() {
            args.push(format!("-p:OutputPath={}", self.output_path.display()));
        }
        if let Some(dir) = &self.publish_dir {
            args.push(format!("-p:PublishDir={}", dir.display()));
        }
        if let Some(icon) = &self.icon {
            args.push(format!("-p:ApplicationIcon={}", icon.display()));
        }

        args
    }
}

/// Something that can compile a csproj.
#[async_trait]
pub trait Compiler: Send + Sync {
    /// Whether the toolchain is installed.
    fn is_available(&self) -> bool;

    /// Run one compilation, pushing every output line into `sink` in the
    /// order it was emitted. Returns the compiler's exit code.
    ///
    /// # Errors
    /// The compiler process could not be spawned or awaited.
    async fn run(&self, invocation: &CompilerInvocation, sink: &LogRing) -> std::io::Result<i32>;
}

/// The .NET SDK shipped inside the engine folder.
#[derive(Debug, Clone)]
pub struct DotnetCompiler {
    sdk_path: PathBuf,
    timeout: Duration,
}

impl DotnetCompiler {
    #[must_use]
    pub fn new(sdk_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            sdk_path: sdk_path.into(),
            timeout,
        }
    }

    #[must_use]
    pub fn sdk_path(&self) -> &Path {
        &self.sdk_path
    }
}

#[async_trait]
impl Compiler for DotnetCompiler {
    fn is_available(&self) -> bool {
        self.sdk_path.is_file()
    }

    async fn run(&self, invocation: &CompilerInvocation, sink: &LogRing) -> std::io::Result<i32> {
        let args = invocation.to_args();
        debug!(sdk = %self.sdk_path.display(), ?args, "Running compiler");

        let mut child = Command::new(&self.sdk_path)
            .args(&args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let pump = async {
            let mut out = stdout.map(|s| BufReader::new(s).lines());
            let mut err = stderr.map(|s| BufReader::new(s).lines());

            loop {
                tokio::select! {
                    line = next_line(&mut out), if out.is_some() => match line {
                        Some(text) => sink.push(LogLine::stdout(text)),
                        None => out = None,
                    },
                    line = next_line(&mut err), if err.is_some() => match line {
                        Some(text) => sink.push(LogLine::stderr(text)),
                        None => err = None,
                    },
                    else => break,
                }
            }

            child.wait().await
        };

        let waited = tokio::time::timeout(self.timeout, pump).await;
        match waited {
            Ok(status) => Ok(status?.code().unwrap_or(TIMED_OUT_EXIT_CODE)),
            Err(_) => {
                warn!(timeout = ?self.timeout, "Compiler timed out, killing it");
                child.start_kill().ok();
                Ok(TIMED_OUT_EXIT_CODE)
            }
        }
    }
}

async fn next_line<R>(lines: &mut Option<tokio::io::Lines<BufReader<R>>>) -> Option<String>
where
    R: tokio::io::AsyncRead + Unpin,
{
    match lines {
        Some(lines) => lines.next_line().await.ok().flatten(),
        None => None,
    }
}
