//! Process seam: launching a rig and exchanging frames with it.
//!
//! [`ProcessLauncher`] spawns the rig through `tokio::process`. A writer
//! task owns the rig's stdin and always finishes the frame it started, and
//! a reader task decodes respond frames from stdout into a channel. Waiting
//! for a respond can therefore give up after a timeout without leaving half
//! a frame in either pipe; late responds are recognised by their sequence
//! number and discarded. The rig's stderr is forwarded to `tracing` under
//! target `rig`.
//!
//! The synchronous [`RigLink`] methods drive the runtime with
//! `Handle::block_on` and must not be called from inside an async context.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use rigbridge_ipc::{
    CallMessage, Envelope, LENGTH_PREFIX_SIZE, RespondMessage, TransportError, TransportResult,
    decode_payload, encode_frame, validate_length,
};
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::process::{Child, ChildStderr, Command};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::RigConfig;
use crate::error::{LaunchError, LinkError};

/// Argument that keeps the rig's console window open.
pub const KEEP_CONSOLE_ARG: &str = "DontCloseCmd";

/// How long a quitting rig gets to exit on its own before it is killed.
const QUIT_GRACE: Duration = Duration::from_millis(500);

/// One live connection to a running rig.
///
/// A call goes out with [`RigLink::send`]; its respond is collected with
/// [`RigLink::await_respond`], possibly over several attempts. The caller
/// sends the next call only once the previous one was answered.
pub trait RigLink {
    /// Hand `call` tagged `seq` to the rig without waiting for a respond.
    ///
    /// # Errors
    /// The call could not be encoded or the rig's input is closed.
    fn send(&mut self, seq: u64, call: &CallMessage) -> Result<(), LinkError>;

    /// Wait up to `timeout` for the respond tagged `seq`.
    ///
    /// # Errors
    /// [`LinkError::Timeout`] when nothing matching arrived in time, other
    /// variants when the rig is gone or spoke garbage.
    fn await_respond(&mut self, seq: u64, timeout: Duration)
    -> Result<RespondMessage, LinkError>;

    /// Whether the rig process is still alive.
    fn is_alive(&mut self) -> bool;

    /// Ask the rig to quit, then make sure it is gone.
    fn shutdown(&mut self);

    /// Terminate the rig immediately.
    fn kill(&mut self);
}

/// Something that can start a rig.
pub trait RigLauncher {
    type Link: RigLink;

    /// Start a rig for the library folder `build` and asset folder `assets`.
    ///
    /// # Errors
    /// The rig could not be started.
    fn launch(&mut self, build: &Path, assets: &Path) -> Result<Self::Link, LaunchError>;
}

/// Launches the rig executable as a child process.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    exe: PathBuf,
    config: RigConfig,
    runtime: Handle,
}

impl ProcessLauncher {
    #[must_use]
    pub fn new(exe: impl Into<PathBuf>, config: RigConfig, runtime: Handle) -> Self {
        Self {
            exe: exe.into(),
            config,
            runtime,
        }
    }

    /// Command-line arguments for a rig on `build` / `assets`.
    #[must_use]
    pub fn args(&self, build: &Path, assets: &Path) -> Vec<String> {
        let mut args = vec![build.display().to_string(), assets.display().to_string()];
        if self.config.keep_console {
            args.push(KEEP_CONSOLE_ARG.to_string());
        }
        args
    }
}

impl RigLauncher for ProcessLauncher {
    type Link = ProcessLink;

    fn launch(&mut self, build: &Path, assets: &Path) -> Result<ProcessLink, LaunchError> {
        if !self.exe.is_file() {
            return Err(LaunchError::ExecutableMissing {
                path: self.exe.clone(),
            });
        }

        let _guard = self.runtime.enter();
        let mut command = Command::new(&self.exe);
        command
            .args(self.args(build, assets))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = self.exe.parent() {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .map_err(|e| LaunchError::spawn_failed(e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or(LaunchError::PipeUnavailable { pipe: "stdin" })?;
        let stdout = child
            .stdout
            .take()
            .ok_or(LaunchError::PipeUnavailable { pipe: "stdout" })?;
        if let Some(stderr) = child.stderr.take() {
            let prefix = self.config.effective_prefix().to_string();
            self.runtime.spawn(forward_stderr(stderr, prefix));
        }

        let (respond_tx, respond_rx) = mpsc::unbounded_channel();
        let (call_tx, call_rx) = mpsc::unbounded_channel();
        self.runtime
            .spawn(write_calls(stdin, call_rx, respond_tx.clone()));
        self.runtime.spawn(pump_responds(stdout, respond_tx));

        info!(pid = child.id(), exe = %self.exe.display(), "Rig started");
        Ok(ProcessLink {
            child,
            calls: Some(call_tx),
            responds: respond_rx,
            runtime: self.runtime.clone(),
        })
    }
}

type RespondFrame = TransportResult<Envelope<RespondMessage>>;

/// Pipes of a rig started by [`ProcessLauncher`].
#[derive(Debug)]
pub struct ProcessLink {
    child: Child,
    /// Encoded call frames for the writer task; `None` once stdin is closed.
    calls: Option<mpsc::UnboundedSender<Vec<u8>>>,
    responds: mpsc::UnboundedReceiver<RespondFrame>,
    runtime: Handle,
}

impl RigLink for ProcessLink {
    fn send(&mut self, seq: u64, call: &CallMessage) -> Result<(), LinkError> {
        let frame = encode_frame(&Envelope::new(seq, call))?;
        let calls = self.calls.as_ref().ok_or(LinkError::Disconnected)?;
        calls.send(frame).map_err(|_| LinkError::Disconnected)
    }

    fn await_respond(
        &mut self,
        seq: u64,
        timeout: Duration,
    ) -> Result<RespondMessage, LinkError> {
        let responds = &mut self.responds;
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

        self.runtime.block_on(async move {
            tokio::time::timeout(timeout, next_respond(responds, seq))
                .await
                .unwrap_or(Err(LinkError::Timeout { timeout_ms }))
        })
    }

    fn is_alive(&mut self) -> bool {
        let _guard = self.runtime.enter();
        matches!(self.child.try_wait(), Ok(None))
    }

    fn shutdown(&mut self) {
        // Closing stdin is the quit request; the writer drops it once the
        // frame it is on is through.
        self.calls = None;
        let child = &mut self.child;
        let exited = self
            .runtime
            .block_on(async { tokio::time::timeout(QUIT_GRACE, child.wait()).await });
        match exited {
            Ok(Ok(status)) => info!(%status, "Rig quit"),
            Ok(Err(e)) => warn!(error = %e, "Failed to wait for rig"),
            Err(_) => {
                warn!("Rig ignored quit request, killing it");
                self.kill();
            }
        }
    }

    fn kill(&mut self) {
        self.calls = None;
        let _guard = self.runtime.enter();
        if let Err(e) = self.child.start_kill() {
            debug!(error = %e, "Rig already gone");
        }
    }
}

/// Write every queued call frame to the rig in full. A failed write is
/// reported through the respond channel and ends the task.
async fn write_calls(
    mut stdin: impl AsyncWrite + Unpin,
    mut frames: mpsc::UnboundedReceiver<Vec<u8>>,
    responds: mpsc::UnboundedSender<RespondFrame>,
) {
    while let Some(frame) = frames.recv().await {
        let written = match stdin.write_all(&frame).await {
            Ok(()) => stdin.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            debug!(error = %e, "Rig stopped taking calls");
            let _ = responds.send(Err(TransportError::write_failed(&e)));
            break;
        }
    }
}

/// Receiving from the channel is cancel safe, so the caller may wrap this
/// in a timeout and try again later.
async fn next_respond(
    responds: &mut mpsc::UnboundedReceiver<RespondFrame>,
    seq: u64,
) -> Result<RespondMessage, LinkError> {
    loop {
        match responds.recv().await {
            None => return Err(LinkError::Disconnected),
            Some(Err(e)) => return Err(LinkError::from_transport(e)),
            Some(Ok(envelope)) if envelope.seq == seq => return Ok(envelope.body),
            Some(Ok(envelope)) => {
                debug!(expected = seq, got = envelope.seq, "Discarding stale respond");
            }
        }
    }
}

async fn forward_stderr(stderr: ChildStderr, prefix: String) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        info!(target: "rig", "{prefix}{line}");
    }
}

async fn pump_responds(
    mut stdout: impl AsyncRead + Unpin,
    tx: mpsc::UnboundedSender<RespondFrame>,
) {
    loop {
        let frame = read_frame(&mut stdout).await;
        let failed = frame.is_err();
        if tx.send(frame).is_err() || failed {
            break;
        }
    }
}

/// Read and decode one envelope frame from an async stream.
///
/// # Errors
/// Any framing, version or decoding error, or the stream ending.
pub async fn read_frame<T, R>(reader: &mut R) -> TransportResult<Envelope<T>>
where
    T: serde::de::DeserializeOwned,
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    reader
        .read_exact(&mut prefix)
        .await
        .map_err(|e| map_read_error(&e, 0, LENGTH_PREFIX_SIZE))?;

    let length = validate_length(u32::from_be_bytes(prefix))?;
    let mut payload = vec![0u8; length];
    reader.read_exact(&mut payload).await.map_err(|e| {
        map_read_error(
            &e,
            LENGTH_PREFIX_SIZE,
            LENGTH_PREFIX_SIZE.saturating_add(length),
        )
    })?;

    decode_payload(&payload)
}

fn map_read_error(err: &std::io::Error, bytes_read: usize, expected: usize) -> TransportError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        TransportError::unexpected_eof(bytes_read, expected)
    } else {
        TransportError::read_failed(err)
    }
}
