//! Single-slot background build job.
//!
//! The frame thread submits a build and then polls once per tick; the build
//! itself runs on a tokio runtime and hands its outcome back over a oneshot
//! channel. Nothing here ever blocks the caller.

use std::sync::Arc;

use rigbridge_core::{Project, fs};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, error, info};

use crate::executor::{BuildExecutor, BuildOutcome};
use crate::log_ring::LogRing;
use crate::request::BuildRequest;
use crate::taxonomy::ErrorCode;

/// Lifecycle of the background slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundBuildState {
    #[default]
    Idle,
    Running,
    Completed,
}

type Listener = Box<dyn FnMut(&BuildOutcome)>;

/// Runs at most one build at a time off the frame thread.
pub struct BackgroundBuildQueue {
    executor: BuildExecutor,
    runtime: Handle,
    log: Arc<LogRing>,
    state: BackgroundBuildState,
    pending: Option<oneshot::Receiver<BuildOutcome>>,
    completed: Option<BuildOutcome>,
    last_return_code: Option<i32>,
    last_source_stamp: i64,
    listeners: Vec<Listener>,
}

impl BackgroundBuildQueue {
    /// `log_capacity` bounds the compiler lines kept per build.
    pub fn new(executor: BuildExecutor, runtime: Handle, log_capacity: usize) -> Self {
        Self {
            executor,
            runtime,
            log: Arc::new(LogRing::new(log_capacity)),
            state: BackgroundBuildState::Idle,
            pending: None,
            completed: None,
            last_return_code: None,
            last_source_stamp: 0,
            listeners: Vec::new(),
        }
    }

    /// Register a listener called once per finished build, on the thread
    /// that calls [`BackgroundBuildQueue::poll`].
    pub fn on_completed(&mut self, listener: impl FnMut(&BuildOutcome) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Start building `project` in the background.
    ///
    /// Returns `false` without side effects if a build is already running,
    /// there is no project, or its developer name is not a valid file name.
    pub fn submit(&mut self, project: Option<Project>, source_stamp: i64) -> bool {
        if self.is_building() {
            debug!("Background build already running, rejecting submit");
            return false;
        }
        let Some(project) = project else {
            return false;
        };
        if !fs::is_valid_file_name(&project.info().developer_name) {
            return false;
        }

        self.log.clear();
        self.completed = None;
        self.last_return_code = None;
        self.last_source_stamp = source_stamp;

        let (tx, rx) = oneshot::channel();
        let executor = self.executor.clone();
        let log = Arc::clone(&self.log);
        let request = BuildRequest::library(Some(project));

        self.runtime.spawn(async move {
            let job = tokio::spawn(async move { executor.build(&request, &log).await });
            let outcome = match job.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(error = %e, "Background build worker failed");
                    BuildOutcome::failed(ErrorCode::Unknown)
                }
            };
            if tx.send(outcome).is_err() {
                debug!("Background build finished after its queue was dropped");
            }
        });

        self.pending = Some(rx);
        self.state = BackgroundBuildState::Running;
        info!(source_stamp, "Background build started");
        true
    }

    /// Check for a finished build. Call once per tick.
    ///
    /// On the tick the build finishes this moves to
    /// [`BackgroundBuildState::Completed`], notifies every listener and
    /// returns the outcome; otherwise returns `None`.
    pub fn poll(&mut self) -> Option<BuildOutcome> {
        let receiver = self.pending.as_mut()?;
        let mut outcome = match receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => {
                error!("Background build ended without reporting");
                BuildOutcome::failed(ErrorCode::Unknown)
            }
        };

        self.pending = None;
        outcome.source_stamp = self.last_source_stamp;
        self.last_return_code = Some(outcome.code());
        self.state = BackgroundBuildState::Completed;

        for listener in &mut self.listeners {
            listener(&outcome);
        }

        self.completed = Some(outcome.clone());
        Some(outcome)
    }

    /// Hand over the completed outcome and return to idle.
    pub fn take_completed(&mut self) -> Option<BuildOutcome> {
        let outcome = self.completed.take()?;
        self.state = BackgroundBuildState::Idle;
        Some(outcome)
    }

    pub const fn state(&self) -> BackgroundBuildState {
        self.state
    }

    pub const fn is_building(&self) -> bool {
        matches!(self.state, BackgroundBuildState::Running)
    }

    /// Code of the last finished build; `None` while one is running or
    /// before the first.
    pub const fn last_return_code(&self) -> Option<i32> {
        self.last_return_code
    }

    /// Source stamp the most recent build was started for.
    pub const fn last_source_stamp(&self) -> i64 {
        self.last_source_stamp
    }

    /// Live compiler lines of the current or last build.
    pub fn log(&self) -> &LogRing {
        &self.log
    }

    pub const fn executor(&self) -> &BuildExecutor {
        &self.executor
    }
}

impl std::fmt::Debug for BackgroundBuildQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundBuildQueue")
            .field("state", &self.state)
            .field("last_return_code", &self.last_return_code)
            .field("last_source_stamp", &self.last_source_stamp)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}
