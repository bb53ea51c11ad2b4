//! Transceiver errors.

use std::path::PathBuf;

use rigbridge_ipc::TransportError;
use thiserror::Error;

use crate::state::RigProcessState;

/// Why a rig process could not be started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchError {
    #[error("Rig executable not found: {}", path.display())]
    ExecutableMissing { path: PathBuf },

    #[error("Failed to spawn rig: {reason}")]
    SpawnFailed { reason: String },

    #[error("Rig process has no {pipe} pipe")]
    PipeUnavailable { pipe: &'static str },
}

impl LaunchError {
    pub fn spawn_failed(reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            reason: reason.into(),
        }
    }
}

/// Why one exchange with a running rig failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// No respond arrived in time; the rig may still be alive.
    #[error("Rig did not respond within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The rig's pipes are closed.
    #[error("Rig disconnected")]
    Disconnected,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl LinkError {
    /// Classify a transport failure: a closed pipe is a disconnect, anything
    /// else is kept as is.
    #[must_use]
    pub fn from_transport(err: TransportError) -> Self {
        if err.is_disconnect() {
            Self::Disconnected
        } else {
            Self::Transport(err)
        }
    }

    /// Whether the rig should be considered gone.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Timeout { .. } => false,
            Self::Disconnected | Self::Transport(_) => true,
        }
    }
}

/// Errors returned by [`crate::RigTransceiver`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransceiverError {
    #[error("Cannot {operation} while rig is {state}")]
    InvalidState {
        operation: &'static str,
        state: RigProcessState,
    },

    #[error("Start postponed until frame {next_frame}")]
    BackoffPending { next_frame: u64 },

    #[error("No respond received since the last call")]
    NoPendingRespond,

    #[error("Rig process exited")]
    RigExited,

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Link(#[from] LinkError),
}

impl TransceiverError {
    #[must_use]
    pub const fn invalid_state(operation: &'static str, state: RigProcessState) -> Self {
        Self::InvalidState { operation, state }
    }
}
