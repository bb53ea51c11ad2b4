#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # rigbridge-transceiver
//!
//! Keeps a rig process alive next to the editor and trades one
//! [`CallMessage`](rigbridge_ipc::CallMessage) for one
//! [`RespondMessage`](rigbridge_ipc::RespondMessage) per editor frame.
//!
//! The process seam is two traits, [`RigLauncher`] and [`RigLink`];
//! [`ProcessLauncher`] implements them over a child process's pipes.

pub mod backoff;
pub mod channel;
pub mod config;
pub mod error;
pub mod process;
pub mod render;
pub mod state;
pub mod transceiver;

pub use backoff::StartBackoff;
pub use channel::RemoteSettingChannel;
pub use config::{BackoffConfig, RigConfig};
pub use error::{LaunchError, LinkError, TransceiverError};
pub use process::{ProcessLauncher, ProcessLink, RigLauncher, RigLink};
pub use render::{PreviewRenderer, RenderOptions};
pub use state::RigProcessState;
pub use transceiver::{CallFrame, RigTransceiver};
