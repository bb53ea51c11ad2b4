#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # rigbridge-build
//!
//! Compiles a user project out of band and classifies every failure into a
//! fixed [`ErrorCode`] taxonomy.
//!
//! - [`BuildExecutor`] validates a [`BuildRequest`], drives the external
//!   [`Compiler`] and copies the artifacts into place.
//! - [`BackgroundBuildQueue`] runs one executor job at a time on a tokio
//!   runtime and hands the [`BuildOutcome`] back to a frame loop that polls
//!   it once per tick.

pub mod background;
pub mod compiler;
pub mod config;
pub mod executor;
pub mod launch;
pub mod log_ring;
pub mod request;
pub mod taxonomy;

pub use background::{BackgroundBuildQueue, BackgroundBuildState};
pub use compiler::{Compiler, CompilerInvocation, DotnetCompiler};
pub use config::{BuildConfig, EngineLayout};
pub use executor::{BuildArtifacts, BuildExecutor, BuildOutcome};
pub use launch::launch_published;
pub use log_ring::{LogLine, LogRing, LogStream};
pub use request::{BuildMode, BuildRequest};
pub use taxonomy::ErrorCode;
