#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # rigbridge
//!
//! Editor side of the live preview: an [`EditorSession`] owns the
//! background build queue and the rig transceiver and advances both once
//! per frame.

pub mod cli;
pub mod commands;
pub mod config;
pub mod features;
pub mod preview;
pub mod session;

pub use config::{BridgeConfig, ConfigPaths, load_config, load_config_from};
pub use features::{
    CodeAnalysis, EditorFeatures, LightingParams, MapEditorToggles, PushSettings, ViewPosition,
};
pub use preview::LoggingRenderer;
pub use session::{BuildReport, EditorSession, RigActivity, TickReport};
