//! CLI command definitions using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// rigbridge - build a game project and preview it live in a rig
#[derive(Parser, Debug)]
#[command(name = "rigbridge")]
#[command(version)]
#[command(about = "Background project builds and a live rig preview for the editor")]
#[command(
    long_about = "rigbridge compiles a game project with the engine toolchain, publishes it, and keeps a rig process running next to the editor, exchanging one call and one respond per frame."
)]
pub struct Cli {
    /// Project folder (contains the csproj and Universe/Info.json)
    #[arg(short, long, global = true, default_value = ".")]
    pub project: PathBuf,

    /// Extra config file, applied after the global and project files
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the project library into its Build folder
    Build,

    /// Build and publish a runnable bundle
    Publish {
        /// Output folder for the bundle
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Run the project's current build with the engine entry executable
    Run,

    /// Headless preview: rebuild when stale and drive a rig frame by frame
    Preview {
        /// Stop after this many frames (runs until Ctrl+C when omitted)
        #[arg(short, long)]
        frames: Option<u64>,

        /// Frames per second
        #[arg(long, default_value_t = 60.0)]
        fps: f64,
    },

    /// Print the effective configuration as TOML
    Config,
}
