//! Stand-in rig for trying the preview without an engine install.
//!
//! Speaks the call/respond protocol on stdin/stdout and logs to stderr,
//! which the editor forwards into its own log. Point `rig.exe` (or
//! `RIGBRIDGE_RIG_EXE`) at this binary.

#![forbid(unsafe_code)]
#![forbid(clippy::unwrap_used)]
#![forbid(clippy::panic)]
#![deny(clippy::expect_used)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rigbridge_ipc::{CallMessage, Color32, GizmoRect, IRect, RespondMessage, RigEndpoint};
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "rigbridge-demo-rig")]
struct Args {
    /// Build folder of the project being previewed
    build: PathBuf,
    /// Universe folder with the project's assets
    universe: PathBuf,
    /// Console flag passed through by the editor
    keep_console: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .without_time(),
        )
        .init();

    let args = Args::parse();
    info!(
        build = %args.build.display(),
        universe = %args.universe.display(),
        keep_console = args.keep_console.is_some(),
        "Demo rig started"
    );

    let mut endpoint = RigEndpoint::stdio();
    let mut state = DemoState::default();
    loop {
        let (seq, call) = match endpoint.next_call() {
            Ok(Some(next)) => next,
            Ok(None) => break,
            Err(err) => {
                error!("Failed to read call: {}", err);
                return ExitCode::FAILURE;
            }
        };
        let respond = state.advance(&call);
        if let Err(err) = endpoint.reply(seq, &respond) {
            error!("Failed to send respond: {}", err);
            return ExitCode::FAILURE;
        }
    }

    info!(frames = state.global_frame, "Editor closed the pipe, exiting");
    ExitCode::SUCCESS
}

#[derive(Debug, Default)]
struct DemoState {
    global_frame: u64,
}

impl DemoState {
    fn advance(&mut self, call: &CallMessage) -> RespondMessage {
        self.global_frame = self.global_frame.saturating_add(1);
        for setting in &call.remote_settings {
            debug!(id = setting.id, value = setting.value, "Remote setting");
        }

        // Sky slowly cycles so a frozen preview is easy to spot.
        let shade = u8::try_from(self.global_frame % 256).unwrap_or(0);
        let mut respond = RespondMessage {
            global_frame: self.global_frame,
            pauseless_frame: self.global_frame,
            game_playing: true,
            sky_top: Color32::new(shade, 96, 160, 255),
            sky_bottom: Color32::new(32, 32, shade, 255),
            music_playing: call.music_playing,
            effect_enable: call.effect_enable,
            device_echo: call.device.clone(),
            ..RespondMessage::default()
        };
        if call.device.mouse_available && call.device.cursor_in_screen {
            let at = call.device.mouse_position;
            respond.gizmo_rects.push(GizmoRect {
                rect: IRect {
                    x: at.x.saturating_sub(8),
                    y: at.y.saturating_sub(8),
                    width: 16,
                    height: 16,
                },
                color_tl: Color32::WHITE,
                color_tr: Color32::WHITE,
                color_bl: Color32::WHITE,
                color_br: Color32::WHITE,
            });
        }
        respond
    }
}
