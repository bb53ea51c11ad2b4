//! Headless preview panel.

use rigbridge_ipc::RenderView;
use rigbridge_transceiver::{PreviewRenderer, RenderOptions};
use tracing::{debug, info};

/// Renders nothing; logs what a preview panel would draw.
#[derive(Debug, Default)]
pub struct LoggingRenderer {
    frames: u64,
    frozen_frames: u64,
    last_global_frame: Option<u64>,
    every: u64,
}

impl LoggingRenderer {
    /// Log a summary line every `every` frames (at least 1).
    #[must_use]
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    #[must_use]
    pub const fn frozen_frames(&self) -> u64 {
        self.frozen_frames
    }

    #[must_use]
    pub const fn last_global_frame(&self) -> Option<u64> {
        self.last_global_frame
    }
}

impl PreviewRenderer for LoggingRenderer {
    fn render(&mut self, view: RenderView<'_>, options: &RenderOptions) {
        self.frames = self.frames.saturating_add(1);
        if options.frozen {
            self.frozen_frames = self.frozen_frames.saturating_add(1);
        }
        self.last_global_frame = Some(view.global_frame);

        debug!(
            global_frame = view.global_frame,
            gizmo_rects = view.gizmo_rects.len(),
            gizmo_lines = view.gizmo_lines.len(),
            doodle_rects = view.doodle_rects.len(),
            frozen = options.frozen,
            "Preview frame"
        );
        if self.frames % self.every.max(1) == 0 {
            info!(
                frames = self.frames,
                frozen = self.frozen_frames,
                global_frame = view.global_frame,
                sky_top = ?view.sky_top,
                "Preview running"
            );
        }
    }
}
