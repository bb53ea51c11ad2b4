//! Drawing seam between the transceiver and the editor's preview panel.

use rigbridge_ipc::RenderView;

/// How a respond should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    /// Sprite sheet the preview draws from.
    pub sheet_index: i32,
    /// Draw the rig's gizmo requests on top.
    pub draw_gizmos: bool,
    /// The rig is not producing new frames; this is a held image.
    pub frozen: bool,
}

/// Editor-side consumer of rig render output.
pub trait PreviewRenderer {
    fn render(&mut self, view: RenderView<'_>, options: &RenderOptions);
}
