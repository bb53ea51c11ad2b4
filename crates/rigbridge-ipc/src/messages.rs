//! Message types exchanged once per editor frame.
//!
//! # Message Flow
//!
//! **Editor → Rig ([`CallMessage`])**: input snapshot, render control and the
//! remote settings pushed since the last successful exchange.
//!
//! **Rig → Editor ([`RespondMessage`])**: frame counters, resource usage,
//! sky colours and every request the rig cannot fulfil itself (gizmos,
//! doodles, glyphs, audio, cursor) plus the device state it observed.
//!
//! Bounded lists carry a published capacity; the `push_*` helpers refuse
//! entries beyond it so a runaway rig cannot grow a frame past the transport
//! limit.

use serde::{Deserialize, Serialize};

use crate::settings::RemoteSetting;

// ═══════════════════════════════════════════════════════════════════════════
// PRIMITIVES
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color32 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color32 {
    pub const CLEAR: Self = Self::new(0, 0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Int2 {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Float2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

fn push_bounded<T>(list: &mut Vec<T>, capacity: usize, item: T) -> bool {
    if list.len() >= capacity {
        return false;
    }
    list.push(item);
    true
}

// ═══════════════════════════════════════════════════════════════════════════
// CALL (editor → rig)
// ═══════════════════════════════════════════════════════════════════════════

/// Snapshot of mouse, keyboard and gamepad state for one frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceInput {
    pub mouse_available: bool,
    pub mouse_left_holding: bool,
    pub mouse_right_holding: bool,
    pub mouse_mid_holding: bool,
    pub mouse_position: Int2,
    pub mouse_scroll_delta: i32,
    pub cursor_in_screen: bool,

    pub keyboard_available: bool,
    /// Characters typed this frame, in order.
    pub pressed_chars: Vec<char>,
    /// GUI keys pressed this frame, in order.
    pub pressed_keys: Vec<u16>,
    /// Keyboard keys currently held.
    pub holding_keys: Vec<u16>,

    pub gamepad_available: bool,
    /// Gamepad buttons currently held.
    pub holding_gamepad_keys: Vec<u16>,
    /// Bits 0-3: left stick L/R/D/U, bits 4-7: right stick L/R/D/U.
    pub stick_holding: u8,
    pub left_stick: Float2,
    pub right_stick: Float2,
}

impl DeviceInput {
    pub const PRESSED_CHAR_CAPACITY: usize = 256;
    pub const KEY_CAPACITY: usize = 128;

    /// Record a typed character; returns false once the frame is full.
    pub fn push_char(&mut self, c: char) -> bool {
        push_bounded(&mut self.pressed_chars, Self::PRESSED_CHAR_CAPACITY, c)
    }

    /// Record a pressed GUI key; returns false once the frame is full.
    pub fn push_pressed_key(&mut self, key: u16) -> bool {
        push_bounded(&mut self.pressed_keys, Self::KEY_CAPACITY, key)
    }

    /// Copy with every mouse button, scroll and cursor field cleared.
    #[must_use]
    pub fn without_mouse(mut self) -> Self {
        self.mouse_left_holding = false;
        self.mouse_right_holding = false;
        self.mouse_mid_holding = false;
        self.mouse_scroll_delta = 0;
        self
    }

    /// Copy with every keyboard field cleared.
    #[must_use]
    pub fn without_keyboard(mut self) -> Self {
        self.pressed_chars.clear();
        self.pressed_keys.clear();
        self.holding_keys.clear();
        self
    }

    #[must_use]
    pub const fn any_mouse_holding(&self) -> bool {
        self.mouse_left_holding || self.mouse_right_holding || self.mouse_mid_holding
    }
}

/// Editor → rig message, one per protocol tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CallMessage {
    pub screen_width: i32,
    pub screen_height: i32,
    pub monitor_width: i32,
    pub monitor_height: i32,
    /// Width of editor chrome covering the left of the preview.
    pub padding_left: i32,
    /// Width of editor chrome covering the right of the preview.
    pub padding_right: i32,
    pub requiring_window_index: i32,
    /// Rig should simulate but skip producing render output this tick.
    pub ignore_rendering: bool,
    pub ignore_mouse_input: bool,
    pub ignore_key_input: bool,
    pub device: DeviceInput,
    /// One bit per screen effect the editor has enabled.
    pub effect_enable: u32,
    pub music_playing: bool,
    pub draw_collider_gizmos: bool,
    pub entity_clicker: bool,
    pub remote_settings: Vec<RemoteSetting>,
}

impl CallMessage {
    pub const REMOTE_SETTING_CAPACITY: usize = 512;

    /// Device state as the rig should see it, with ignored devices cleared.
    #[must_use]
    pub fn effective_device(&self) -> DeviceInput {
        let mut device = self.device.clone();
        if self.ignore_mouse_input {
            device = device.without_mouse();
        }
        if self.ignore_key_input {
            device = device.without_keyboard();
        }
        device
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// RESPOND (rig → editor)
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GizmoRect {
    pub rect: IRect,
    pub color_tl: Color32,
    pub color_tr: Color32,
    pub color_bl: Color32,
    pub color_br: Color32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GizmoLine {
    pub start: Int2,
    pub end: Int2,
    pub thickness: i32,
    pub color: Color32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DoodleRect {
    pub rect: FRect,
    pub color: Color32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DoodleWorld {
    pub screen_rect: FRect,
    pub world_unit_range: IRect,
    pub z: i32,
    /// Bit 0: level, 1: background, 2: entity, 3: element.
    pub ignore_mask: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CharRequest {
    pub c: char,
    pub font_index: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SoundRequest {
    pub id: i32,
    pub volume: f32,
    pub pitch: f32,
    pub pan: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MusicRequest {
    pub id: i32,
    pub from_start: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AudioActions {
    pub stop_music: bool,
    pub pause_music: bool,
    pub unpause_music: bool,
    pub stop_all_sounds: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vignette {
    pub radius: f32,
    pub feather: f32,
    pub offset: Float2,
    pub round: f32,
}

/// Screen effect parameters the rig set this frame; `None` means unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EffectParams {
    pub darken: Option<(f32, f32)>,
    pub lighten: Option<(f32, f32)>,
    pub tint: Option<Color32>,
    pub vignette: Option<Vignette>,
}

/// Rig → editor message, one per protocol tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RespondMessage {
    pub global_frame: u64,
    pub pauseless_frame: u64,
    pub frame_duration_ms: f32,
    pub game_playing: bool,

    pub render_usages: Vec<u32>,
    pub render_capacities: Vec<u32>,
    pub entity_usages: Vec<u32>,
    pub entity_capacities: Vec<u32>,

    pub sky_top: Color32,
    pub sky_bottom: Color32,
    pub music_playing: bool,

    pub effect_enable: u32,
    pub effects: EffectParams,

    pub gizmo_rects: Vec<GizmoRect>,
    pub gizmo_lines: Vec<GizmoLine>,

    pub reset_doodle: Option<Color32>,
    pub doodle_offset: Option<Float2>,
    pub doodle_zoom: Option<f32>,
    pub doodle_rects: Vec<DoodleRect>,
    pub doodle_worlds: Vec<DoodleWorld>,

    pub char_requests: Vec<CharRequest>,

    pub play_music: Option<MusicRequest>,
    pub audio_actions: AudioActions,
    pub set_music_volume: Option<i32>,
    pub set_sound_volume: Option<i32>,
    pub sound_requests: Vec<SoundRequest>,

    /// Cursor the rig asked for; `None` keeps the editor's cursor.
    pub cursor_index: Option<i32>,

    /// Device state as the rig observed it.
    pub device_echo: DeviceInput,
}

impl RespondMessage {
    pub const GIZMO_RECT_CAPACITY: usize = 4096;
    pub const GIZMO_LINE_CAPACITY: usize = 2048;
    pub const DOODLE_RECT_CAPACITY: usize = 4096;
    pub const DOODLE_WORLD_CAPACITY: usize = 16;
    pub const CHAR_REQUEST_CAPACITY: usize = 64;
    pub const SOUND_REQUEST_CAPACITY: usize = 32;

    pub fn push_gizmo_rect(&mut self, gizmo: GizmoRect) -> bool {
        push_bounded(&mut self.gizmo_rects, Self::GIZMO_RECT_CAPACITY, gizmo)
    }

    pub fn push_gizmo_line(&mut self, line: GizmoLine) -> bool {
        push_bounded(&mut self.gizmo_lines, Self::GIZMO_LINE_CAPACITY, line)
    }

    pub fn push_doodle_rect(&mut self, doodle: DoodleRect) -> bool {
        push_bounded(&mut self.doodle_rects, Self::DOODLE_RECT_CAPACITY, doodle)
    }

    pub fn push_doodle_world(&mut self, doodle: DoodleWorld) -> bool {
        push_bounded(&mut self.doodle_worlds, Self::DOODLE_WORLD_CAPACITY, doodle)
    }

    pub fn push_char_request(&mut self, request: CharRequest) -> bool {
        push_bounded(&mut self.char_requests, Self::CHAR_REQUEST_CAPACITY, request)
    }

    pub fn push_sound_request(&mut self, request: SoundRequest) -> bool {
        push_bounded(&mut self.sound_requests, Self::SOUND_REQUEST_CAPACITY, request)
    }

    /// Drop anything over capacity; applied to every respond received.
    pub fn clamp_to_capacity(&mut self) {
        self.gizmo_rects.truncate(Self::GIZMO_RECT_CAPACITY);
        self.gizmo_lines.truncate(Self::GIZMO_LINE_CAPACITY);
        self.doodle_rects.truncate(Self::DOODLE_RECT_CAPACITY);
        self.doodle_worlds.truncate(Self::DOODLE_WORLD_CAPACITY);
        self.char_requests.truncate(Self::CHAR_REQUEST_CAPACITY);
        self.sound_requests.truncate(Self::SOUND_REQUEST_CAPACITY);
    }

    /// The subset of the respond a preview panel draws.
    #[must_use]
    pub fn render_view(&self) -> RenderView<'_> {
        RenderView {
            global_frame: self.global_frame,
            sky_top: self.sky_top,
            sky_bottom: self.sky_bottom,
            effect_enable: self.effect_enable,
            effects: &self.effects,
            gizmo_rects: &self.gizmo_rects,
            gizmo_lines: &self.gizmo_lines,
            reset_doodle: self.reset_doodle,
            doodle_offset: self.doodle_offset,
            doodle_zoom: self.doodle_zoom,
            doodle_rects: &self.doodle_rects,
            doodle_worlds: &self.doodle_worlds,
            cursor_index: self.cursor_index,
        }
    }
}

/// Render-relevant fields of a [`RespondMessage`], borrowed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView<'a> {
    pub global_frame: u64,
    pub sky_top: Color32,
    pub sky_bottom: Color32,
    pub effect_enable: u32,
    pub effects: &'a EffectParams,
    pub gizmo_rects: &'a [GizmoRect],
    pub gizmo_lines: &'a [GizmoLine],
    pub reset_doodle: Option<Color32>,
    pub doodle_offset: Option<Float2>,
    pub doodle_zoom: Option<f32>,
    pub doodle_rects: &'a [DoodleRect],
    pub doodle_worlds: &'a [DoodleWorld],
    pub cursor_index: Option<i32>,
}
