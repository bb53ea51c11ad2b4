//! Editor features that tune the running rig through remote settings.
//!
//! Each feature owns a block of setting ids; the rig side listens for the
//! same ids. Nothing here is known to the protocol.

use rigbridge_core::LightMapInfo;
use rigbridge_transceiver::RemoteSettingChannel;

/// Something that can describe itself as remote settings.
pub trait PushSettings {
    fn push_to(&self, channel: &mut RemoteSettingChannel);
}

/// Map editor overlay toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapEditorToggles {
    pub quick_player_drop: bool,
    pub show_behind: bool,
    pub show_grid_gizmos: bool,
    pub show_state: bool,
}

impl MapEditorToggles {
    pub const SETTING_QUICK_PLAYER_DROP: i32 = 100;
    pub const SETTING_SHOW_BEHIND: i32 = 101;
    pub const SETTING_SHOW_GRID_GIZMOS: i32 = 102;
    pub const SETTING_SHOW_STATE: i32 = 103;
}

impl Default for MapEditorToggles {
    fn default() -> Self {
        Self {
            quick_player_drop: false,
            show_behind: true,
            show_grid_gizmos: true,
            show_state: false,
        }
    }
}

impl PushSettings for MapEditorToggles {
    fn push_to(&self, channel: &mut RemoteSettingChannel) {
        channel.push_bool(Self::SETTING_QUICK_PLAYER_DROP, self.quick_player_drop);
        channel.push_bool(Self::SETTING_SHOW_BEHIND, self.show_behind);
        channel.push_bool(Self::SETTING_SHOW_GRID_GIZMOS, self.show_grid_gizmos);
        channel.push_bool(Self::SETTING_SHOW_STATE, self.show_state);
    }
}

/// Light map tuning. Fractions travel as x1000 fixed point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingParams {
    /// Pin the in-game time of day to `0.0..=1.0`; `None` lets it run.
    pub forced_daytime: Option<f32>,
    pub pixel_style: bool,
    pub self_lerp: f32,
    pub air_illuminance_day: f32,
    pub air_illuminance_night: f32,
    pub background_tint: f32,
    pub solid_illuminance: f32,
    pub level_illuminate_remain: f32,
}

impl LightingParams {
    pub const SETTING_IN_GAME_DAYTIME: i32 = 200;
    pub const SETTING_FREE_IN_GAME_DAYTIME: i32 = 201;
    pub const SETTING_PIXEL_STYLE: i32 = 202;
    pub const SETTING_SELF_LERP: i32 = 203;
    pub const SETTING_AIR_ILLUMINANCE_DAY: i32 = 204;
    pub const SETTING_AIR_ILLUMINANCE_NIGHT: i32 = 205;
    pub const SETTING_BACKGROUND_TINT: i32 = 206;
    pub const SETTING_SOLID_ILLUMINANCE: i32 = 207;
    pub const SETTING_LEVEL_ILLUMINATE_REMAIN: i32 = 208;
}

impl LightingParams {
    /// The part that is saved with the universe.
    #[must_use]
    pub const fn light_map(&self) -> LightMapInfo {
        LightMapInfo {
            pixel_style: self.pixel_style,
            self_lerp: self.self_lerp,
            air_illuminance_day: self.air_illuminance_day,
            air_illuminance_night: self.air_illuminance_night,
            background_tint: self.background_tint,
            solid_illuminance: self.solid_illuminance,
            level_illuminate_remain: self.level_illuminate_remain,
        }
    }
}

impl From<&LightMapInfo> for LightingParams {
    fn from(map: &LightMapInfo) -> Self {
        Self {
            forced_daytime: None,
            pixel_style: map.pixel_style,
            self_lerp: map.self_lerp,
            air_illuminance_day: map.air_illuminance_day,
            air_illuminance_night: map.air_illuminance_night,
            background_tint: map.background_tint,
            solid_illuminance: map.solid_illuminance,
            level_illuminate_remain: map.level_illuminate_remain,
        }
    }
}

impl Default for LightingParams {
    fn default() -> Self {
        Self::from(&LightMapInfo::default())
    }
}

impl PushSettings for LightingParams {
    fn push_to(&self, channel: &mut RemoteSettingChannel) {
        match self.forced_daytime {
            Some(daytime) => channel.push_scaled(Self::SETTING_IN_GAME_DAYTIME, daytime),
            None => channel.push(Self::SETTING_FREE_IN_GAME_DAYTIME, 0),
        }
        channel.push_bool(Self::SETTING_PIXEL_STYLE, self.pixel_style);
        channel.push_scaled(Self::SETTING_SELF_LERP, self.self_lerp);
        channel.push_scaled(Self::SETTING_AIR_ILLUMINANCE_DAY, self.air_illuminance_day);
        channel.push_scaled(Self::SETTING_AIR_ILLUMINANCE_NIGHT, self.air_illuminance_night);
        channel.push_scaled(Self::SETTING_BACKGROUND_TINT, self.background_tint);
        channel.push_scaled(Self::SETTING_SOLID_ILLUMINANCE, self.solid_illuminance);
        channel.push_scaled(
            Self::SETTING_LEVEL_ILLUMINATE_REMAIN,
            self.level_illuminate_remain,
        );
    }
}

/// Move the rig's view to a world position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewPosition {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub height: i32,
}

impl ViewPosition {
    pub const SETTING_SET_VIEW_X: i32 = 300;
    pub const SETTING_SET_VIEW_Y: i32 = 301;
    pub const SETTING_SET_VIEW_Z: i32 = 302;
    pub const SETTING_SET_VIEW_H: i32 = 303;
}

impl PushSettings for ViewPosition {
    fn push_to(&self, channel: &mut RemoteSettingChannel) {
        channel.push(Self::SETTING_SET_VIEW_X, self.x);
        channel.push(Self::SETTING_SET_VIEW_Y, self.y);
        channel.push(Self::SETTING_SET_VIEW_Z, self.z);
        channel.push(Self::SETTING_SET_VIEW_H, self.height);
    }
}

/// One-shot request for the rig to analyse the user's code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeAnalysis {
    Run,
    /// Only report problems, no summary.
    RunSilently,
}

impl CodeAnalysis {
    pub const SETTING_RUN: i32 = 400;
    pub const SETTING_RUN_SILENTLY: i32 = 401;
}

impl PushSettings for CodeAnalysis {
    fn push_to(&self, channel: &mut RemoteSettingChannel) {
        let id = match self {
            Self::Run => Self::SETTING_RUN,
            Self::RunSilently => Self::SETTING_RUN_SILENTLY,
        };
        channel.push(id, 0);
    }
}

/// Feature state plus which parts still have to reach the rig.
///
/// Toggles and lighting are re-sent whenever a fresh rig may have lost
/// them; view moves and code analysis are sent once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorFeatures {
    map: MapEditorToggles,
    lighting: LightingParams,
    map_changed: bool,
    lighting_changed: bool,
    pending_view: Option<ViewPosition>,
    pending_analysis: Option<CodeAnalysis>,
}

impl EditorFeatures {
    #[must_use]
    pub fn new(map: MapEditorToggles, lighting: LightingParams) -> Self {
        Self {
            map,
            lighting,
            map_changed: true,
            lighting_changed: true,
            pending_view: None,
            pending_analysis: None,
        }
    }

    pub fn set_map_toggles(&mut self, map: MapEditorToggles) {
        self.map = map;
        self.map_changed = true;
    }

    pub fn set_lighting(&mut self, lighting: LightingParams) {
        self.lighting = lighting;
        self.lighting_changed = true;
    }

    pub fn request_view(&mut self, position: ViewPosition) {
        self.pending_view = Some(position);
    }

    pub fn request_code_analysis(&mut self, analysis: CodeAnalysis) {
        self.pending_analysis = Some(analysis);
    }

    /// Send toggles and lighting again on the next flush.
    pub fn mark_all_changed(&mut self) {
        self.map_changed = true;
        self.lighting_changed = true;
    }

    #[must_use]
    pub const fn map_toggles(&self) -> &MapEditorToggles {
        &self.map
    }

    #[must_use]
    pub const fn lighting(&self) -> &LightingParams {
        &self.lighting
    }

    /// Push everything that changed since the last flush.
    pub fn flush(&mut self, channel: &mut RemoteSettingChannel) {
        if std::mem::take(&mut self.map_changed) {
            self.map.push_to(channel);
        }
        if std::mem::take(&mut self.lighting_changed) {
            self.lighting.push_to(channel);
        }
        if let Some(view) = self.pending_view.take() {
            view.push_to(channel);
        }
        if let Some(analysis) = self.pending_analysis.take() {
            analysis.push_to(channel);
        }
    }
}
