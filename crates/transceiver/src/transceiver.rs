//! Per-tick conversation with the rig.
//!
//! The editor thread owns one [`RigTransceiver`] and drives it once per
//! frame: [`RigTransceiver::start`] while the rig is down (subject to the
//! start backoff), then [`RigTransceiver::call`] followed by
//! [`RigTransceiver::respond`] while it runs. The last respond that made it
//! through is kept so the preview can hold a frozen image while the rig is
//! down or rebuilding.

use std::path::Path;

use rigbridge_ipc::{CallMessage, DeviceInput, RespondMessage};
use tracing::{debug, info, warn};

use crate::backoff::StartBackoff;
use crate::channel::RemoteSettingChannel;
use crate::config::{BackoffConfig, RigConfig};
use crate::error::TransceiverError;
use crate::process::{RigLauncher, RigLink};
use crate::render::{PreviewRenderer, RenderOptions};
use crate::state::RigProcessState;

/// Editor-side state copied into the call of one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallFrame {
    pub screen_width: i32,
    pub screen_height: i32,
    pub monitor_width: i32,
    pub monitor_height: i32,
    pub padding_left: i32,
    pub padding_right: i32,
    pub requiring_window_index: i32,
    pub ignore_rendering: bool,
    pub ignore_mouse_input: bool,
    pub ignore_key_input: bool,
    pub device: DeviceInput,
    pub effect_enable: u32,
    pub music_playing: bool,
    /// Toolbox requests; they only hold for the tick they are sent in.
    pub draw_collider_gizmos: bool,
    pub entity_clicker: bool,
}

pub struct RigTransceiver<L: RigLauncher> {
    launcher: L,
    config: RigConfig,
    backoff: StartBackoff,
    state: RigProcessState,
    link: Option<L::Link>,
    settings: RemoteSettingChannel,
    calling: CallMessage,
    /// Respond of the current tick, present between `call` and `respond`.
    incoming: Option<RespondMessage>,
    last_respond: Option<RespondMessage>,
    seq: u64,
    /// Sequence number of a call the rig has not answered yet.
    outstanding: Option<u64>,
    unresponsive_frames: u32,
}

impl<L: RigLauncher> std::fmt::Debug for RigTransceiver<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RigTransceiver")
            .field("state", &self.state)
            .field("backoff", &self.backoff)
            .field("pending_settings", &self.settings.pending().len())
            .field("seq", &self.seq)
            .field("outstanding", &self.outstanding)
            .field("unresponsive_frames", &self.unresponsive_frames)
            .finish_non_exhaustive()
    }
}

impl<L: RigLauncher> RigTransceiver<L> {
    pub fn new(launcher: L, config: RigConfig, backoff: BackoffConfig) -> Self {
        Self {
            launcher,
            config,
            backoff: StartBackoff::new(backoff),
            state: RigProcessState::NotRunning,
            link: None,
            settings: RemoteSettingChannel::new(),
            calling: CallMessage::default(),
            incoming: None,
            last_respond: None,
            seq: 0,
            outstanding: None,
            unresponsive_frames: 0,
        }
    }

    /// Try to start the rig on editor frame `frame`.
    ///
    /// # Errors
    /// - `InvalidState` unless the rig is not running
    /// - `BackoffPending` when a recent failure postpones the attempt;
    ///   nothing is spawned and the failure count is untouched
    /// - `Launch` when the process could not be started; this counts as a
    ///   failure for the backoff
    pub fn start(
        &mut self,
        frame: u64,
        build: &Path,
        assets: &Path,
    ) -> Result<(), TransceiverError> {
        if self.state != RigProcessState::NotRunning {
            return Err(TransceiverError::invalid_state("start", self.state));
        }
        if !self.backoff.is_due(frame) {
            return Err(TransceiverError::BackoffPending {
                next_frame: self.backoff.next_attempt_frame(),
            });
        }

        self.transition(RigProcessState::Starting);
        match self.launcher.launch(build, assets) {
            Ok(link) => {
                self.link = Some(link);
                self.backoff.reset();
                self.unresponsive_frames = 0;
                self.incoming = None;
                self.outstanding = None;
                self.transition(RigProcessState::Running);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, frame, "Rig failed to start");
                self.backoff.record_failure(frame);
                self.transition(RigProcessState::NotRunning);
                Err(e.into())
            }
        }
    }

    /// Kill the rig if there is one and drop everything tied to it.
    ///
    /// Pending remote settings are discarded. The last good respond is
    /// kept for frozen rendering.
    pub fn abort(&mut self) {
        if self.state == RigProcessState::NotRunning && self.link.is_none() {
            self.incoming = None;
            self.settings.clear();
            return;
        }
        self.transition(RigProcessState::Aborting);
        if let Some(mut link) = self.link.take() {
            link.kill();
        }
        self.incoming = None;
        self.outstanding = None;
        self.settings.clear();
        self.unresponsive_frames = 0;
        self.transition(RigProcessState::NotRunning);
    }

    /// Ask a running rig to quit, killing it if it does not.
    pub fn quit(&mut self) {
        if let Some(mut link) = self.link.take() {
            self.transition(RigProcessState::Aborting);
            link.shutdown();
        }
        self.incoming = None;
        self.outstanding = None;
        self.settings.clear();
        self.unresponsive_frames = 0;
        if self.state != RigProcessState::NotRunning {
            self.transition(RigProcessState::NotRunning);
        }
    }

    /// Send this tick's call and wait for its respond.
    ///
    /// A timeout leaves the rig running and the call outstanding: later
    /// ticks only wait for that call's respond and send nothing new, so the
    /// rig never has more than one call queued and the settings it carried
    /// arrive once. After `max_unresponsive_frames` timeouts in a row the
    /// rig is aborted. A dead or garbled link moves the rig to not running.
    ///
    /// # Errors
    /// - `InvalidState` unless the rig is running
    /// - `RigExited` when the process is found dead
    /// - `Link` when the exchange failed
    pub fn call(&mut self, frame: &CallFrame) -> Result<(), TransceiverError> {
        if !self.state.can_exchange() {
            return Err(TransceiverError::invalid_state("call", self.state));
        }
        if !self.link.as_mut().is_some_and(|link| link.is_alive()) {
            self.mark_exited();
            return Err(TransceiverError::RigExited);
        }

        self.incoming = None;

        let seq = match self.outstanding {
            Some(seq) => {
                debug!(seq, "Still waiting for the previous call");
                seq
            }
            None => {
                self.fill_calling(frame);
                self.seq = self.seq.wrapping_add(1);
                let Some(link) = self.link.as_mut() else {
                    return Err(TransceiverError::RigExited);
                };
                if let Err(err) = link.send(self.seq, &self.calling) {
                    warn!(error = %err, "Could not send call to rig");
                    self.mark_exited();
                    return Err(err.into());
                }
                self.outstanding = Some(self.seq);
                self.seq
            }
        };

        let Some(link) = self.link.as_mut() else {
            return Err(TransceiverError::RigExited);
        };
        match link.await_respond(seq, self.config.exchange_timeout()) {
            Ok(mut respond) => {
                respond.clamp_to_capacity();
                self.outstanding = None;
                self.settings.acknowledge();
                self.unresponsive_frames = 0;
                self.incoming = Some(respond);
                Ok(())
            }
            Err(err) if !err.is_fatal() => {
                self.unresponsive_frames = self.unresponsive_frames.saturating_add(1);
                if self.unresponsive_frames > self.config.max_unresponsive_frames {
                    warn!(
                        frames = self.unresponsive_frames,
                        "Rig stopped responding, aborting"
                    );
                    self.abort();
                }
                Err(err.into())
            }
            Err(err) => {
                warn!(error = %err, "Lost connection to rig");
                self.mark_exited();
                Err(err.into())
            }
        }
    }

    /// Hand the respond of the last successful [`RigTransceiver::call`] to
    /// `renderer` and make it the new last good respond.
    ///
    /// # Errors
    /// - `InvalidState` unless the rig is running
    /// - `NoPendingRespond` when no call succeeded since the last respond
    pub fn respond(
        &mut self,
        renderer: Option<&mut dyn PreviewRenderer>,
        options: &RenderOptions,
    ) -> Result<&RespondMessage, TransceiverError> {
        if !self.state.can_exchange() {
            return Err(TransceiverError::invalid_state("respond", self.state));
        }
        let respond = self
            .incoming
            .take()
            .ok_or(TransceiverError::NoPendingRespond)?;
        let stored = self.last_respond.insert(respond);
        if let Some(renderer) = renderer {
            renderer.render(stored.render_view(), options);
        }
        Ok(&*stored)
    }

    /// Redraw the last good respond. Returns `false` when there is none.
    pub fn update_last_responded_render(
        &self,
        renderer: &mut dyn PreviewRenderer,
        options: &RenderOptions,
    ) -> bool {
        let Some(last) = &self.last_respond else {
            return false;
        };
        renderer.render(last.render_view(), options);
        true
    }

    fn fill_calling(&mut self, frame: &CallFrame) {
        let calling = &mut self.calling;
        calling.screen_width = frame.screen_width;
        calling.screen_height = frame.screen_height;
        calling.monitor_width = frame.monitor_width;
        calling.monitor_height = frame.monitor_height;
        calling.padding_left = frame.padding_left;
        calling.padding_right = frame.padding_right;
        calling.requiring_window_index = frame.requiring_window_index;
        calling.ignore_rendering = frame.ignore_rendering;
        calling.ignore_mouse_input = frame.ignore_mouse_input;
        calling.ignore_key_input = frame.ignore_key_input;
        calling.device.clone_from(&frame.device);
        calling.effect_enable = frame.effect_enable;
        calling.music_playing = frame.music_playing;
        calling.draw_collider_gizmos = frame.draw_collider_gizmos;
        calling.entity_clicker = frame.entity_clicker;
        calling.remote_settings = self.settings.outgoing();
    }

    fn mark_exited(&mut self) {
        if let Some(mut link) = self.link.take() {
            link.kill();
        }
        self.incoming = None;
        self.outstanding = None;
        self.unresponsive_frames = 0;
        info!("Rig exited");
        self.transition(RigProcessState::NotRunning);
    }

    fn transition(&mut self, next: RigProcessState) {
        if !self.state.can_transition_to(next) {
            warn!(from = %self.state, to = %next, "Unexpected rig state change");
        }
        debug!(from = %self.state, to = %next, "Rig state changed");
        self.state = next;
    }

    #[must_use]
    pub const fn state(&self) -> RigProcessState {
        self.state
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.state.can_exchange()
    }

    #[must_use]
    pub const fn fail_count(&self) -> u32 {
        self.backoff.fail_count()
    }

    #[must_use]
    pub const fn backoff(&self) -> &StartBackoff {
        &self.backoff
    }

    /// Forget past start failures, e.g. after a fresh build.
    pub fn reset_backoff(&mut self) {
        self.backoff.reset();
    }

    #[must_use]
    pub const fn last_respond(&self) -> Option<&RespondMessage> {
        self.last_respond.as_ref()
    }

    /// Whether a call was sent that the rig has not answered yet.
    #[must_use]
    pub const fn is_awaiting_respond(&self) -> bool {
        self.outstanding.is_some()
    }

    /// The most recently sent call.
    #[must_use]
    pub const fn calling(&self) -> &CallMessage {
        &self.calling
    }

    #[must_use]
    pub const fn settings(&self) -> &RemoteSettingChannel {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut RemoteSettingChannel {
        &mut self.settings
    }

    #[must_use]
    pub const fn config(&self) -> &RigConfig {
        &self.config
    }

    #[must_use]
    pub const fn launcher(&self) -> &L {
        &self.launcher
    }
}

impl<L: RigLauncher> Drop for RigTransceiver<L> {
    fn drop(&mut self) {
        if let Some(mut link) = self.link.take() {
            link.kill();
        }
    }
}
