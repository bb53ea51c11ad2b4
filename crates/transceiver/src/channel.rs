//! Remote settings waiting for the next exchange.
//!
//! Settings are only dropped once an exchange that carried them succeeded,
//! or when the rig is aborted.

use rigbridge_ipc::{CallMessage, RemoteSetting};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSettingChannel {
    pending: Vec<RemoteSetting>,
    in_flight: usize,
}

impl RemoteSettingChannel {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
            in_flight: 0,
        }
    }

    pub fn push(&mut self, id: i32, value: i32) {
        self.pending.push(RemoteSetting::new(id, value));
    }

    pub fn push_bool(&mut self, id: i32, enabled: bool) {
        self.pending.push(RemoteSetting::flag(id, enabled));
    }

    /// Push a fractional value as x1000 fixed point.
    pub fn push_scaled(&mut self, id: i32, value: f32) {
        self.pending.push(RemoteSetting::scaled(id, value));
    }

    /// Settings for the next call, oldest first, capped at
    /// [`CallMessage::REMOTE_SETTING_CAPACITY`]. They stay pending until
    /// [`RemoteSettingChannel::acknowledge`].
    pub fn outgoing(&mut self) -> Vec<RemoteSetting> {
        let count = self.pending.len().min(CallMessage::REMOTE_SETTING_CAPACITY);
        self.in_flight = count;
        self.pending.iter().take(count).copied().collect()
    }

    /// The exchange carrying the last [`RemoteSettingChannel::outgoing`]
    /// batch succeeded.
    pub fn acknowledge(&mut self) {
        let delivered = self.in_flight.min(self.pending.len());
        self.pending.drain(..delivered);
        self.in_flight = 0;
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.in_flight = 0;
    }

    #[must_use]
    pub fn pending(&self) -> &[RemoteSetting] {
        &self.pending
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
