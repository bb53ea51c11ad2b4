//! Start retry scheduling.
//!
//! After a failed start the next attempt waits `retry_delay_frames`; once
//! `fail_threshold` consecutive failures pile up it waits
//! `slow_retry_frames` instead. There is no terminal give-up state.

use tracing::debug;

use crate::config::BackoffConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartBackoff {
    config: BackoffConfig,
    fail_count: u32,
    /// Frame of the most recent failure; `None` is the "never failed" sentinel.
    fail_frame: Option<u64>,
}

impl Default for StartBackoff {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}

impl StartBackoff {
    #[must_use]
    pub const fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            fail_count: 0,
            fail_frame: None,
        }
    }

    /// Whether a start attempt is allowed on `frame`.
    #[must_use]
    pub const fn is_due(&self, frame: u64) -> bool {
        let Some(fail_frame) = self.fail_frame else {
            return true;
        };
        (self.fail_count < self.config.fail_threshold
            && frame > fail_frame.saturating_add(self.config.retry_delay_frames))
            || frame > fail_frame.saturating_add(self.config.slow_retry_frames)
    }

    /// First frame on which [`StartBackoff::is_due`] holds.
    #[must_use]
    pub const fn next_attempt_frame(&self) -> u64 {
        let Some(fail_frame) = self.fail_frame else {
            return 0;
        };
        let wait = if self.fail_count < self.config.fail_threshold {
            self.config.retry_delay_frames
        } else {
            self.config.slow_retry_frames
        };
        fail_frame.saturating_add(wait).saturating_add(1)
    }

    pub fn record_failure(&mut self, frame: u64) {
        self.fail_count = self.fail_count.saturating_add(1);
        self.fail_frame = Some(frame);
        debug!(
            fail_count = self.fail_count,
            next_frame = self.next_attempt_frame(),
            "Rig start failed"
        );
    }

    /// Back to the initial sentinel values.
    pub const fn reset(&mut self) {
        self.fail_count = 0;
        self.fail_frame = None;
    }

    #[must_use]
    pub const fn fail_count(&self) -> u32 {
        self.fail_count
    }

    #[must_use]
    pub const fn fail_frame(&self) -> Option<u64> {
        self.fail_frame
    }

    #[must_use]
    pub const fn config(&self) -> &BackoffConfig {
        &self.config
    }
}
