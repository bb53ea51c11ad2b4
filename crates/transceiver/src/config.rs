//! Rig and backoff settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the rig process is run and talked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// Pass `DontCloseCmd` so the rig keeps its console open.
    pub keep_console: bool,
    /// Prefix the rig's log lines with [`RigConfig::log_prefix`].
    pub add_log_prefix: bool,
    pub log_prefix: String,
    /// Milliseconds one exchange may wait for the rig's respond.
    pub exchange_timeout_ms: u64,
    /// Consecutive unanswered frames after which the rig counts as hung.
    pub max_unresponsive_frames: u32,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            keep_console: false,
            add_log_prefix: true,
            log_prefix: "[Rig] ".to_string(),
            exchange_timeout_ms: 200,
            max_unresponsive_frames: 120,
        }
    }
}

impl RigConfig {
    #[must_use]
    pub const fn exchange_timeout(&self) -> Duration {
        Duration::from_millis(self.exchange_timeout_ms)
    }

    /// Prefix to put in front of each rig log line, if any.
    #[must_use]
    pub fn effective_prefix(&self) -> &str {
        if self.add_log_prefix {
            &self.log_prefix
        } else {
            ""
        }
    }
}

/// Start retry policy, in editor frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Frames to wait after a failed start while under the threshold.
    pub retry_delay_frames: u64,
    /// Consecutive failures after which only slow retries happen.
    pub fail_threshold: u32,
    /// Frames between retries once the threshold is reached.
    pub slow_retry_frames: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            retry_delay_frames: 30,
            fail_threshold: 16,
            slow_retry_frames: 6000,
        }
    }
}
