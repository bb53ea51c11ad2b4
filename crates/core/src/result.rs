//! Result alias and fallbacks for lookups that may fail without stopping
//! a build or a frame.

use tracing::warn;

use crate::error::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Degrade a failed lookup to a fallback value, leaving a warning that
/// names what was being looked up.
pub trait ResultExt<T> {
    /// The value, or `None` after logging the failure.
    fn ok_logged(self, what: &str) -> Option<T>;

    /// The value, or `default` after logging the failure.
    fn or_default_logged(self, what: &str, default: T) -> T;
}

impl<T> ResultExt<T> for Result<T> {
    fn ok_logged(self, what: &str) -> Option<T> {
        self.map_err(|e| warn!(error = %e, "Failed to {what}")).ok()
    }

    fn or_default_logged(self, what: &str, default: T) -> T {
        self.ok_logged(what).unwrap_or(default)
    }
}
