use serde::{Deserialize, Serialize};

/// One `(id, value)` pair pushed from the editor into the rig.
///
/// The protocol never interprets `id`; each editor feature and its rig-side
/// counterpart agree on their own ids. Fractional values travel as fixed
/// point scaled by [`RemoteSetting::SCALE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteSetting {
    pub id: i32,
    pub value: i32,
}

impl RemoteSetting {
    /// Fixed-point scale for fractional setting values.
    pub const SCALE: f32 = 1000.0;

    #[must_use]
    pub const fn new(id: i32, value: i32) -> Self {
        Self { id, value }
    }

    #[must_use]
    pub const fn flag(id: i32, enabled: bool) -> Self {
        Self {
            id,
            value: if enabled { 1 } else { 0 },
        }
    }

    /// Encode a fractional value as fixed point (truncating, like the rig).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn scaled(id: i32, value: f32) -> Self {
        Self {
            id,
            value: (value * Self::SCALE) as i32,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> bool {
        self.value != 0
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_scaled(&self) -> f32 {
        self.value as f32 / Self::SCALE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_encoding() {
        assert_eq!(RemoteSetting::flag(7, true).value, 1);
        assert!(!RemoteSetting::flag(7, false).as_bool());
    }

    #[test]
    fn test_scaled_encoding_truncates() {
        let setting = RemoteSetting::scaled(3, 0.4567);
        assert_eq!(setting.value, 456);
        assert!((setting.as_scaled() - 0.456).abs() < f32::EPSILON);
    }
}
