//! Versioned frame body.

use serde::{Deserialize, Serialize};

/// Wire protocol version spoken by this build.
///
/// Bump whenever a field is added to, removed from or reordered in
/// [`crate::CallMessage`] or [`crate::RespondMessage`].
pub const PROTOCOL_VERSION: u16 = 1;

/// Body of every frame: the protocol version, a sequence number pairing a
/// respond with the call that triggered it, and the message itself.
///
/// `version` is the first field so it can be decoded on its own before the
/// body is trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub version: u16,
    pub seq: u64,
    pub body: T,
}

impl<T> Envelope<T> {
    /// Wrap `body` with the current protocol version.
    pub const fn new(seq: u64, body: T) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            seq,
            body,
        }
    }
}
