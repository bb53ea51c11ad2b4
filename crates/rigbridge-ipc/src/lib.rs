//! rigbridge IPC - versioned, length-prefixed frames between the editor and a rig
//!
//! The editor and the rig exchange exactly one [`CallMessage`] and one
//! [`RespondMessage`] per editor frame over the rig's stdin/stdout pipes.
//!
//! # Protocol
//!
//! Every message frame consists of:
//! - **Length prefix**: 4-byte big-endian u32 indicating payload size
//! - **Payload**: Bincode-encoded [`Envelope`] (protocol version, sequence, body)
//!
//! ```text
//! +--------+--------+--------+--------+--------------------------+
//! | Byte 0 | Byte 1 | Byte 2 | Byte 3 | Bytes 4..(4+N)           |
//! |--------+--------+--------+--------+--------------------------|
//! |          Length (big-endian u32)  |  Envelope { version,     |
//! |           N = payload size        |    seq, body } (bincode) |
//! +--------+--------+--------+--------+--------------------------+
//! ```
//!
//! # Constraints
//!
//! - Maximum message size: 1MB (1,048,576 bytes)
//! - Length prefix is big-endian byte order
//! - Empty payloads (length = 0) are rejected
//! - A frame whose envelope carries another protocol version is rejected
//!   before its body is decoded
//!
//! # Example
//!
//! ```rust
//! use rigbridge_ipc::{CallMessage, IpcTransport, RespondMessage};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (mut editor, mut rig) = IpcTransport::memory_pair();
//!
//! editor.send_envelope(1, &CallMessage::default())?;
//! let call = rig.recv_envelope::<CallMessage>()?;
//! assert_eq!(call.seq, 1);
//!
//! rig.send_envelope(call.seq, &RespondMessage::default())?;
//! let respond = editor.recv_envelope::<RespondMessage>()?;
//! assert_eq!(respond.seq, 1);
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

mod endpoint;
mod envelope;
mod error;
pub mod memory;
mod messages;
mod settings;
mod transport;

pub use endpoint::RigEndpoint;
pub use envelope::{Envelope, PROTOCOL_VERSION};
pub use error::{TransportError, TransportResult};
pub use messages::{
    AudioActions, CallMessage, CharRequest, Color32, DeviceInput, DoodleRect, DoodleWorld,
    EffectParams, FRect, Float2, GizmoLine, GizmoRect, IRect, Int2, MusicRequest, RenderView,
    RespondMessage, SoundRequest, Vignette,
};
pub use settings::RemoteSetting;
pub use transport::{IpcTransport, decode_payload, encode_frame, validate_length};

/// Maximum allowed payload size in bytes (1MB)
pub const MAX_PAYLOAD_SIZE: usize = 1_048_576;

/// Length prefix size in bytes
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Maximum frame size (length prefix + max payload)
pub const MAX_FRAME_SIZE: usize = LENGTH_PREFIX_SIZE + MAX_PAYLOAD_SIZE;
