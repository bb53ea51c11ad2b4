//! Frame-level failures. Every variant carries enough context to log
//! without the stream that produced it.

use std::io::ErrorKind as IoErrorKind;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Message too large: {actual_size} bytes (max {max_size} bytes)")]
    MessageTooLarge { actual_size: usize, max_size: usize },

    /// The stream ended mid-frame, or before one started when
    /// `bytes_read` is 0. Usually the rig exited.
    #[error("Unexpected EOF: {bytes_read} bytes read, expected {expected_bytes}")]
    UnexpectedEof {
        bytes_read: usize,
        expected_bytes: usize,
    },

    #[error("Invalid length prefix {length}: {reason}")]
    InvalidLength { length: u32, reason: String },

    /// The peer was built against another protocol version.
    #[error("Protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u16, actual: u16 },

    #[error("Serialization failed: {cause}")]
    SerializationFailed { cause: String },

    #[error("Deserialization failed at {payload_bytes} bytes: {cause}")]
    DeserializationFailed { cause: String, payload_bytes: usize },

    #[error("Write failed: {kind:?} (error code: {error_code:?})")]
    WriteFailed {
        error_code: Option<i32>,
        kind: IoErrorKind,
    },

    #[error("Read failed: {kind:?} (error code: {error_code:?})")]
    ReadFailed {
        error_code: Option<i32>,
        kind: IoErrorKind,
    },
}

impl TransportError {
    #[must_use]
    pub const fn message_too_large(actual_size: usize, max_size: usize) -> Self {
        Self::MessageTooLarge {
            actual_size,
            max_size,
        }
    }

    #[must_use]
    pub const fn unexpected_eof(bytes_read: usize, expected_bytes: usize) -> Self {
        Self::UnexpectedEof {
            bytes_read,
            expected_bytes,
        }
    }

    pub fn invalid_length(length: u32, reason: impl Into<String>) -> Self {
        Self::InvalidLength {
            length,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn version_mismatch(expected: u16, actual: u16) -> Self {
        Self::VersionMismatch { expected, actual }
    }

    pub fn serialization_failed(cause: impl Into<String>) -> Self {
        Self::SerializationFailed {
            cause: cause.into(),
        }
    }

    pub fn deserialization_failed(cause: impl Into<String>, payload_bytes: usize) -> Self {
        Self::DeserializationFailed {
            cause: cause.into(),
            payload_bytes,
        }
    }

    #[must_use]
    pub fn write_failed(err: &std::io::Error) -> Self {
        Self::WriteFailed {
            error_code: err.raw_os_error(),
            kind: err.kind(),
        }
    }

    #[must_use]
    pub fn read_failed(err: &std::io::Error) -> Self {
        Self::ReadFailed {
            error_code: err.raw_os_error(),
            kind: err.kind(),
        }
    }

    /// Whether the error means the peer is gone rather than misbehaving.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::UnexpectedEof { .. } => true,
            Self::WriteFailed { kind, .. } | Self::ReadFailed { kind, .. } => matches!(
                kind,
                IoErrorKind::BrokenPipe
                    | IoErrorKind::ConnectionReset
                    | IoErrorKind::ConnectionAborted
                    | IoErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}

pub type TransportResult<T> = Result<T, TransportError>;
