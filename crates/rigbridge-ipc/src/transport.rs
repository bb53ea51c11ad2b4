//! Transport layer for length-prefixed bincode frames
//!
//! The free functions ([`encode_frame`], [`validate_length`],
//! [`decode_payload`]) hold the framing rules so async readers can share
//! them with the blocking [`IpcTransport`].
//!
//! # Thread Safety
//! - `!Sync` (must be externally synchronized)

use std::io::{BufReader, BufWriter, Read, Write};

use serde::{Serialize, de::DeserializeOwned};

use crate::envelope::{Envelope, PROTOCOL_VERSION};
use crate::memory::{DuplexReader, DuplexWriter, duplex_pair};
use crate::{
    LENGTH_PREFIX_SIZE, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE, TransportError, TransportResult,
};

/// Serialize any value into a complete frame (length prefix + payload).
///
/// # Errors
/// - `SerializationFailed` if bincode fails
/// - `MessageTooLarge` if the payload exceeds [`MAX_PAYLOAD_SIZE`]
pub fn encode_frame<T: Serialize + ?Sized>(msg: &T) -> TransportResult<Vec<u8>> {
    let payload = bincode::serde::encode_to_vec(msg, bincode::config::standard())
        .map_err(|e| TransportError::serialization_failed(e.to_string()))?;

    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(TransportError::message_too_large(
            payload.len(),
            MAX_PAYLOAD_SIZE,
        ));
    }

    let length = u32::try_from(payload.len())
        .map_err(|_| TransportError::message_too_large(payload.len(), MAX_PAYLOAD_SIZE))?;

    let mut frame = Vec::with_capacity(LENGTH_PREFIX_SIZE.saturating_add(payload.len()));
    frame.extend_from_slice(&length.to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Check a decoded length prefix and return the payload size it announces.
///
/// # Errors
/// `InvalidLength` for zero or anything above [`MAX_PAYLOAD_SIZE`].
pub fn validate_length(length: u32) -> TransportResult<usize> {
    if length == 0 {
        return Err(TransportError::invalid_length(0, "zero-length payload"));
    }

    let size = usize::try_from(length)
        .map_err(|_| TransportError::invalid_length(length, "does not fit in memory"))?;

    if size > MAX_PAYLOAD_SIZE {
        return Err(TransportError::invalid_length(
            length,
            format!("exceeds maximum of {MAX_PAYLOAD_SIZE} bytes"),
        ));
    }

    Ok(size)
}

/// Decode an envelope payload, rejecting foreign protocol versions before
/// the body is touched.
///
/// # Errors
/// - `VersionMismatch` if the leading version differs from [`PROTOCOL_VERSION`]
/// - `DeserializationFailed` if bincode fails
pub fn decode_payload<T: DeserializeOwned>(payload: &[u8]) -> TransportResult<Envelope<T>> {
    let (version, _) =
        bincode::serde::decode_from_slice::<u16, _>(payload, bincode::config::standard())
            .map_err(|e| TransportError::deserialization_failed(e.to_string(), payload.len()))?;

    if version != PROTOCOL_VERSION {
        return Err(TransportError::version_mismatch(PROTOCOL_VERSION, version));
    }

    let (envelope, _) = bincode::serde::decode_from_slice(payload, bincode::config::standard())
        .map_err(|e| TransportError::deserialization_failed(e.to_string(), payload.len()))?;

    Ok(envelope)
}

fn map_read_error(err: &std::io::Error, bytes_read: usize, expected: usize) -> TransportError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        TransportError::unexpected_eof(bytes_read, expected)
    } else {
        TransportError::read_failed(err)
    }
}

/// Blocking transport over any reader/writer pair.
///
/// # Example
/// ```rust
/// use rigbridge_ipc::IpcTransport;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (mut client, mut server) = IpcTransport::memory_pair();
///
/// client.send(&"hello world".to_string())?;
/// let received = server.recv::<String>()?;
/// assert_eq!(received, "hello world");
/// # Ok(())
/// # }
/// ```
pub struct IpcTransport<R, W: Write> {
    reader: BufReader<R>,
    writer: BufWriter<W>,
}

impl<R: Read, W: Write> IpcTransport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::with_capacity(MAX_FRAME_SIZE, reader),
            writer: BufWriter::with_capacity(MAX_FRAME_SIZE, writer),
        }
    }

    /// Send one unversioned value as a frame and flush.
    ///
    /// # Errors
    /// - `SerializationFailed` / `MessageTooLarge` from [`encode_frame`]
    /// - `WriteFailed` if the stream write or flush fails
    pub fn send<T: Serialize + ?Sized>(&mut self, msg: &T) -> TransportResult<()> {
        let frame = encode_frame(msg)?;
        self.write_frame(&frame)
    }

    /// Wrap `body` in a current-version [`Envelope`] and send it.
    ///
    /// # Errors
    /// Same as [`IpcTransport::send`].
    pub fn send_envelope<T: Serialize>(&mut self, seq: u64, body: &T) -> TransportResult<()> {
        self.send(&Envelope::new(seq, body))
    }

    /// Receive one unversioned value.
    ///
    /// # Errors
    /// - `UnexpectedEof` if the stream ends mid-frame
    /// - `InvalidLength` if the prefix is zero or above 1MB
    /// - `DeserializationFailed` if bincode fails
    /// - `ReadFailed` if the stream read fails
    pub fn recv<T: DeserializeOwned>(&mut self) -> TransportResult<T> {
        let payload = self.read_frame()?;
        let (value, _) = bincode::serde::decode_from_slice(&payload, bincode::config::standard())
            .map_err(|e| TransportError::deserialization_failed(e.to_string(), payload.len()))?;
        Ok(value)
    }

    /// Receive one [`Envelope`], checking its protocol version.
    ///
    /// # Errors
    /// Same as [`IpcTransport::recv`], plus `VersionMismatch`.
    pub fn recv_envelope<T: DeserializeOwned>(&mut self) -> TransportResult<Envelope<T>> {
        let payload = self.read_frame()?;
        decode_payload(&payload)
    }

    fn write_frame(&mut self, frame: &[u8]) -> TransportResult<()> {
        self.writer
            .write_all(frame)
            .map_err(|e| TransportError::write_failed(&e))?;
        self.writer
            .flush()
            .map_err(|e| TransportError::write_failed(&e))
    }

    fn read_frame(&mut self) -> TransportResult<Vec<u8>> {
        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        self.reader
            .read_exact(&mut prefix)
            .map_err(|e| map_read_error(&e, 0, LENGTH_PREFIX_SIZE))?;

        let payload_length = validate_length(u32::from_be_bytes(prefix))?;

        let mut payload = vec![0u8; payload_length];
        self.reader.read_exact(&mut payload).map_err(|e| {
            map_read_error(
                &e,
                LENGTH_PREFIX_SIZE,
                LENGTH_PREFIX_SIZE.saturating_add(payload_length),
            )
        })?;

        Ok(payload)
    }

    /// Number of bytes buffered but not yet consumed.
    pub fn buffered_bytes(&self) -> usize {
        self.reader.buffer().len()
    }

    /// Split transport into reader and writer components.
    pub fn split(self) -> (BufReader<R>, BufWriter<W>) {
        (self.reader, self.writer)
    }
}

impl IpcTransport<DuplexReader, DuplexWriter> {
    /// Two transports joined back to back through in-memory pipes.
    #[must_use]
    pub fn memory_pair() -> (Self, Self) {
        let (client_writer, server_reader) = duplex_pair();
        let (server_writer, client_reader) = duplex_pair();

        (
            Self::new(client_reader, client_writer),
            Self::new(server_reader, server_writer),
        )
    }
}
