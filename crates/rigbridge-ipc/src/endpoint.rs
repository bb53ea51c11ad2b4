//! Rig side of the protocol.

use std::io::{Read, Stdin, Stdout, Write};

use crate::messages::{CallMessage, RespondMessage};
use crate::transport::IpcTransport;
use crate::{TransportError, TransportResult};

/// Serves calls from the editor: read a call, answer it with the same
/// sequence number.
pub struct RigEndpoint<R, W: Write> {
    transport: IpcTransport<R, W>,
    last_seq: Option<u64>,
}

impl RigEndpoint<Stdin, Stdout> {
    /// Endpoint on the process's own stdin/stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(IpcTransport::new(std::io::stdin(), std::io::stdout()))
    }
}

impl<R: Read, W: Write> RigEndpoint<R, W> {
    pub const fn new(transport: IpcTransport<R, W>) -> Self {
        Self {
            transport,
            last_seq: None,
        }
    }

    /// Block until the next call arrives.
    ///
    /// Returns `Ok(None)` when the editor closed the pipe cleanly between
    /// frames.
    ///
    /// # Errors
    /// Any transport error other than a clean end-of-stream.
    pub fn next_call(&mut self) -> TransportResult<Option<(u64, CallMessage)>> {
        match self.transport.recv_envelope::<CallMessage>() {
            Ok(envelope) => {
                self.last_seq = Some(envelope.seq);
                Ok(Some((envelope.seq, envelope.body)))
            }
            Err(TransportError::UnexpectedEof { bytes_read: 0, .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Answer the call numbered `seq`.
    ///
    /// # Errors
    /// Transport write errors.
    pub fn reply(&mut self, seq: u64, respond: &RespondMessage) -> TransportResult<()> {
        self.transport.send_envelope(seq, respond)
    }

    /// Sequence number of the most recent call received.
    pub const fn last_seq(&self) -> Option<u64> {
        self.last_seq
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_endpoint_answers_with_call_sequence() {
        let (mut editor, rig) = IpcTransport::memory_pair();
        let mut endpoint = RigEndpoint::new(rig);

        editor.send_envelope(5, &CallMessage::default()).unwrap();
        let (seq, _call) = endpoint.next_call().unwrap().unwrap();
        assert_eq!(seq, 5);
        assert_eq!(endpoint.last_seq(), Some(5));

        let respond = RespondMessage {
            global_frame: 100,
            ..RespondMessage::default()
        };
        endpoint.reply(seq, &respond).unwrap();

        let answer = editor.recv_envelope::<RespondMessage>().unwrap();
        assert_eq!(answer.seq, 5);
        assert_eq!(answer.body.global_frame, 100);
    }

    #[test]
    fn test_endpoint_reports_clean_close() {
        let (_editor, rig) = IpcTransport::memory_pair();
        let mut endpoint = RigEndpoint::new(rig);
        assert!(endpoint.next_call().unwrap().is_none());
    }
}
