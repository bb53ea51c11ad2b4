//! In-memory byte pipes standing in for a rig's stdin/stdout.
//!
//! Reads never block: an empty pipe reads as end-of-stream, so a
//! conversation has to be driven in lock-step from one thread.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
struct Pipe {
    buffer: Arc<Mutex<Vec<u8>>>,
    closed: Arc<AtomicBool>,
}

/// Reader end of an in-memory pipe.
#[derive(Debug)]
pub struct DuplexReader {
    pipe: Pipe,
}

/// Writer end of an in-memory pipe.
#[derive(Debug)]
pub struct DuplexWriter {
    pipe: Pipe,
}

impl DuplexWriter {
    /// Close the pipe; later writes fail with `BrokenPipe`.
    pub fn close(&self) {
        self.pipe.closed.store(true, Ordering::Release);
    }
}

/// Create one direction of a pipe.
#[must_use]
pub fn duplex_pair() -> (DuplexWriter, DuplexReader) {
    let pipe = Pipe::default();
    let writer = DuplexWriter { pipe: pipe.clone() };
    let reader = DuplexReader { pipe };
    (writer, reader)
}

impl Read for DuplexReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut buffer = self
            .pipe
            .buffer
            .lock()
            .map_err(|_| std::io::Error::other("lock poisoned"))?;

        let to_read = buffer.len().min(buf.len());
        for (dst, src) in buf.iter_mut().zip(buffer.drain(..to_read)) {
            *dst = src;
        }

        Ok(to_read)
    }
}

impl Write for DuplexWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.pipe.closed.load(Ordering::Acquire) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "pipe closed",
            ));
        }

        let mut buffer = self
            .pipe
            .buffer
            .lock()
            .map_err(|_| std::io::Error::other("lock poisoned"))?;

        buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_pipe_reads_what_was_written() {
        let (mut writer, mut reader) = duplex_pair();
        writer.write_all(b"abc").unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_closed_pipe_rejects_writes() {
        let (mut writer, _reader) = duplex_pair();
        writer.close();
        let err = writer.write(b"x").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
    }
}
