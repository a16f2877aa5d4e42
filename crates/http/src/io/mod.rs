//! Byte sources and sinks feeding the parser and draining the output.
//!
//! The engine never touches a socket itself. It asks a [`ByteSource`] to
//! append whatever is available to a [`Buffer`], and asks a [`ByteSink`] to
//! take bytes out of one. Neither call is expected to wait: a source with
//! nothing to offer reports `Fill::Filled(0)`, a sink that cannot accept
//! anything reports `0` written.
//!
//! # Components
//!
//! - [`ByteArrayEndPoint`]: scripted in-memory source and collecting sink
//! - [`StreamEndPoint`]: any blocking `Read + Write` stream
//! - [`TcpEndPoint`]: a non-blocking tokio TCP stream with readiness helpers

mod byte_array;
mod stream;
mod tcp;

pub use byte_array::ByteArrayEndPoint;
pub use stream::StreamEndPoint;
pub use tcp::TcpEndPoint;

use std::io;

use crate::buffer::Buffer;

/// Outcome of one [`ByteSource::fill`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Fill {
    /// That many bytes were appended; zero means nothing is available right now
    Filled(usize),
    /// The source has ended and will never produce more bytes
    Eof,
}

impl Fill {
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, Fill::Eof)
    }
}

pub trait ByteSource {
    /// Appends available bytes after the buffer's write cursor.
    fn fill(&mut self, buffer: &mut Buffer) -> io::Result<Fill>;

    /// Closes the source. Later fills report [`Fill::Eof`].
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn is_open(&self) -> bool {
        true
    }
}

pub trait ByteSink {
    /// Writes unread bytes of `buffer`, advancing its read cursor by the amount written.
    fn flush(&mut self, buffer: &mut Buffer) -> io::Result<usize>;

    /// Writes `header`, `body` and `trailer` in that order as one logical write.
    ///
    /// Stops at the first buffer that could not be written completely, so the
    /// three are never interleaved on the wire.
    fn flush_gathered(&mut self, header: &mut Buffer, body: &mut Buffer, trailer: &mut Buffer) -> io::Result<usize> {
        let mut written = 0;
        for buffer in [header, body, trailer] {
            if buffer.is_empty() {
                continue;
            }
            written += self.flush(buffer)?;
            if buffer.has_content() {
                break;
            }
        }
        Ok(written)
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: ByteSource + ?Sized> ByteSource for &mut T {
    fn fill(&mut self, buffer: &mut Buffer) -> io::Result<Fill> {
        (**self).fill(buffer)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}

impl<T: ByteSink + ?Sized> ByteSink for &mut T {
    fn flush(&mut self, buffer: &mut Buffer) -> io::Result<usize> {
        (**self).flush(buffer)
    }

    fn flush_gathered(&mut self, header: &mut Buffer, body: &mut Buffer, trailer: &mut Buffer) -> io::Result<usize> {
        (**self).flush_gathered(header, body, trailer)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Fills from a reader straight into the buffer's free space.
pub(crate) fn fill_from<R: io::Read>(reader: &mut R, buffer: &mut Buffer) -> io::Result<Fill> {
    let spare = buffer.spare_mut()?;
    if spare.is_empty() {
        return Ok(Fill::Filled(0));
    }

    match reader.read(spare) {
        Ok(0) => Ok(Fill::Eof),
        Ok(n) => {
            buffer.advance_put(n)?;
            Ok(Fill::Filled(n))
        }
        Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => Ok(Fill::Filled(0)),
        Err(e) => Err(e),
    }
}

/// Flushes the unread bytes of the buffer into a writer.
pub(crate) fn flush_into<W: io::Write>(writer: &mut W, buffer: &mut Buffer) -> io::Result<usize> {
    if buffer.is_empty() {
        return Ok(0);
    }

    let result = writer.write(&buffer.slice());
    match result {
        Ok(n) => Ok(buffer.skip(n)),
        Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => Ok(0),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// accepts at most `limit` bytes per flush
    struct Trickle {
        limit: usize,
        written: Vec<u8>,
    }

    impl ByteSink for Trickle {
        fn flush(&mut self, buffer: &mut Buffer) -> io::Result<usize> {
            let view = buffer.get_bytes(self.limit);
            self.written.extend_from_slice(&view);
            Ok(view.len())
        }
    }

    fn filled(bytes: &[u8]) -> Buffer {
        let mut buffer = Buffer::with_capacity(16);
        buffer.put_slice(bytes).unwrap();
        buffer
    }

    #[test]
    fn gathered_flush_keeps_order_on_partial_writes() {
        let mut sink = Trickle { limit: 3, written: Vec::new() };
        let (mut header, mut body, mut trailer) = (filled(b"5\r\n"), filled(b"hello"), filled(b"\r\n"));

        assert_eq!(sink.flush_gathered(&mut header, &mut body, &mut trailer).unwrap(), 6);
        assert_eq!(sink.written, b"5\r\nhel");
        assert_eq!(sink.flush_gathered(&mut header, &mut body, &mut trailer).unwrap(), 4);
        assert_eq!(sink.written, b"5\r\nhello\r\n");
        assert!(header.is_empty() && body.is_empty() && trailer.is_empty());
    }

    #[test]
    fn reader_fill_and_writer_flush() {
        let mut reader = &b"abc"[..];
        let mut buffer = Buffer::with_capacity(8);
        assert_eq!(fill_from(&mut reader, &mut buffer).unwrap(), Fill::Filled(3));
        assert_eq!(fill_from(&mut reader, &mut buffer).unwrap(), Fill::Eof);

        let mut out = Vec::new();
        assert_eq!(flush_into(&mut out, &mut buffer).unwrap(), 3);
        assert_eq!(out, b"abc");
        assert!(buffer.is_empty());
    }
}
