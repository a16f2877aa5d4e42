use std::io::Write;

use crate::buffer::Buffer;
use crate::protocol::SendError;

/// Frames content as `<hex-size>CRLF<bytes>CRLF` chunks.
///
/// The size line goes after whatever the head buffer already holds and the
/// closing CRLF into the tail buffer, so the content itself is flushed
/// straight from the body buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkedEncoder {
    eof: bool,
}

impl ChunkedEncoder {
    /// The longest size line: every hex digit of a `usize` and the CRLF.
    pub const MAX_SIZE_LINE: usize = 2 * size_of::<usize>() + 2;

    pub fn new() -> Self {
        Self { eof: false }
    }

    /// Frames a chunk of `len` bytes. An empty chunk would read as the last
    /// chunk and is skipped.
    pub fn encode(&mut self, len: usize, head: &mut Buffer, tail: &mut Buffer) -> Result<(), SendError> {
        if self.eof || len == 0 {
            return Ok(());
        }

        write!(head, "{len:X}\r\n")?;
        tail.put_slice(b"\r\n")?;
        Ok(())
    }

    /// Writes the last chunk and the empty trailer.
    pub fn encode_eof(&mut self, tail: &mut Buffer) -> Result<(), SendError> {
        if self.eof {
            return Ok(());
        }

        self.eof = true;
        tail.put_slice(b"0\r\n\r\n")?;
        Ok(())
    }

    pub fn is_finish(&self) -> bool {
        self.eof
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_chunks_and_last_chunk() {
        let mut encoder = ChunkedEncoder::new();
        let mut head = Buffer::with_capacity(16);
        let mut tail = Buffer::with_capacity(16);

        encoder.encode(26, &mut head, &mut tail).unwrap();
        encoder.encode(0, &mut head, &mut tail).unwrap();
        assert_eq!(head.to_string_lossy(), "1A\r\n");
        assert_eq!(tail.to_string_lossy(), "\r\n");

        encoder.encode_eof(&mut tail).unwrap();
        encoder.encode_eof(&mut tail).unwrap();
        assert!(encoder.is_finish());
        assert_eq!(tail.to_string_lossy(), "\r\n0\r\n\r\n");

        // nothing after the last chunk
        encoder.encode(4, &mut head, &mut tail).unwrap();
        assert_eq!(head.to_string_lossy(), "1A\r\n");
    }

    #[test]
    fn largest_size_line_fits_the_reserve() {
        let mut encoder = ChunkedEncoder::new();
        let mut head = Buffer::with_capacity(ChunkedEncoder::MAX_SIZE_LINE);
        let mut tail = Buffer::with_capacity(2);

        encoder.encode(usize::MAX, &mut head, &mut tail).unwrap();
        assert_eq!(head.space(), 0);
    }
}
