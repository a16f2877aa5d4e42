//! Serializes an [`HttpHeader`] into the header [`Buffer`] of an output.
//!
//! The head is written in one piece: start line tokens joined by single
//! spaces, one `name: value` line per field in insertion order, then the blank
//! line. It must fit the remaining space of the buffer, minus whatever the
//! caller reserves for chunk framing; the encoder never writes a partial head.

use tracing::error;

use crate::buffer::Buffer;
use crate::protocol::{HttpHeader, SendError};

/// Encoder for HTTP message heads.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderEncoder;

impl HeaderEncoder {
    /// Encodes `header` into `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::HeaderTooLarge`] if the encoded head does not fit
    /// the space left in `dst`; nothing is written in that case.
    pub fn encode(&mut self, header: &HttpHeader, dst: &mut Buffer) -> Result<(), SendError> {
        self.encode_reserving(header, dst, 0)
    }

    /// Encodes `header` into `dst`, leaving at least `reserve` bytes free for
    /// framing that follows the head in the same buffer.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::HeaderTooLarge`] if the head and the reserve do not
    /// fit together.
    pub fn encode_reserving(&mut self, header: &HttpHeader, dst: &mut Buffer, reserve: usize) -> Result<(), SendError> {
        let len = header.encoded_len();
        if len + reserve > dst.space() {
            error!(len, reserve, capacity = dst.capacity(), "http head does not fit the header buffer");
            return Err(SendError::header_too_large(dst.capacity()));
        }

        for (i, token) in header.start_line().enumerate() {
            if i > 0 {
                dst.put(b' ')?;
            }
            dst.put_slice(token)?;
        }
        dst.put_slice(b"\r\n")?;

        for field in header.iter() {
            dst.put_slice(field.name())?;
            dst.put_slice(b": ")?;
            dst.put_slice(field.value())?;
            dst.put_slice(b"\r\n")?;
        }
        dst.put_slice(b"\r\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn encodes_response_head() {
        let mut header = HttpHeader::response(200);
        header.add("content-type", "text/plain");
        header.add("X-Trace", "a");
        header.add("X-Trace", "b");

        let mut dst = Buffer::with_capacity(128);
        HeaderEncoder.encode(&header, &mut dst).unwrap();

        let expected = indoc! {"
            HTTP/1.1 200 OK
            Content-Type: text/plain
            X-Trace: a
            X-Trace: b

        "};
        assert_eq!(dst.to_string_lossy(), expected.replace('\n', "\r\n"));
        assert_eq!(dst.len(), header.encoded_len());
    }

    #[test]
    fn encodes_request_head() {
        let mut header = HttpHeader::request("GET", "/index.html", "HTTP/1.0");
        header.add("Host", "localhost");

        let mut dst = Buffer::with_capacity(128);
        HeaderEncoder.encode(&header, &mut dst).unwrap();
        assert_eq!(dst.to_string_lossy(), "GET /index.html HTTP/1.0\r\nHost: localhost\r\n\r\n");
    }

    #[test]
    fn rejects_head_larger_than_buffer() {
        let mut header = HttpHeader::response(200);
        header.add("X-Large", "x".repeat(64));

        let mut dst = Buffer::with_capacity(32);
        let err = HeaderEncoder.encode(&header, &mut dst).unwrap_err();
        assert!(matches!(err, SendError::HeaderTooLarge { capacity: 32 }));
        assert!(dst.is_empty());
    }

    #[test]
    fn reserve_counts_against_the_buffer() {
        let header = HttpHeader::response(200);
        let len = header.encoded_len();

        let mut dst = Buffer::with_capacity(len + 4);
        HeaderEncoder.encode_reserving(&header, &mut dst, 4).unwrap();
        assert_eq!(dst.space(), 4);

        let mut dst = Buffer::with_capacity(len + 3);
        let err = HeaderEncoder.encode_reserving(&header, &mut dst, 4).unwrap_err();
        assert!(matches!(err, SendError::HeaderTooLarge { .. }));
        assert!(dst.is_empty());
    }
}
