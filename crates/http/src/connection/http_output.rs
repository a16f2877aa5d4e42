use std::io;

use tracing::{trace, warn};

use crate::buffer::Buffer;
use crate::codec::{HeaderEncoder, PayloadEncoder};
use crate::ensure;
use crate::io::ByteSink;
use crate::protocol::{ContentLength, HttpHeader, SendError};

/// Default capacity of the buffer the head is serialized into.
pub const DEFAULT_HEADER_BUFFER_SIZE: usize = 4 * 1024;

/// Default capacity of the buffer collecting written content.
pub const DEFAULT_BODY_BUFFER_SIZE: usize = 8 * 1024;

// room for a chunk CRLF followed by the last chunk
const TAIL_BUFFER_SIZE: usize = 16;

/// Writer of one HTTP message at a time to a [`ByteSink`].
///
/// Content is collected in a body buffer. The first flush commits: it picks
/// the framing (see [`PayloadEncoder::decide`]) and serializes the head.
/// Every flush then frames the buffered content and hands head, body and
/// tail buffers to the sink in one gathered write.
///
/// Nothing here waits. When the sink takes only part of the bytes the output
/// keeps them and stays flushing: [`HttpOutput::flush`] and
/// [`HttpOutput::close`] return `false`, and [`HttpOutput::write`] accepts
/// nothing, until a later call gets them out.
#[derive(Debug)]
pub struct HttpOutput<W> {
    sink: W,
    header: HttpHeader,
    head: Buffer,
    body: Buffer,
    tail: Buffer,
    encoder: Option<PayloadEncoder>,
    head_response: bool,
    written: u64,
    closed: bool,
    flushing: bool,
}

impl<W: ByteSink> HttpOutput<W> {
    pub fn new(sink: W) -> Self {
        Self::with_capacity(sink, DEFAULT_HEADER_BUFFER_SIZE, DEFAULT_BODY_BUFFER_SIZE)
    }

    /// `header_capacity` bounds the serialized head, `body_capacity` is how
    /// much content is collected before a write forces a flush.
    pub fn with_capacity(sink: W, header_capacity: usize, body_capacity: usize) -> Self {
        Self {
            sink,
            header: HttpHeader::response(200),
            head: Buffer::with_capacity(header_capacity),
            body: Buffer::with_capacity(body_capacity),
            tail: Buffer::with_capacity(TAIL_BUFFER_SIZE),
            encoder: None,
            head_response: false,
            written: 0,
            closed: false,
            flushing: false,
        }
    }

    pub fn header(&self) -> &HttpHeader {
        &self.header
    }

    /// The outgoing head, editable until it is committed.
    pub fn header_mut(&mut self) -> Result<&mut HttpHeader, SendError> {
        ensure!(!self.is_committed(), SendError::Committed);
        Ok(&mut self.header)
    }

    pub fn set_header(&mut self, header: HttpHeader) -> Result<(), SendError> {
        *self.header_mut()? = header;
        Ok(())
    }

    /// Marks the message as the response to a HEAD request: the head is sent
    /// as usual, written content is discarded.
    pub fn set_head_response(&mut self, head_response: bool) {
        self.head_response = head_response;
    }

    #[inline]
    pub fn is_committed(&self) -> bool {
        self.encoder.is_some()
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Bytes are waiting for the sink.
    #[inline]
    pub fn is_flushing(&self) -> bool {
        self.flushing
    }

    /// Content bytes accepted so far.
    #[inline]
    pub fn written(&self) -> u64 {
        self.written
    }

    /// The framing chosen at commit.
    pub fn content_length(&self) -> Option<ContentLength> {
        self.encoder.as_ref().map(PayloadEncoder::content_length)
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Copies as much of `content` as the body buffer takes, flushing first
    /// if the buffer is full. Returns 0 when the sink is backed up.
    pub fn write(&mut self, content: &[u8]) -> Result<usize, SendError> {
        ensure!(!self.closed, SendError::Closed);
        if content.is_empty() {
            return Ok(0);
        }
        self.check_content(content.len())?;

        if self.flushing && !self.flush_pending()? {
            return Ok(0);
        }
        if self.body.space() == 0 && !self.flush()? {
            return Ok(0);
        }

        let len = content.len().min(self.body.space());
        self.body.put_slice(&content[..len])?;
        self.written += len as u64;
        Ok(len)
    }

    /// Writes all of `content`, flushing as often as needed.
    ///
    /// Meant for blocking sinks: over a sink that keeps accepting nothing
    /// this never returns.
    pub fn write_all(&mut self, mut content: &[u8]) -> Result<(), SendError> {
        while !content.is_empty() {
            let len = self.write(content)?;
            if len == 0 {
                self.flush()?;
            }
            content = &content[len..];
        }
        Ok(())
    }

    /// Commits if needed and sends the buffered content. Returns `true` once
    /// every byte reached the sink.
    pub fn flush(&mut self) -> Result<bool, SendError> {
        if !self.flush_pending()? {
            return Ok(false);
        }
        if self.closed {
            return Ok(true);
        }

        self.commit(false)?;
        self.stage()?;
        self.flush_pending()
    }

    /// Ends the message: commits (declaring the buffered length if nothing
    /// was flushed yet), sends the rest and the framing end. Returns `true`
    /// once everything reached the sink; call again while it returns `false`.
    pub fn close(&mut self) -> Result<bool, SendError> {
        if self.closed {
            return self.flush_pending();
        }
        if !self.flush_pending()? {
            return Ok(false);
        }

        self.commit(true)?;
        self.stage()?;
        if !self.head_response
            && let Some(encoder) = self.encoder.as_mut()
        {
            encoder.encode_eof(&mut self.tail)?;
        }
        self.flushing = self.has_pending();
        self.closed = true;
        trace!(len = self.written, "closed http output");
        self.flush_pending()
    }

    /// Whether the connection can carry another message after this one.
    pub fn is_persistent(&self) -> bool {
        self.encoder.as_ref().is_none_or(|encoder| !encoder.is_eof()) && self.header.is_persistent()
    }

    /// Re-arms for the next message, with a fresh `200` head. Anything not
    /// yet flushed is dropped.
    pub fn reset(&mut self) {
        if self.flushing {
            warn!("reset http output with unflushed bytes");
        }
        self.header = HttpHeader::response(200);
        self.head.clear();
        self.body.clear();
        self.tail.clear();
        self.encoder = None;
        self.head_response = false;
        self.written = 0;
        self.closed = false;
        self.flushing = false;
    }

    fn check_content(&self, len: usize) -> Result<(), SendError> {
        if self.head_response {
            return Ok(());
        }
        let declared = match &self.encoder {
            Some(encoder) if encoder.is_empty() => return Err(SendError::NoContentAllowed),
            Some(encoder) => encoder.declared_length(),
            None if self.header.forbids_content() => return Err(SendError::NoContentAllowed),
            None => self.header.int_field(b"Content-Length"),
        };

        if let Some(declared) = declared {
            let total = self.written + len as u64;
            if total > declared {
                warn!(declared, total, "write exceeds the declared content length");
                return Err(SendError::content_length_exceeded(total - declared));
            }
        }
        Ok(())
    }

    fn commit(&mut self, closing: bool) -> Result<(), SendError> {
        if self.encoder.is_some() {
            return Ok(());
        }

        let encoder = PayloadEncoder::decide(&mut self.header, self.body.len(), closing, self.head_response)?;
        HeaderEncoder.encode_reserving(&self.header, &mut self.head, encoder.head_reserve())?;
        trace!(len = self.head.len(), "committed http head");
        self.encoder = Some(encoder);
        Ok(())
    }

    /// Frames the buffered content for the next gathered write.
    fn stage(&mut self) -> Result<(), SendError> {
        let Some(encoder) = self.encoder.as_mut() else {
            return Ok(());
        };

        if self.head_response {
            self.body.clear();
        } else {
            encoder.encode(self.body.len(), &mut self.head, &mut self.tail)?;
        }
        self.flushing = self.has_pending();
        Ok(())
    }

    fn flush_pending(&mut self) -> Result<bool, SendError> {
        if !self.flushing {
            return Ok(true);
        }

        let len = self.sink.flush_gathered(&mut self.head, &mut self.body, &mut self.tail)?;
        trace!(len, "flushed http output");
        if self.has_pending() {
            return Ok(false);
        }

        self.flushing = false;
        self.head.clear();
        self.body.clear();
        self.tail.clear();
        Ok(true)
    }

    fn has_pending(&self) -> bool {
        self.head.has_content() || self.body.has_content() || self.tail.has_content()
    }
}

fn into_io_error(e: SendError) -> io::Error {
    match e {
        SendError::Io { source } => source,
        e => io::Error::other(e),
    }
}

impl<W: ByteSink> io::Write for HttpOutput<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match HttpOutput::write(self, buf).map_err(into_io_error)? {
            0 if !buf.is_empty() => Err(io::ErrorKind::WouldBlock.into()),
            len => Ok(len),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        if HttpOutput::flush(self).map_err(into_io_error)? {
            Ok(())
        } else {
            Err(io::ErrorKind::WouldBlock.into())
        }
    }
}
