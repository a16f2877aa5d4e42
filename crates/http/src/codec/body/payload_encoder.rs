use tracing::trace;

use crate::buffer::{parse_decimal, Buffer};
use crate::codec::body::chunked_encoder::ChunkedEncoder;
use crate::codec::body::length_encoder::LengthEncoder;
use crate::protocol::tokens::{headers, versions};
use crate::protocol::{ContentLength, HttpHeader, SendError};

/// Frames outgoing content according to the framing chosen at commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadEncoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// content-length payload
    Length(LengthEncoder),

    /// transfer-encoding chunked payload
    Chunked(ChunkedEncoder),

    /// payload ended by closing the connection
    Eof,

    /// no payload allowed
    NoBody,
}

impl PayloadEncoder {
    pub fn empty() -> Self {
        Self { kind: Kind::NoBody }
    }

    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedEncoder::new()) }
    }

    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthEncoder::new(size)) }
    }

    pub fn eof() -> Self {
        Self { kind: Kind::Eof }
    }

    /// Chooses the framing for a message about to be committed, adjusting
    /// `header` to announce it. The first matching rule wins:
    ///
    /// 1. 1xx, 204 and 304 responses carry no content
    /// 2. an explicit `Content-Length` is kept
    /// 3. a closing output with everything buffered declares that length
    /// 4. HTTP/1.1 without `Connection: close` or `Transfer-Encoding: identity`
    ///    is chunked
    /// 5. anything else is ended by closing the connection
    ///
    /// A response to HEAD without a declared length gets no framing headers.
    pub fn decide(header: &mut HttpHeader, buffered: usize, closing: bool, head_response: bool) -> Result<Self, SendError> {
        let encoder = Self::select(header, buffered, closing, head_response)?;
        trace!(framing = ?encoder.content_length(), buffered, closing, "decided output framing");
        Ok(encoder)
    }

    fn select(header: &mut HttpHeader, buffered: usize, closing: bool, head_response: bool) -> Result<Self, SendError> {
        if header.forbids_content() {
            return Ok(Self::empty());
        }

        if let Some(value) = header.get_by_ordinal(headers::CONTENT_LENGTH) {
            let length = parse_decimal(value)
                .ok_or_else(|| SendError::invalid_header(format!("content-length {}", String::from_utf8_lossy(value))))?;
            header.remove(b"Transfer-Encoding");
            return Ok(Self::fix_length(length));
        }

        if head_response {
            return Ok(Self::empty());
        }

        if closing {
            if buffered == 0 && !header.is_response() {
                return Ok(Self::empty());
            }
            header.remove(b"Transfer-Encoding");
            header.put(b"Content-Length", buffered.to_string());
            return Ok(Self::fix_length(buffered as u64));
        }

        let identity = header.has_element(b"Transfer-Encoding", b"identity");
        if header.version_ordinal() == Some(versions::HTTP_1_1) && header.is_persistent() && !identity {
            header.put(b"Transfer-Encoding", b"chunked");
            return Ok(Self::chunked());
        }

        header.remove(b"Transfer-Encoding");
        header.put(b"Connection", b"close");
        Ok(Self::eof())
    }

    /// Frames `len` content bytes that are about to be flushed from the body
    /// buffer.
    pub fn encode(&mut self, len: usize, head: &mut Buffer, tail: &mut Buffer) -> Result<(), SendError> {
        match &mut self.kind {
            Kind::Length(encoder) => encoder.encode(len),
            Kind::Chunked(encoder) => encoder.encode(len, head, tail),
            Kind::Eof => Ok(()),
            Kind::NoBody if len == 0 => Ok(()),
            Kind::NoBody => Err(SendError::NoContentAllowed),
        }
    }

    /// Ends the content: the last chunk, or the check that the declared
    /// length was reached.
    pub fn encode_eof(&mut self, tail: &mut Buffer) -> Result<(), SendError> {
        match &mut self.kind {
            Kind::Length(encoder) => encoder.encode_eof(),
            Kind::Chunked(encoder) => encoder.encode_eof(tail),
            Kind::Eof | Kind::NoBody => Ok(()),
        }
    }

    /// Space the head buffer must keep free after the head for the framing
    /// written in front of the first flushed content.
    pub fn head_reserve(&self) -> usize {
        match &self.kind {
            Kind::Chunked(_) => ChunkedEncoder::MAX_SIZE_LINE,
            Kind::Length(_) | Kind::Eof | Kind::NoBody => 0,
        }
    }

    /// The total content length announced by the head, if any.
    pub fn declared_length(&self) -> Option<u64> {
        match &self.kind {
            Kind::Length(encoder) => Some(encoder.length()),
            Kind::NoBody => Some(0),
            Kind::Chunked(_) | Kind::Eof => None,
        }
    }

    pub fn content_length(&self) -> ContentLength {
        match &self.kind {
            Kind::Length(encoder) => ContentLength::from_length(encoder.length()),
            Kind::Chunked(_) => ContentLength::Chunked,
            Kind::Eof => ContentLength::Eof,
            Kind::NoBody => ContentLength::NoContent,
        }
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, Kind::NoBody)
    }

    pub fn is_fix_length(&self) -> bool {
        matches!(self.kind, Kind::Length(_))
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, Kind::Eof)
    }

    pub fn is_finish(&self) -> bool {
        match &self.kind {
            Kind::Length(encoder) => encoder.is_finish(),
            Kind::Chunked(encoder) => encoder.is_finish(),
            Kind::Eof | Kind::NoBody => true,
        }
    }
}
