//! Incremental HTTP/1.x message parser.
//!
//! [`HttpParser`] is a resumable state machine over a [`Buffer`]. Each call to
//! [`HttpParser::parse_next`] pulls bytes from its [`ByteSource`] when the
//! buffer is drained, advances through as many bytes as it can, and reports
//! every recognized token to a [`Handler`]. Nothing assumes a message arrives
//! in one read: the parser stops wherever the bytes run out and carries on
//! from the same place on the next call.
//!
//! Tokens are handed out as [`View`]s into the parser's own buffer, so the
//! head and body are never copied on the way to the handler. The only
//! exception is a header value folded over several lines, which has to be
//! joined.
//!
//! # Errors
//!
//! HTTP/1.x framing has no point to resynchronize on. Any error (malformed
//! start line or header, bad chunk size, truncated message, I/O failure)
//! poisons the parser and the rest of the connection must be discarded.

mod handler;
mod state;

pub use handler::Handler;
pub use state::ParserState;

use std::ops::Range;

use tracing::{error, trace, warn};

use crate::buffer::{Buffer, View};
use crate::ensure;
use crate::io::{ByteSource, Fill};
use crate::protocol::tokens::versions;
use crate::protocol::{ContentLength, ParseError};
use ParserState::*;

/// Default capacity of the parser buffer.
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

const SPACE: u8 = b' ';
const TAB: u8 = b'\t';
const CR: u8 = b'\r';
const LF: u8 = b'\n';
const COLON: u8 = b':';
const SEMI_COLON: u8 = b';';

/// Outcome of one successful parse step.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Progress {
    /// Bytes were consumed, or an event was produced
    Parsed,
    /// The buffer was drained and the source had nothing to add
    Blocked,
}

pub struct HttpParser<S> {
    buffer: Buffer,
    source: S,
    state: ParserState,

    /// a CR ended the last line, a directly following LF belongs to it
    pending_cr: bool,
    /// the start line began with a protocol version
    response: bool,
    /// bytes from the mark to the last non blank byte of the current header token
    length: Option<usize>,

    name: Option<Range<usize>>,
    value: Option<Range<usize>>,
    folded: Option<Vec<u8>>,

    content_length: Option<ContentLength>,
    content_position: u64,
    chunk_length: u64,
    chunk_position: u64,

    poisoned: bool,
}

impl<S: ByteSource> HttpParser<S> {
    pub fn new(source: S) -> Self {
        Self::with_capacity(source, DEFAULT_BUFFER_SIZE)
    }

    /// The capacity bounds the longest token (start line token, header name
    /// or single header line) the parser can hold.
    pub fn with_capacity(source: S, capacity: usize) -> Self {
        Self::with_buffer(Buffer::with_capacity(capacity), source)
    }

    /// Parses from `buffer` first, which may already hold bytes.
    pub fn with_buffer(buffer: Buffer, source: S) -> Self {
        Self {
            buffer,
            source,
            state: Start,
            pending_cr: false,
            response: false,
            length: None,
            name: None,
            value: None,
            folded: None,
            content_length: None,
            content_position: 0,
            chunk_length: 0,
            chunk_position: 0,
            poisoned: false,
        }
    }

    #[inline]
    pub fn state(&self) -> ParserState {
        self.state
    }

    #[inline]
    pub fn is_header_state(&self) -> bool {
        self.state.is_header_state()
    }

    #[inline]
    pub fn is_content_state(&self) -> bool {
        self.state.is_content_state()
    }

    /// The framing of the current message, known once its head is complete.
    #[inline]
    pub fn content_length(&self) -> Option<ContentLength> {
        self.content_length
    }

    /// Body bytes delivered so far for the current message.
    #[inline]
    pub fn content_position(&self) -> u64 {
        self.content_position
    }

    #[inline]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    #[inline]
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    #[inline]
    pub fn source(&self) -> &S {
        &self.source
    }

    #[inline]
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Runs one step: refills the buffer if it is drained, then parses up to
    /// the next event (end of start line, end of head, one content chunk, end
    /// of message) or until the buffered bytes run out.
    pub fn parse_next<H: Handler>(&mut self, handler: &mut H) -> Result<Progress, ParseError> {
        ensure!(!self.poisoned, ParseError::illegal_state("parser failed on an earlier message"));
        ensure!(self.state != End, ParseError::illegal_state("message already complete, reset the parser first"));

        let result = self.step(handler);
        if let Err(e) = &result {
            self.poisoned = true;
            if e.is_eof_at_start() {
                trace!("source ended between messages");
            } else {
                warn!(state = ?self.state, cause = %e, "failed to parse http message");
            }
        }
        result
    }

    /// Parses until the message is complete, or until the source has nothing
    /// more for now.
    pub fn parse<H: Handler>(&mut self, handler: &mut H) -> Result<Progress, ParseError> {
        while self.state != End {
            if self.parse_next(handler)? == Progress::Blocked {
                return Ok(Progress::Blocked);
            }
        }
        Ok(Progress::Parsed)
    }

    /// Parses at least one step, then keeps going while buffered bytes remain.
    pub fn parse_available<H: Handler>(&mut self, handler: &mut H) -> Result<Progress, ParseError> {
        let mut progress = self.parse_next(handler)?;
        while self.state != End && self.buffer.has_content() {
            progress = self.parse_next(handler)?;
        }
        Ok(progress)
    }

    /// Re-arms the parser for the next message.
    ///
    /// Buffered bytes that were not parsed yet are kept: they are the start of
    /// the next pipelined message. A parser poisoned by an error stays poisoned.
    pub fn reset(&mut self) {
        self.state = Start;
        self.pending_cr = false;
        self.response = false;
        self.length = None;
        self.name = None;
        self.value = None;
        self.folded = None;
        self.content_length = None;
        self.content_position = 0;
        self.chunk_length = 0;
        self.chunk_position = 0;

        self.buffer.clear_mark();
        if self.buffer.is_empty() {
            self.buffer.clear();
        }
    }

    fn step<H: Handler>(&mut self, handler: &mut H) -> Result<Progress, ParseError> {
        if self.state == Content && self.content_remaining() == 0 {
            self.complete(handler)?;
            return Ok(Progress::Parsed);
        }

        if self.buffer.is_empty() {
            match self.fill()? {
                Fill::Eof if self.state == EofContent => {
                    self.complete(handler)?;
                    return Ok(Progress::Parsed);
                }
                Fill::Eof => return Err(ParseError::unexpected_eof(self.state)),
                Fill::Filled(0) => return Ok(Progress::Blocked),
                Fill::Filled(n) => trace!(len = n, state = ?self.state, "filled parser buffer"),
            }
        }

        if self.state.is_header_state() {
            self.parse_head(handler)?;
        } else {
            self.parse_content(handler)?;
        }
        Ok(Progress::Parsed)
    }

    fn fill(&mut self) -> Result<Fill, ParseError> {
        if self.buffer.space() == 0 {
            self.compact()?;
        }
        Ok(self.source.fill(&mut self.buffer)?)
    }

    /// Reclaims the consumed front of a full buffer, keeping the earliest byte
    /// that a pending token still refers to.
    fn compact(&mut self) -> Result<(), ParseError> {
        let keep = if self.state.is_header_state() {
            [self.name.as_ref().map(|r| r.start), self.value.as_ref().map(|r| r.start), self.buffer.mark_index()]
                .into_iter()
                .flatten()
                .fold(self.buffer.get_index(), usize::min)
        } else {
            self.buffer.clear_mark();
            self.buffer.get_index()
        };

        if keep == 0 {
            error!(capacity = self.buffer.capacity(), state = ?self.state, "parser buffer full with a pending token");
            return Err(ParseError::buffer_full(self.buffer.capacity()));
        }

        let mark = self.buffer.mark_index();
        self.buffer.set_mark_index(Some(keep));
        let shift = self.buffer.compact().map_err(ParseError::io)?;
        self.buffer.set_mark_index(mark.map(|m| m - shift));
        for range in [&mut self.name, &mut self.value].into_iter().flatten() {
            range.start -= shift;
            range.end -= shift;
        }

        trace!(shift, "compacted parser buffer");
        Ok(())
    }

    fn parse_head<H: Handler>(&mut self, handler: &mut H) -> Result<(), ParseError> {
        while self.state.is_header_state() {
            let Some(ch) = self.buffer.get() else {
                return Ok(());
            };
            if self.pending_cr && ch == LF {
                self.pending_cr = false;
                continue;
            }
            self.pending_cr = false;

            match self.state {
                Start => {
                    if ch > SPACE {
                        self.open_token();
                        self.state = Token0;
                    }
                }

                Token0 => {
                    if ch == SPACE {
                        let token = self.token();
                        let response = versions::CACHE.lookup(&token).is_some();
                        handler.start_token0(token)?;
                        self.response = response;
                        self.buffer.clear_mark();
                        self.state = Space1;
                    } else if ch < SPACE {
                        handler.start_token0(self.token())?;
                        return self.simple_request(handler, ch);
                    }
                }

                Space1 => {
                    if ch > SPACE {
                        self.open_token();
                        self.state = Token1;
                    } else if ch < SPACE {
                        ensure!(!self.response, ParseError::invalid_start_line("missing status code"));
                        return self.simple_request(handler, ch);
                    }
                }

                Token1 => {
                    if ch == SPACE {
                        handler.start_token1(self.token())?;
                        self.buffer.clear_mark();
                        self.state = Space2;
                    } else if ch < SPACE {
                        handler.start_token1(self.token())?;
                        if !self.response {
                            return self.simple_request(handler, ch);
                        }
                        // status line without reason phrase
                        handler.start_token2(View::detached(&[]))?;
                        self.start_line_complete(ch);
                        return Ok(());
                    }
                }

                Space2 => {
                    if ch > SPACE {
                        self.open_token();
                        self.state = Token2;
                    } else if ch < SPACE {
                        if !self.response {
                            return self.simple_request(handler, ch);
                        }
                        handler.start_token2(View::detached(&[]))?;
                        self.start_line_complete(ch);
                        return Ok(());
                    }
                }

                Token2 => {
                    if ch == CR || ch == LF {
                        handler.start_token2(self.token())?;
                        self.start_line_complete(ch);
                        return Ok(());
                    }
                }

                Header => match ch {
                    SPACE | TAB => {
                        ensure!(self.name.is_some(), ParseError::invalid_header("continuation line without a header"));
                        self.length = None;
                        self.state = HeaderValue;
                    }
                    _ => {
                        self.flush_header(handler)?;
                        match ch {
                            CR | LF => {
                                self.pending_cr = ch == CR;
                                return self.head_complete(handler);
                            }
                            COLON => return Err(ParseError::invalid_header("empty header name")),
                            c if c < SPACE => return Err(ParseError::invalid_header(format!("control byte {c:#04x} in header"))),
                            _ => {
                                self.length = None;
                                self.extend_token();
                                self.state = HeaderName;
                            }
                        }
                    }
                },

                HeaderName => match ch {
                    COLON => {
                        self.name = self.pending_token();
                        self.length = None;
                        self.buffer.clear_mark();
                        self.state = HeaderValue;
                    }
                    CR | LF => {
                        let name = self.pending_token().map(|r| self.buffer.view(r).to_string()).unwrap_or_default();
                        return Err(ParseError::invalid_header(format!("missing colon after header name {name}")));
                    }
                    SPACE | TAB => {}
                    c if c < SPACE => return Err(ParseError::invalid_header(format!("control byte {c:#04x} in header name"))),
                    _ => self.extend_token(),
                },

                HeaderValue => match ch {
                    CR | LF => {
                        self.end_value_line();
                        self.pending_cr = ch == CR;
                        self.length = None;
                        self.buffer.clear_mark();
                        self.state = Header;
                    }
                    SPACE | TAB => {}
                    _ => self.extend_token(),
                },

                End | EofContent | Content | ChunkedContent | ChunkSize | ChunkParams | Chunk | ChunkTrailer | ChunkTrailerLine => {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    fn parse_content<H: Handler>(&mut self, handler: &mut H) -> Result<(), ParseError> {
        while self.state.is_content_state() {
            let Some(ch) = self.buffer.peek() else {
                return Ok(());
            };
            if self.pending_cr && ch == LF {
                self.buffer.skip(1);
                self.pending_cr = false;
                continue;
            }
            self.pending_cr = false;

            match self.state {
                EofContent => {
                    let chunk = self.buffer.get_bytes(usize::MAX);
                    let len = chunk.len() as u64;
                    handler.content(self.content_position, chunk)?;
                    self.content_position += len;
                    return Ok(());
                }

                Content => {
                    let remaining = self.content_remaining();
                    if remaining == 0 {
                        return self.complete(handler);
                    }
                    let chunk = self.buffer.get_bytes(usize::try_from(remaining).unwrap_or(usize::MAX));
                    let len = chunk.len() as u64;
                    handler.content(self.content_position, chunk)?;
                    self.content_position += len;
                    if self.content_remaining() == 0 {
                        return self.complete(handler);
                    }
                    return Ok(());
                }

                ChunkedContent => match ch {
                    CR | LF => {
                        self.buffer.skip(1);
                        self.pending_cr = ch == CR;
                    }
                    c if c <= SPACE => {
                        self.buffer.skip(1);
                    }
                    c if c.is_ascii_hexdigit() => {
                        self.chunk_length = 0;
                        self.chunk_position = 0;
                        self.state = ChunkSize;
                    }
                    c => return Err(ParseError::invalid_chunk(format!("expected chunk size, found byte {c:#04x}"))),
                },

                ChunkSize => {
                    self.buffer.skip(1);
                    match ch {
                        CR | LF => {
                            self.pending_cr = ch == CR;
                            self.end_chunk_size();
                        }
                        SEMI_COLON => self.state = ChunkParams,
                        c if c <= SPACE => self.state = ChunkParams,
                        c => {
                            let digit = char::from(c)
                                .to_digit(16)
                                .ok_or_else(|| ParseError::invalid_chunk(format!("bad chunk size byte {c:#04x}")))?;
                            self.chunk_length = self
                                .chunk_length
                                .checked_mul(16)
                                .and_then(|length| length.checked_add(u64::from(digit)))
                                .ok_or_else(|| ParseError::invalid_chunk("chunk size overflow"))?;
                        }
                    }
                }

                ChunkParams => {
                    self.buffer.skip(1);
                    if ch == CR || ch == LF {
                        self.pending_cr = ch == CR;
                        self.end_chunk_size();
                    }
                }

                Chunk => {
                    let remaining = self.chunk_length - self.chunk_position;
                    if remaining == 0 {
                        self.state = ChunkedContent;
                        continue;
                    }
                    let chunk = self.buffer.get_bytes(usize::try_from(remaining).unwrap_or(usize::MAX));
                    let len = chunk.len() as u64;
                    handler.content(self.content_position, chunk)?;
                    self.content_position += len;
                    self.chunk_position += len;
                    return Ok(());
                }

                // trailers are accepted and dropped
                ChunkTrailer => {
                    self.buffer.skip(1);
                    if ch == CR || ch == LF {
                        self.pending_cr = ch == CR;
                        return self.complete(handler);
                    }
                    self.state = ChunkTrailerLine;
                }

                ChunkTrailerLine => {
                    self.buffer.skip(1);
                    if ch == CR || ch == LF {
                        self.pending_cr = ch == CR;
                        self.state = ChunkTrailer;
                    }
                }

                Start | Token0 | Space1 | Token1 | Space2 | Token2 | Header | HeaderName | HeaderValue | End => {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Marks the byte just read as the start of a token.
    fn open_token(&mut self) {
        let index = self.buffer.get_index() - 1;
        self.buffer.mark_at(index);
    }

    /// The token from the mark up to, not including, the byte just read,
    /// without trailing blanks.
    fn token(&self) -> View<'_> {
        let end = self.buffer.get_index() - 1;
        let start = self.buffer.mark_index().unwrap_or(end);
        let trimmed = self.buffer.view(start..end).trim_ascii_end().len();
        self.buffer.view(start..start + trimmed)
    }

    /// Grows the current header token up to the byte just read.
    fn extend_token(&mut self) {
        if self.length.is_none() {
            self.open_token();
        }
        let mark = self.buffer.mark_index().unwrap_or(0);
        self.length = Some(self.buffer.get_index() - mark);
    }

    fn pending_token(&self) -> Option<Range<usize>> {
        let length = self.length?;
        let mark = self.buffer.mark_index()?;
        Some(mark..mark + length)
    }

    fn start_line_complete(&mut self, ch: u8) {
        trace!(response = self.response, "parsed start line");
        self.pending_cr = ch == CR;
        self.buffer.clear_mark();
        self.state = Header;
    }

    /// Records the value on the line just ended, folding it into the previous
    /// line's value when this is a continuation.
    fn end_value_line(&mut self) {
        let Some(segment) = self.pending_token() else {
            return;
        };

        if self.value.is_none() && self.folded.is_none() {
            self.value = Some(segment);
            return;
        }

        let mut folded = match self.folded.take() {
            Some(folded) => folded,
            None => self.value.take().map(|value| self.buffer.view(value).to_vec()).unwrap_or_default(),
        };
        if !folded.is_empty() {
            folded.push(SPACE);
        }
        folded.extend_from_slice(&self.buffer.view(segment));
        self.folded = Some(folded);
    }

    fn flush_header<H: Handler>(&mut self, handler: &mut H) -> Result<(), ParseError> {
        let Some(name) = self.name.take() else {
            return Ok(());
        };
        let value = self.value.take();
        let folded = self.folded.take();

        let name = self.buffer.view(name);
        match (&folded, value) {
            (Some(folded), _) => handler.header(name, View::detached(folded)),
            (None, Some(value)) => handler.header(name, self.buffer.view(value)),
            (None, None) => handler.header(name, View::detached(&[])),
        }
    }

    fn head_complete<H: Handler>(&mut self, handler: &mut H) -> Result<(), ParseError> {
        self.buffer.clear_mark();
        handler.header_complete()?;

        let content_length = handler.content_length()?;
        trace!(?content_length, "parsed http head");
        self.content_length = Some(content_length);
        self.content_position = 0;
        match content_length {
            ContentLength::NoContent | ContentLength::Length(0) => return self.complete(handler),
            ContentLength::Length(_) => self.state = Content,
            ContentLength::Chunked => self.state = ChunkedContent,
            ContentLength::Eof => self.state = EofContent,
        }
        Ok(())
    }

    /// An HTTP/0.9 request: a start line without version, no head, no body.
    fn simple_request<H: Handler>(&mut self, handler: &mut H, ch: u8) -> Result<(), ParseError> {
        trace!("parsed http/0.9 request");
        self.pending_cr = ch == CR;
        self.buffer.clear_mark();
        handler.header_complete()?;
        self.content_length = Some(ContentLength::NoContent);
        self.complete(handler)
    }

    fn end_chunk_size(&mut self) {
        if self.chunk_length == 0 {
            trace!("parsed last chunk");
            self.state = ChunkTrailer;
        } else {
            trace!(len = self.chunk_length, "parsed chunk size");
            self.state = Chunk;
        }
    }

    fn complete<H: Handler>(&mut self, handler: &mut H) -> Result<(), ParseError> {
        self.state = End;
        if self.pending_cr && self.buffer.peek() == Some(LF) {
            self.buffer.skip(1);
            self.pending_cr = false;
        }
        trace!(len = self.content_position, "parsed http message");
        handler.message_complete(self.content_position)
    }

    fn content_remaining(&self) -> u64 {
        match self.content_length {
            Some(ContentLength::Length(length)) => length.saturating_sub(self.content_position),
            _ => 0,
        }
    }
}

impl<S> std::fmt::Debug for HttpParser<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpParser")
            .field("state", &self.state)
            .field("content_length", &self.content_length)
            .field("content_position", &self.content_position)
            .field("poisoned", &self.poisoned)
            .field("buffer", &self.buffer)
            .finish_non_exhaustive()
    }
}
