use std::mem;
use std::ops::Range;

use tracing::{debug, trace};

use crate::buffer::View;
use crate::codec::{Handler, HttpParser, ParserState, Progress};
use crate::ensure;
use crate::io::ByteSource;
use crate::protocol::{ContentLength, HttpHeader, InputEvent, ParseError};

/// Upper bound on the number of fields in one message head.
pub const MAX_HEADER_NUM: usize = 64;

/// Pull-style reader of HTTP messages from one connection.
///
/// Each [`HttpInput::parse_next`] call runs one parser step and reports what
/// it produced. The head is accumulated into an [`HttpHeader`]; content is
/// not copied but borrowed from the parser buffer through
/// [`HttpInput::content`] until the next call.
///
/// After [`InputEvent::Eof`], call [`HttpInput::reset`] to read the next
/// message of a persistent connection.
#[derive(Debug)]
pub struct HttpInput<S> {
    parser: HttpParser<S>,
    events: InputEvents,
    blocked: bool,
    closed: bool,
}

/// The handler behind an input: records the head and where the last content
/// chunk sits in the parser buffer.
#[derive(Debug, Default)]
struct InputEvents {
    header: HttpHeader,
    head_parsed: bool,
    header_complete: bool,
    content: Option<Range<usize>>,
    message_complete: bool,
}

impl Handler for InputEvents {
    fn start_token0(&mut self, token: View<'_>) -> Result<(), ParseError> {
        self.header.set_token0(&token);
        Ok(())
    }

    fn start_token1(&mut self, token: View<'_>) -> Result<(), ParseError> {
        if self.header.is_response() {
            http::StatusCode::from_bytes(&token)
                .map_err(|e| ParseError::invalid_start_line(format!("status code {token}: {e}")))?;
        }
        self.header.set_token1(&token);
        Ok(())
    }

    fn start_token2(&mut self, token: View<'_>) -> Result<(), ParseError> {
        self.header.set_token2(&token);
        Ok(())
    }

    fn header(&mut self, name: View<'_>, value: View<'_>) -> Result<(), ParseError> {
        ensure!(self.header.len() < MAX_HEADER_NUM, ParseError::too_many_headers(MAX_HEADER_NUM));
        self.header.add(name, value);
        Ok(())
    }

    fn header_complete(&mut self) -> Result<(), ParseError> {
        self.head_parsed = true;
        self.header_complete = true;
        Ok(())
    }

    fn content_length(&mut self) -> Result<ContentLength, ParseError> {
        self.header.content_length()
    }

    fn content(&mut self, _offset: u64, content: View<'_>) -> Result<(), ParseError> {
        self.content = Some(content.range());
        Ok(())
    }

    fn message_complete(&mut self, _content_length: u64) -> Result<(), ParseError> {
        self.message_complete = true;
        Ok(())
    }
}

impl<S: ByteSource> HttpInput<S> {
    pub fn new(source: S) -> Self {
        Self::with_parser(HttpParser::new(source))
    }

    pub fn with_parser(parser: HttpParser<S>) -> Self {
        Self { parser, events: InputEvents::default(), blocked: false, closed: false }
    }

    /// Runs one parse step.
    ///
    /// When one step completes several things, they are reported over
    /// successive calls, head first, then content, then the end of the
    /// message. [`InputEvent::Eof`] repeats until [`HttpInput::reset`].
    pub fn parse_next(&mut self) -> Result<InputEvent, ParseError> {
        if self.closed {
            return Ok(InputEvent::Closed);
        }
        self.blocked = false;
        self.events.content = None;

        // events left over from the previous step go out before parsing on
        if !self.events.header_complete && !self.events.message_complete {
            if self.parser.state() == ParserState::End {
                return Ok(InputEvent::Eof);
            }
            match self.parser.parse_next(&mut self.events) {
                Ok(progress) => self.blocked = progress == Progress::Blocked,
                Err(e) if e.is_eof_at_start() => {
                    debug!("connection closed between messages");
                    self.closed = true;
                    return Ok(InputEvent::Closed);
                }
                Err(e) => return Err(e),
            }
        }

        let event = if mem::take(&mut self.events.header_complete) {
            InputEvent::Header
        } else if self.events.content.is_some() {
            InputEvent::Content
        } else if mem::take(&mut self.events.message_complete) {
            InputEvent::Eof
        } else {
            InputEvent::Nop
        };
        trace!(?event, state = %self.parser.state(), "parsed input event");
        Ok(event)
    }

    /// The head of the current message, once it is complete.
    pub fn header(&self) -> Option<&HttpHeader> {
        self.events.head_parsed.then_some(&self.events.header)
    }

    /// Whatever has been parsed of the current head so far.
    pub fn parsed_header(&self) -> &HttpHeader {
        &self.events.header
    }

    /// The content chunk reported by the last [`InputEvent::Content`].
    pub fn content(&self) -> Option<&[u8]> {
        self.events.content.clone().map(|range| self.parser.buffer().view(range).as_slice())
    }

    /// The source had nothing for the last step.
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn is_open(&self) -> bool {
        !self.closed && self.parser.source().is_open()
    }

    pub fn parser(&self) -> &HttpParser<S> {
        &self.parser
    }

    pub fn source_mut(&mut self) -> &mut S {
        self.parser.source_mut()
    }

    /// Finishes the current message without handing out its content.
    ///
    /// Framed content (a declared length or chunks) is read and dropped so
    /// the connection can carry the next message; `Ok(false)` means the
    /// source ran dry first and `close` has to be called again. A message
    /// delimited by the end of the connection, or one whose head is not
    /// complete, cannot be skipped: the source is closed instead.
    pub fn close(&mut self) -> Result<bool, ParseError> {
        let state = self.parser.state();
        if self.closed || state == ParserState::Start || state == ParserState::End {
            return Ok(true);
        }

        if state.is_header_state() || self.parser.content_length().is_some_and(|c| c.is_eof()) {
            debug!(%state, "closing source of an unfinished message");
            self.parser.source_mut().close()?;
            self.closed = true;
            return Ok(true);
        }

        while self.parser.state() != ParserState::End {
            self.events.content = None;
            if self.parser.parse_next(&mut self.events)? == Progress::Blocked {
                self.blocked = true;
                return Ok(false);
            }
        }
        trace!(len = self.parser.content_position(), "drained unread content");
        self.events.content = None;
        Ok(true)
    }

    /// Re-arms for the next message on the same connection.
    pub fn reset(&mut self) {
        self.parser.reset();
        self.events.header.clear();
        self.events.head_parsed = false;
        self.events.header_complete = false;
        self.events.content = None;
        self.events.message_complete = false;
        self.blocked = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ByteArrayEndPoint;
    use crate::protocol::tokens::methods;
    use indoc::indoc;

    fn input(wire: &str) -> HttpInput<ByteArrayEndPoint> {
        HttpInput::new(ByteArrayEndPoint::new(wire.replace('\n', "\r\n")))
    }

    /// Collects events and content until the message ends.
    fn read_message<S: ByteSource>(input: &mut HttpInput<S>) -> (Vec<InputEvent>, Vec<u8>) {
        let (mut events, mut body) = (Vec::new(), Vec::new());
        loop {
            let event = input.parse_next().unwrap();
            if let Some(content) = input.content() {
                body.extend_from_slice(content);
            }
            if event != InputEvent::Nop {
                events.push(event);
            }
            if event.is_terminal() {
                return (events, body);
            }
        }
    }

    #[test]
    fn header_then_eof_without_content() {
        let mut input = input(indoc! {"
            GET /foo HTTP/1.1
            Host: x

        "});

        assert_eq!(input.parse_next().unwrap(), InputEvent::Nop);
        assert!(input.header().is_none());
        assert_eq!(input.parsed_header().method_ordinal(), Some(methods::GET));

        assert_eq!(input.parse_next().unwrap(), InputEvent::Header);
        let header = input.header().unwrap();
        assert_eq!(header.uri(), Some(&b"/foo"[..]));
        assert_eq!(header.get_str("host"), Some("x"));

        assert_eq!(input.parse_next().unwrap(), InputEvent::Eof);
        assert_eq!(input.parse_next().unwrap(), InputEvent::Eof);
    }

    #[test]
    fn content_is_borrowed_until_next_step() {
        let mut input = input(indoc! {"
            POST /upload HTTP/1.1
            Content-Length: 5

            hello"});

        let (events, body) = read_message(&mut input);
        assert_eq!(events, vec![InputEvent::Header, InputEvent::Content, InputEvent::Eof]);
        assert_eq!(body, b"hello");
    }

    #[test]
    fn too_many_headers() {
        let mut wire = String::from("GET / HTTP/1.1\n");
        for i in 0..=MAX_HEADER_NUM {
            wire.push_str(&format!("X-Field-{i}: {i}\n"));
        }
        wire.push('\n');

        let mut input = input(&wire);
        let err = loop {
            match input.parse_next() {
                Ok(_) => {}
                Err(e) => break e,
            }
        };
        assert!(matches!(err, ParseError::TooManyHeaders { max_num: MAX_HEADER_NUM }));
    }

    #[test]
    fn invalid_status_code() {
        let mut input = input("HTTP/1.1 20x OK\n\n");
        let err = loop {
            match input.parse_next() {
                Ok(_) => {}
                Err(e) => break e,
            }
        };
        assert!(matches!(err, ParseError::InvalidStartLine { .. }), "{err}");
    }

    #[test]
    fn closed_between_messages() {
        let mut input = input("GET / HTTP/1.1\n\n");
        let (events, _) = read_message(&mut input);
        assert_eq!(events, vec![InputEvent::Header, InputEvent::Eof]);

        input.reset();
        assert_eq!(input.parse_next().unwrap(), InputEvent::Closed);
        assert_eq!(input.parse_next().unwrap(), InputEvent::Closed);
        assert!(!input.is_open());
    }

    #[test]
    fn close_drains_framed_content() {
        let mut input = input(indoc! {"
            POST /a HTTP/1.1
            Transfer-Encoding: chunked

            4
            Wiki
            0

            GET /b HTTP/1.1

        "});

        assert_eq!(input.parse_next().unwrap(), InputEvent::Nop);
        assert_eq!(input.parse_next().unwrap(), InputEvent::Header);
        assert!(input.close().unwrap());
        assert!(input.is_open());

        input.reset();
        let (events, _) = read_message(&mut input);
        assert_eq!(events, vec![InputEvent::Header, InputEvent::Eof]);
        assert_eq!(input.header().unwrap().uri(), Some(&b"/b"[..]));
    }

    #[test]
    fn close_waits_for_blocked_source() {
        let source = ByteArrayEndPoint::from_pieces(["PUT / HTTP/1.1\r\nContent-Length: 6\r\n\r\nabc"]).keep_open();
        let mut input = HttpInput::new(source);
        while input.parse_next().unwrap() != InputEvent::Header {}

        assert!(!input.close().unwrap());
        assert!(input.is_blocked());

        input.source_mut().push_input("def");
        assert!(input.close().unwrap());
        assert_eq!(input.parse_next().unwrap(), InputEvent::Eof);
    }

    #[test]
    fn close_gives_up_on_eof_framed_content() {
        let mut input = input(indoc! {"
            HTTP/1.0 200 OK
            Content-Type: text/plain

            endless"});
        while input.parse_next().unwrap() != InputEvent::Header {}

        assert!(input.close().unwrap());
        assert!(!input.is_open());
        assert_eq!(input.parse_next().unwrap(), InputEvent::Closed);
    }
}
