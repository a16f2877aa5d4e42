/// How the body of a parsed message is delimited on the wire.
///
/// The parser asks its handler for this right after the head is complete, and
/// picks the content state from the answer:
/// - `NoContent`: the message ends with its head
/// - `Length`: exactly that many bytes follow
/// - `Chunked`: hex-size-prefixed chunks follow, up to a zero-size chunk
/// - `Eof`: everything until the source ends belongs to the body
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ContentLength {
    /// Message without a body
    NoContent,
    /// Body with known length in bytes
    Length(u64),
    /// Body using chunked transfer encoding
    Chunked,
    /// Body delimited by the end of the connection
    Eof,
}

impl ContentLength {
    /// Returns true if the body uses chunked transfer encoding
    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, ContentLength::Chunked)
    }

    /// Returns true if the message carries no body at all
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, ContentLength::NoContent | ContentLength::Length(0))
    }

    /// Returns true if only closing the connection can end the body
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, ContentLength::Eof)
    }

    /// Classifies a decimal `Content-Length` value; zero means no content.
    pub fn from_length(length: u64) -> Self {
        match length {
            0 => ContentLength::NoContent,
            n => ContentLength::Length(n),
        }
    }
}

/// What one [`HttpInput::parse_next`](crate::connection::HttpInput::parse_next)
/// step produced.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// The head is complete and available through `header()`
    Header,
    /// A content chunk is available through `content()`
    Content,
    /// The current message is complete
    Eof,
    /// Progress was made (or nothing was available) without a visible event
    Nop,
    /// The source ended cleanly before another message started
    Closed,
}

impl InputEvent {
    #[inline]
    pub fn is_header(&self) -> bool {
        matches!(self, InputEvent::Header)
    }

    #[inline]
    pub fn is_content(&self) -> bool {
        matches!(self, InputEvent::Content)
    }

    /// Returns true if no further event can come for the current message
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, InputEvent::Eof | InputEvent::Closed)
    }
}
