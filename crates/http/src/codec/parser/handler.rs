use crate::buffer::View;
use crate::protocol::{ContentLength, ParseError};

/// Receives the tokens an [`HttpParser`](super::HttpParser) recognizes.
///
/// Every view borrows the parser's buffer and is only valid during the call;
/// copy what must be kept. Returning an error aborts parsing and poisons the
/// parser, the same way a malformed message does.
///
/// For one message the calls arrive in this order:
///
/// ```text
/// start_token0 start_token1? start_token2? header* header_complete
/// content_length (content)* message_complete
/// ```
///
/// `content_length` is not asked for HTTP/0.9 requests, which have no head
/// fields and no body.
pub trait Handler {
    /// Method of a request, version of a response.
    fn start_token0(&mut self, token: View<'_>) -> Result<(), ParseError>;

    /// Uri of a request, status code of a response.
    fn start_token1(&mut self, token: View<'_>) -> Result<(), ParseError>;

    /// Version of a request, reason phrase of a response.
    fn start_token2(&mut self, token: View<'_>) -> Result<(), ParseError>;

    /// One complete header, continuation lines already folded into `value`.
    fn header(&mut self, name: View<'_>, value: View<'_>) -> Result<(), ParseError> {
        let _ = (name, value);
        Ok(())
    }

    fn header_complete(&mut self) -> Result<(), ParseError> {
        Ok(())
    }

    /// Selects the body framing. Asked right after [`Handler::header_complete`].
    fn content_length(&mut self) -> Result<ContentLength, ParseError>;

    /// A piece of body starting at `offset` within the decoded body.
    fn content(&mut self, offset: u64, content: View<'_>) -> Result<(), ParseError> {
        let _ = (offset, content);
        Ok(())
    }

    /// The message ended after `content_length` body bytes.
    fn message_complete(&mut self, content_length: u64) -> Result<(), ParseError> {
        let _ = content_length;
        Ok(())
    }
}

impl<H: Handler + ?Sized> Handler for &mut H {
    fn start_token0(&mut self, token: View<'_>) -> Result<(), ParseError> {
        (**self).start_token0(token)
    }

    fn start_token1(&mut self, token: View<'_>) -> Result<(), ParseError> {
        (**self).start_token1(token)
    }

    fn start_token2(&mut self, token: View<'_>) -> Result<(), ParseError> {
        (**self).start_token2(token)
    }

    fn header(&mut self, name: View<'_>, value: View<'_>) -> Result<(), ParseError> {
        (**self).header(name, value)
    }

    fn header_complete(&mut self) -> Result<(), ParseError> {
        (**self).header_complete()
    }

    fn content_length(&mut self) -> Result<ContentLength, ParseError> {
        (**self).content_length()
    }

    fn content(&mut self, offset: u64, content: View<'_>) -> Result<(), ParseError> {
        (**self).content(offset, content)
    }

    fn message_complete(&mut self, content_length: u64) -> Result<(), ParseError> {
        (**self).message_complete(content_length)
    }
}
