use std::fmt;

/// Position of an [`HttpParser`](super::HttpParser) within one message.
///
/// Every state before [`ParserState::End`] belongs to the head, every state
/// after it to the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserState {
    /// Skipping whitespace before the start line
    Start,
    /// Method of a request, version of a response
    Token0,
    /// Spaces after token 0
    Space1,
    /// Uri of a request, status code of a response
    Token1,
    /// Spaces after token 1
    Space2,
    /// Version of a request, reason phrase of a response
    Token2,
    /// At the start of a header line
    Header,
    /// Inside a header name
    HeaderName,
    /// Inside a header value
    HeaderValue,
    /// The message is complete
    End,
    /// Body runs until the source ends
    EofContent,
    /// Body of a known length
    Content,
    /// Before a chunk size line
    ChunkedContent,
    /// Inside the hex chunk size
    ChunkSize,
    /// Skipping chunk extensions up to the end of the size line
    ChunkParams,
    /// Inside chunk data
    Chunk,
    /// After the last chunk, at the start of a trailer line
    ChunkTrailer,
    /// Skipping a trailer line
    ChunkTrailerLine,
}

use ParserState::*;

impl ParserState {
    /// Returns true while the head of the message is being parsed
    #[inline]
    pub fn is_header_state(&self) -> bool {
        matches!(self, Start | Token0 | Space1 | Token1 | Space2 | Token2 | Header | HeaderName | HeaderValue)
    }

    /// Returns true while the body of the message is being parsed
    #[inline]
    pub fn is_content_state(&self) -> bool {
        matches!(self, EofContent | Content | ChunkedContent | ChunkSize | ChunkParams | Chunk | ChunkTrailer | ChunkTrailerLine)
    }

    /// Returns true inside a chunked body
    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, ChunkedContent | ChunkSize | ChunkParams | Chunk | ChunkTrailer | ChunkTrailerLine)
    }
}

impl fmt::Display for ParserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_content_states_are_disjoint() {
        let all = [
            Start, Token0, Space1, Token1, Space2, Token2, Header, HeaderName, HeaderValue, End, EofContent, Content,
            ChunkedContent, ChunkSize, ChunkParams, Chunk, ChunkTrailer, ChunkTrailerLine,
        ];
        for state in all {
            assert!(!(state.is_header_state() && state.is_content_state()), "{state}");
        }
        assert!(!End.is_header_state());
        assert!(!End.is_content_state());
        assert_eq!(all.iter().filter(|s| s.is_header_state()).count(), 9);
        assert_eq!(all.iter().filter(|s| s.is_content_state()).count(), 8);
    }
}
