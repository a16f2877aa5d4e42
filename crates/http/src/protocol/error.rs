use std::io;
use thiserror::Error;

use crate::codec::ParserState;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },
}

/// Misuse of a [`Buffer`](crate::buffer::Buffer).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("buffer overflow, need {requested} bytes but only {space} of {capacity} left")]
    Overflow { requested: usize, space: usize, capacity: usize },

    #[error("buffer is read only")]
    ReadOnly,
}

impl BufferError {
    pub fn overflow(requested: usize, space: usize, capacity: usize) -> Self {
        Self::Overflow { requested, space, capacity }
    }
}

impl From<BufferError> for io::Error {
    fn from(e: BufferError) -> Self {
        match e {
            BufferError::Overflow { .. } => io::Error::new(io::ErrorKind::WriteZero, e),
            BufferError::ReadOnly => io::Error::new(io::ErrorKind::PermissionDenied, e),
        }
    }
}

/// Fatal decoding errors. HTTP/1.x has no resynchronization point, so every
/// variant invalidates the rest of the connection.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid start line: {reason}")]
    InvalidStartLine { reason: String },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid chunk: {reason}")]
    InvalidChunk { reason: String },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("unexpected eof in state {state:?}")]
    UnexpectedEof { state: ParserState },

    #[error("buffer full with {capacity} bytes and nothing to compact")]
    BufferFull { capacity: usize },

    #[error("illegal state: {reason}")]
    IllegalState { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn invalid_start_line<S: ToString>(str: S) -> Self {
        Self::InvalidStartLine { reason: str.to_string() }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_chunk<S: ToString>(str: S) -> Self {
        Self::InvalidChunk { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn unexpected_eof(state: ParserState) -> Self {
        Self::UnexpectedEof { state }
    }

    pub fn buffer_full(capacity: usize) -> Self {
        Self::BufferFull { capacity }
    }

    pub fn illegal_state<S: ToString>(str: S) -> Self {
        Self::IllegalState { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// True when the source ended before the next message started: a clean
    /// close of a persistent connection rather than a truncated message.
    pub fn is_eof_at_start(&self) -> bool {
        matches!(self, Self::UnexpectedEof { state: ParserState::Start })
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("header already committed")]
    Committed,

    #[error("output already closed")]
    Closed,

    #[error("header too large for the {capacity} bytes header buffer")]
    HeaderTooLarge { capacity: usize },

    #[error("content exceeds the declared length by {excess} bytes")]
    ContentLengthExceeded { excess: u64 },

    #[error("content is not allowed for this message")]
    NoContentAllowed,

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("declared content length {declared} but only {written} bytes written")]
    ContentLengthMismatch { declared: u64, written: u64 },

    #[error("buffer error: {source}")]
    Buffer {
        #[from]
        source: BufferError,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn header_too_large(capacity: usize) -> Self {
        Self::HeaderTooLarge { capacity }
    }

    pub fn content_length_exceeded(excess: u64) -> Self {
        Self::ContentLengthExceeded { excess }
    }

    pub fn content_length_mismatch(declared: u64, written: u64) -> Self {
        Self::ContentLengthMismatch { declared, written }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
