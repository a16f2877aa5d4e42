//! HTTP/1.x wire codec.
//!
//! # Architecture
//!
//! - Inbound:
//!   - [`HttpParser`]: incremental parser driven by a
//!     [`ByteSource`](crate::io::ByteSource), reporting to a [`Handler`]
//!   - [`ParserState`]: the states it moves through
//!
//! - Outbound:
//!   - [`HeaderEncoder`]: serializes a message head
//!   - [`PayloadEncoder`]: chooses and applies the content framing
//!
//! [`HttpInput`](crate::connection::HttpInput) and
//! [`HttpOutput`](crate::connection::HttpOutput) put these together for one
//! connection.

mod body;
mod header;
mod parser;

pub use body::{ChunkedEncoder, LengthEncoder, PayloadEncoder};
pub use header::HeaderEncoder;
pub use parser::{Handler, HttpParser, ParserState, Progress, DEFAULT_BUFFER_SIZE};
