//! A non-blocking HTTP/1.x message engine
//!
//! This crate parses and writes HTTP/0.9, 1.0 and 1.1 messages without owning
//! the connection. It is driven from the outside: the caller supplies bytes
//! through a [`io::ByteSource`] and takes them away through a [`io::ByteSink`],
//! and every call does as much work as the available bytes allow, then
//! returns. A message can arrive split at any byte and be parsed the same.
//!
//! # Features
//!
//! - Incremental, resumable parser with zero-copy access to tokens and content
//! - Content-Length, chunked and connection-close framing in both directions
//! - Persistent connections and pipelined requests
//! - Folded (multi-line) header values, chunk extensions and trailers
//! - Interned well-known methods, versions, header names and values
//! - In-memory, blocking stream and non-blocking tokio TCP end points
//!
//! # Example
//!
//! ```
//! use micro_http_engine::connection::{HttpInput, HttpOutput};
//! use micro_http_engine::io::ByteArrayEndPoint;
//! use micro_http_engine::protocol::{HttpError, InputEvent};
//!
//! let wire = "GET /hello HTTP/1.1\r\nHost: localhost\r\n\r\n";
//! let mut input = HttpInput::new(ByteArrayEndPoint::new(wire));
//! loop {
//!     match input.parse_next()? {
//!         InputEvent::Header => {
//!             let header = input.header().expect("head is complete");
//!             assert_eq!(header.uri(), Some(&b"/hello"[..]));
//!         }
//!         InputEvent::Eof | InputEvent::Closed => break,
//!         InputEvent::Content | InputEvent::Nop => {}
//!     }
//! }
//!
//! let mut output = HttpOutput::new(ByteArrayEndPoint::sink());
//! output.write_all(b"Hello World!")?;
//! assert!(output.close()?);
//! assert!(output.sink().output().starts_with(b"HTTP/1.1 200 OK\r\nContent-Length: 12\r\n"));
//! # Ok::<(), HttpError>(())
//! ```
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`buffer`]: fixed-capacity byte buffers, borrowed views and interned token caches
//! - [`io`]: the source and sink contracts and their implementations
//! - [`codec`]: the parser state machine and the output encoders
//! - [`connection`]: input and output of one connection, built on the codec
//! - [`protocol`]: message heads, well-known tokens, events and errors
//!
//! # Error Handling
//!
//! - [`protocol::ParseError`]: malformed or truncated input, always fatal for
//!   the connection
//! - [`protocol::SendError`]: misuse of an output or a failing sink
//! - [`protocol::BufferError`]: buffer overflow or write to a read-only buffer
//! - [`protocol::HttpError`]: either side, for callers handling both
//!
//! # Limitations
//!
//! - HTTP/1.x only, no TLS
//! - Trailer fields are accepted and dropped
//! - The longest head token is bounded by the parser buffer (8KB by default)
//! - Maximum number of headers: 64

pub mod buffer;
pub mod codec;
pub mod connection;
pub mod io;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
