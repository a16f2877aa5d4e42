//! One connection's worth of HTTP/1.x input and output.
//!
//! # Components
//!
//! - [`HttpInput`]: pulls messages out of a [`ByteSource`](crate::io::ByteSource)
//!   - Accumulates the head into an [`HttpHeader`](crate::protocol::HttpHeader)
//!   - Lends content straight out of the parser buffer
//!   - Drains unread content so a persistent connection can be reused
//!
//! - [`HttpOutput`]: pushes messages into a [`ByteSink`](crate::io::ByteSink)
//!   - Chooses the content framing when the head is committed
//!   - Frames chunks around the body buffer without copying it
//!   - Survives partial writes of non-blocking sinks
//!
//! Both sides are reused across the messages of a persistent connection with
//! their `reset` methods.

mod http_input;
mod http_output;

pub use http_input::{HttpInput, MAX_HEADER_NUM};
pub use http_output::{HttpOutput, DEFAULT_BODY_BUFFER_SIZE, DEFAULT_HEADER_BUFFER_SIZE};
