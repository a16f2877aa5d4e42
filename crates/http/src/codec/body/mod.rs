//! Framing of outgoing message content.
//!
//! # Components
//!
//! - [`ChunkedEncoder`]: `<hex-size>CRLF<bytes>CRLF` chunks and the last chunk
//! - [`LengthEncoder`]: accounting against a declared `Content-Length`
//! - [`PayloadEncoder`]: picks one of the above (or EOF, or no content) when a
//!   head is committed
//!
//! Encoders never copy content. They write framing bytes around the body
//! buffer into the head and tail buffers of the output, which are then
//! flushed with one gathered write.

mod chunked_encoder;
mod length_encoder;
mod payload_encoder;

pub use chunked_encoder::ChunkedEncoder;
pub use length_encoder::LengthEncoder;
pub use payload_encoder::PayloadEncoder;
