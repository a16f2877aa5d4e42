//! HTTP head encoding.
//!
//! # Components
//!
//! - [`HeaderEncoder`]: serializes an [`HttpHeader`](crate::protocol::HttpHeader)
//!   into a [`Buffer`](crate::buffer::Buffer)
//!   - Start line tokens joined by single spaces
//!   - Fields in insertion order, duplicates kept
//!   - Refuses a head larger than the buffer

mod header_encoder;

pub use header_encoder::HeaderEncoder;
