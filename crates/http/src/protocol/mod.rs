//! Core HTTP protocol abstractions.
//!
//! This module holds the types shared by the parsing and the sending side:
//! the structured message head, the body framing classification, the events
//! the input side reports, the interned token tables and the error types.
//!
//! # Components
//!
//! - **Message head** (`header`): [`HttpHeader`] and its ordered [`HttpField`]s
//! - **Framing** (`message`):
//!   - [`ContentLength`]: how a body is delimited on the wire
//!   - [`InputEvent`]: what one pull step of the input side produced
//! - **Tokens** ([`tokens`]): frozen caches of methods, versions, header names,
//!   header values and reason phrases, resolved to ordinals
//! - **Error Handling** (`error`):
//!   - [`HttpError`]: Top-level error type
//!   - [`ParseError`]: Decoding errors, all fatal for the connection
//!   - [`SendError`]: Output errors
//!   - [`BufferError`]: Buffer misuse

mod message;
pub use message::ContentLength;
pub use message::InputEvent;

mod header;
pub use header::HttpField;
pub use header::HttpHeader;

pub mod tokens;

mod error;
pub use error::BufferError;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
