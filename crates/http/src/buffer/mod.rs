//! Byte buffers, zero-copy views and token interning.
//!
//! - [`Buffer`]: fixed capacity storage with read/write cursors, mark and compaction
//! - [`View`]: a borrowed slice of a buffer, handed out by the parser
//! - [`BufferCache`]: interns well-known tokens to ordinals for O(1) dispatch

#[allow(clippy::module_inception, reason = "the buffer type lives in its own file like its siblings")]
mod buffer;
mod cache;
mod view;

pub use buffer::Buffer;
pub use cache::{BufferCache, CachedBuffer};
pub use view::{case_insensitive_hash, View};

pub(crate) use view::parse_decimal;
