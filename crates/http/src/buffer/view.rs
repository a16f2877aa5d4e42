//! Borrowed, zero-copy views over a [`Buffer`](super::Buffer).
//!
//! A [`View`] is what the parser hands to its handler for every token and
//! content chunk. It borrows the parent buffer's storage, so the borrow checker
//! guarantees the buffer is not compacted or refilled while the view is alive.
//!
//! Views compare and hash case-insensitively (ASCII), using the same hash as
//! [`CachedBuffer`](super::CachedBuffer). This lets a live view over `get` find
//! the canonical cached `GET` without any allocation.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Deref, Range};

use bytes::Bytes;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hashes `bytes` ignoring ASCII case.
///
/// Every token type of this crate (views, cached buffers, whole buffers) hashes
/// through this function, so equal tokens hash equal regardless of which
/// storage they live in.
pub fn case_insensitive_hash(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, b| (hash ^ u64::from(b.to_ascii_uppercase())).wrapping_mul(FNV_PRIME))
}

/// A read-only window `[index, index + len)` into a parent buffer.
#[derive(Clone, Copy)]
pub struct View<'a> {
    bytes: &'a [u8],
    index: usize,
}

impl<'a> View<'a> {
    /// Creates a view over `bytes`, which start at `index` within the parent.
    #[inline]
    pub(crate) fn new(bytes: &'a [u8], index: usize) -> Self {
        Self { bytes, index }
    }

    /// A detached view, not backed by any buffer.
    #[inline]
    pub fn detached(bytes: &'a [u8]) -> Self {
        Self { bytes, index: 0 }
    }

    /// Position of the first byte of this view inside its parent buffer.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The range of the parent buffer covered by this view.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.index..self.index + self.bytes.len()
    }

    #[inline]
    pub fn as_slice(&self) -> &'a [u8] {
        self.bytes
    }

    /// Copies the viewed bytes into an independent [`Bytes`].
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.bytes)
    }

    pub fn to_str(&self) -> Option<&'a str> {
        std::str::from_utf8(self.bytes).ok()
    }

    #[inline]
    pub fn eq_ignore_case(&self, other: &[u8]) -> bool {
        self.bytes.eq_ignore_ascii_case(other)
    }

    /// Parses the view as an unsigned decimal, ignoring surrounding whitespace.
    pub fn to_u64(&self) -> Option<u64> {
        parse_decimal(self.bytes)
    }
}

/// Parses an unsigned decimal number, ignoring surrounding whitespace.
///
/// Returns `None` on empty input, non-digits or overflow.
pub(crate) fn parse_decimal(bytes: &[u8]) -> Option<u64> {
    let digits = bytes.trim_ascii();
    if digits.is_empty() {
        return None;
    }

    digits.iter().try_fold(0u64, |acc, b| match b {
        b'0'..=b'9' => acc.checked_mul(10)?.checked_add(u64::from(b - b'0')),
        _ => None,
    })
}

impl Deref for View<'_> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.bytes
    }
}

impl AsRef<[u8]> for View<'_> {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self.bytes
    }
}

impl PartialEq for View<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.eq_ignore_ascii_case(other.bytes)
    }
}

impl Eq for View<'_> {}

impl PartialEq<[u8]> for View<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        self.bytes.eq_ignore_ascii_case(other)
    }
}

impl<const N: usize> PartialEq<&[u8; N]> for View<'_> {
    fn eq(&self, other: &&[u8; N]) -> bool {
        self.bytes.eq_ignore_ascii_case(&other[..])
    }
}

impl PartialEq<&str> for View<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.bytes.eq_ignore_ascii_case(other.as_bytes())
    }
}

impl Hash for View<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(case_insensitive_hash(self.bytes));
    }
}

impl fmt::Debug for View<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View").field("index", &self.index).field("bytes", &String::from_utf8_lossy(self.bytes)).finish()
    }
}

impl fmt::Display for View<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_ignores_case() {
        assert_eq!(case_insensitive_hash(b"Content-Length"), case_insensitive_hash(b"content-length"));
        assert_eq!(case_insensitive_hash(b"GET"), case_insensitive_hash(b"gEt"));
        assert_ne!(case_insensitive_hash(b"GET"), case_insensitive_hash(b"PUT"));
    }

    #[test]
    fn views_compare_ignoring_case() {
        let a = View::new(b"Host", 3);
        let b = View::detached(b"HOST");
        assert_eq!(a, b);
        assert_eq!(a, "host");
        assert_eq!(a.range(), 3..7);
    }

    #[test]
    fn decimal_parsing() {
        assert_eq!(parse_decimal(b" 1024 "), Some(1024));
        assert_eq!(parse_decimal(b"0"), Some(0));
        assert_eq!(parse_decimal(b""), None);
        assert_eq!(parse_decimal(b"12a"), None);
        assert_eq!(parse_decimal(b"99999999999999999999999"), None);
    }
}
