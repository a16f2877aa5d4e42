//! Positional byte buffer with independent read and write cursors.
//!
//! A [`Buffer`] has a fixed capacity and three positions:
//!
//! ```text
//! 0 <= mark? <= get_index <= put_index <= capacity
//! ```
//!
//! Bytes in `[get_index, put_index)` are unread content, bytes in
//! `[put_index, capacity)` are free space. The mark remembers a read position,
//! typically the start of a token that is still being scanned, and
//! [`Buffer::compact`] keeps everything from the mark on when it reclaims room.

use std::fmt;
use std::io;

use bytes::{Bytes, BytesMut};

use crate::buffer::view::{case_insensitive_hash, View};
use crate::ensure;
use crate::protocol::BufferError;

enum Storage {
    /// exclusively owned, mutable storage
    ReadWrite(BytesMut),
    /// shared storage that must never be written
    ReadOnly(Bytes),
}

impl Storage {
    #[inline]
    fn as_slice(&self) -> &[u8] {
        match self {
            Storage::ReadWrite(bytes) => bytes,
            Storage::ReadOnly(bytes) => bytes,
        }
    }
}

pub struct Buffer {
    storage: Storage,
    get: usize,
    put: usize,
    mark: Option<usize>,
}

impl Buffer {
    /// Creates an empty, writable buffer. The capacity never changes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { storage: Storage::ReadWrite(BytesMut::zeroed(capacity)), get: 0, put: 0, mark: None }
    }

    /// Wraps shared bytes as a full, read-only buffer.
    pub fn read_only(bytes: Bytes) -> Self {
        let put = bytes.len();
        Self { storage: Storage::ReadOnly(bytes), get: 0, put, mark: None }
    }

    pub fn from_static(bytes: &'static [u8]) -> Self {
        Self::read_only(Bytes::from_static(bytes))
    }

    /// Turns this buffer read-only, keeping its cursors.
    pub fn freeze(self) -> Self {
        let storage = match self.storage {
            Storage::ReadWrite(bytes) => Storage::ReadOnly(bytes.freeze()),
            read_only @ Storage::ReadOnly(_) => read_only,
        };
        Self { storage, ..self }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.as_slice().len()
    }

    #[inline]
    pub fn get_index(&self) -> usize {
        self.get
    }

    #[inline]
    pub fn put_index(&self) -> usize {
        self.put
    }

    #[inline]
    pub fn mark_index(&self) -> Option<usize> {
        self.mark
    }

    /// Number of unread bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.put - self.get
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.put == self.get
    }

    #[inline]
    pub fn has_content(&self) -> bool {
        self.put > self.get
    }

    /// Free room after the write cursor.
    #[inline]
    pub fn space(&self) -> usize {
        self.capacity() - self.put
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        matches!(self.storage, Storage::ReadOnly(_))
    }

    /// Reads one byte, or `None` when no unread data is left.
    #[inline]
    pub fn get(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.get += 1;
        Some(b)
    }

    /// Reads up to `n` bytes as a zero-copy view.
    pub fn get_bytes(&mut self, n: usize) -> View<'_> {
        let start = self.get;
        let end = start + n.min(self.len());
        self.get = end;
        View::new(&self.storage.as_slice()[start..end], start)
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.peek_at(self.get)
    }

    /// The byte at an absolute index, if it has been written.
    #[inline]
    pub fn peek_at(&self, index: usize) -> Option<u8> {
        if index < self.put { Some(self.storage.as_slice()[index]) } else { None }
    }

    /// Advances the read cursor by at most `n` bytes, returning how many were skipped.
    pub fn skip(&mut self, n: usize) -> usize {
        let n = n.min(self.len());
        self.get += n;
        n
    }

    /// Remembers the current read position.
    #[inline]
    pub fn mark(&mut self) {
        self.mark = Some(self.get);
    }

    /// Remembers an arbitrary already-read position. An index past the read
    /// cursor marks the read cursor.
    #[inline]
    pub fn mark_at(&mut self, index: usize) {
        debug_assert!(index <= self.get, "mark {index} beyond read index {}", self.get);
        self.mark = Some(index.min(self.get));
    }

    #[inline]
    pub fn clear_mark(&mut self) {
        self.mark = None;
    }

    /// Rewinds the read cursor to the mark, if any.
    pub fn reset(&mut self) {
        if let Some(mark) = self.mark {
            self.get = mark;
        }
    }

    /// Empties the buffer: both cursors go back to zero and the mark is dropped.
    pub fn clear(&mut self) {
        self.get = 0;
        self.put = 0;
        self.mark = None;
    }

    /// A view over the unread bytes `[get_index, put_index)`.
    #[inline]
    pub fn slice(&self) -> View<'_> {
        self.view(self.get..self.put)
    }

    /// A view over the bytes read since the mark, `[mark, get_index)`.
    pub fn slice_from_mark(&self) -> Option<View<'_>> {
        self.mark.map(|mark| self.view(mark..self.get))
    }

    /// A view over an arbitrary written range, cut short at the write cursor.
    #[inline]
    pub fn view(&self, range: std::ops::Range<usize>) -> View<'_> {
        debug_assert!(range.end <= self.put, "view {range:?} beyond put index {}", self.put);
        let end = range.end.min(self.put);
        let start = range.start.min(end);
        View::new(&self.storage.as_slice()[start..end], start)
    }

    fn storage_mut(&mut self) -> Result<&mut BytesMut, BufferError> {
        match &mut self.storage {
            Storage::ReadWrite(bytes) => Ok(bytes),
            Storage::ReadOnly(_) => Err(BufferError::ReadOnly),
        }
    }

    pub fn put(&mut self, b: u8) -> Result<(), BufferError> {
        self.put_slice(&[b])
    }

    /// Appends all of `src`, or nothing at all when it does not fit.
    pub fn put_slice(&mut self, src: &[u8]) -> Result<(), BufferError> {
        let (space, capacity, put) = (self.space(), self.capacity(), self.put);
        let storage = self.storage_mut()?;
        if src.len() > space {
            return Err(BufferError::overflow(src.len(), space, capacity));
        }

        storage[put..put + src.len()].copy_from_slice(src);
        self.put += src.len();
        Ok(())
    }

    /// Moves the unread content of `src` into this buffer.
    pub fn put_buffer(&mut self, src: &mut Buffer) -> Result<usize, BufferError> {
        let len = src.len();
        self.put_slice(&src.storage.as_slice()[src.get..src.put])?;
        src.get += len;
        Ok(len)
    }

    /// The writable space after the write cursor, for sources that read
    /// straight into the buffer. Follow with [`Buffer::advance_put`].
    pub fn spare_mut(&mut self) -> Result<&mut [u8], BufferError> {
        let put = self.put;
        Ok(&mut self.storage_mut()?[put..])
    }

    /// Marks `n` bytes after the write cursor as written.
    pub fn advance_put(&mut self, n: usize) -> Result<(), BufferError> {
        ensure!(n <= self.space(), BufferError::overflow(n, self.space(), self.capacity()));
        self.put += n;
        Ok(())
    }

    /// Moves unread bytes (from the mark if set, otherwise from the read
    /// cursor) down to offset zero and rebases every cursor.
    ///
    /// Returns the distance everything moved by.
    pub fn compact(&mut self) -> Result<usize, BufferError> {
        let start = self.mark.unwrap_or(self.get);
        if start == 0 {
            return Ok(0);
        }

        let put = self.put;
        self.storage_mut()?.copy_within(start..put, 0);

        self.mark = self.mark.map(|mark| mark - start);
        self.get -= start;
        self.put -= start;
        Ok(start)
    }

    /// Copies the unread bytes into an independent [`Bytes`].
    pub fn as_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.slice())
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.slice()).into_owned()
    }

    /// Compares the unread bytes with `other`, ignoring ASCII case.
    pub fn eq_ignore_case(&self, other: &[u8]) -> bool {
        self.slice().eq_ignore_case(other)
    }

    /// Case-insensitive hash of the unread bytes, consistent with [`View`] and
    /// [`CachedBuffer`](super::CachedBuffer).
    pub fn case_insensitive_hash(&self) -> u64 {
        case_insensitive_hash(&self.slice())
    }

    pub(crate) fn set_get_index(&mut self, index: usize) {
        debug_assert!(index <= self.put);
        self.get = index;
    }

    pub(crate) fn set_mark_index(&mut self, mark: Option<usize>) {
        debug_assert!(mark.is_none_or(|m| m <= self.get));
        self.mark = mark;
    }
}

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = buf.len().min(self.space());
        self.put_slice(&buf[..n])?;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("mark", &self.mark)
            .field("get", &self.get)
            .field("put", &self.put)
            .field("capacity", &self.capacity())
            .field("read_only", &self.is_read_only())
            .field("content", &self.to_string_lossy())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn cursors_move_independently() {
        let mut buffer = Buffer::with_capacity(16);
        buffer.put_slice(b"hello").unwrap();
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.space(), 11);

        assert_eq!(buffer.get(), Some(b'h'));
        assert_eq!(buffer.peek(), Some(b'e'));
        assert_eq!(buffer.get_bytes(10).as_slice(), b"ello");
        assert_eq!(buffer.get(), None);
        assert!(buffer.is_empty());
    }

    #[test]
    fn overflow_is_rejected_without_partial_write() {
        let mut buffer = Buffer::with_capacity(4);
        buffer.put_slice(b"abc").unwrap();
        let err = buffer.put_slice(b"de").unwrap_err();
        assert_eq!(err, BufferError::overflow(2, 1, 4));
        assert_eq!(buffer.put_index(), 3);
        buffer.put(b'd').unwrap();
        assert!(buffer.put(b'e').is_err());
    }

    #[test]
    fn advance_put_stays_within_capacity() {
        let mut buffer = Buffer::with_capacity(4);
        buffer.spare_mut().unwrap()[..3].copy_from_slice(b"abc");
        buffer.advance_put(3).unwrap();
        assert_eq!(buffer.slice().as_slice(), b"abc");

        assert_eq!(buffer.advance_put(2), Err(BufferError::overflow(2, 1, 4)));
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn read_only_rejects_writes() {
        let mut buffer = Buffer::from_static(b"GET");
        assert!(buffer.is_read_only());
        assert_eq!(buffer.put(b'x'), Err(BufferError::ReadOnly));
        assert_eq!(buffer.compact(), Ok(0));
        buffer.get();
        assert_eq!(buffer.compact(), Err(BufferError::ReadOnly));
        assert_eq!(buffer.to_string_lossy(), "ET");
    }

    #[test]
    fn mark_slice_and_reset() {
        let mut buffer = Buffer::with_capacity(32);
        buffer.put_slice(b"GET /foo").unwrap();
        buffer.mark();
        buffer.skip(3);
        assert_eq!(buffer.slice_from_mark().unwrap().as_slice(), b"GET");
        assert_eq!(buffer.slice().as_slice(), b" /foo");

        buffer.reset();
        assert_eq!(buffer.get_index(), 0);
        assert_eq!(buffer.slice().as_slice(), b"GET /foo");
    }

    #[test]
    fn compact_keeps_bytes_from_mark() {
        let mut buffer = Buffer::with_capacity(16);
        buffer.put_slice(b"xxxxHost: y").unwrap();
        buffer.skip(4);
        buffer.mark();
        buffer.skip(5);

        let shift = buffer.compact().unwrap();
        assert_eq!(shift, 4);
        assert_eq!(buffer.mark_index(), Some(0));
        assert_eq!(buffer.get_index(), 5);
        assert_eq!(buffer.put_index(), 7);
        assert_eq!(buffer.slice_from_mark().unwrap().as_slice(), b"Host:");
        assert_eq!(buffer.slice().as_slice(), b" y");
    }

    #[test]
    fn compact_without_mark_starts_at_read_cursor() {
        let mut buffer = Buffer::with_capacity(8);
        buffer.put_slice(b"abcdefgh").unwrap();
        buffer.skip(6);
        assert_eq!(buffer.space(), 0);
        assert_eq!(buffer.compact().unwrap(), 6);
        assert_eq!(buffer.slice().as_slice(), b"gh");
        assert_eq!(buffer.space(), 6);
    }

    #[test]
    fn views_are_copied_on_materialize() {
        let mut buffer = Buffer::with_capacity(8);
        buffer.put_slice(b"abc").unwrap();
        let copy = buffer.as_bytes();
        buffer.clear();
        buffer.put_slice(b"xyz").unwrap();
        assert_eq!(&copy[..], b"abc");
    }

    #[test]
    fn put_buffer_moves_content() {
        let mut src = Buffer::with_capacity(8);
        src.put_slice(b"chunk").unwrap();
        let mut dst = Buffer::with_capacity(8);
        assert_eq!(dst.put_buffer(&mut src).unwrap(), 5);
        assert!(src.is_empty());
        assert_eq!(dst.slice().as_slice(), b"chunk");
    }

    #[test]
    fn write_macro_formats_into_buffer() {
        let mut buffer = Buffer::with_capacity(16);
        write!(buffer, "{:X}\r\n", 255).unwrap();
        assert_eq!(buffer.slice().as_slice(), b"FF\r\n");

        let mut tiny = Buffer::with_capacity(2);
        assert!(write!(tiny, "{}", 12345).is_err());
    }

    #[test]
    fn case_insensitive_equality() {
        let mut buffer = Buffer::with_capacity(8);
        buffer.put_slice(b"chunked").unwrap();
        assert!(buffer.eq_ignore_case(b"CHUNKED"));
        assert_eq!(buffer.case_insensitive_hash(), Buffer::from_static(b"Chunked").case_insensitive_hash());
    }

    #[test]
    fn freeze_keeps_content() {
        let mut buffer = Buffer::with_capacity(8);
        buffer.put_slice(b"keep").unwrap();
        let frozen = buffer.freeze();
        assert!(frozen.is_read_only());
        assert_eq!(frozen.to_string_lossy(), "keep");
    }
}
