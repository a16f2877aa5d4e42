//! Interning of well-known byte sequences.
//!
//! A [`BufferCache`] maps short tokens (methods, versions, header names,
//! reason phrases) to small integer ordinals. Lookups hash the candidate
//! bytes case-insensitively, so the hot path can resolve a token straight
//! from a parser [`View`] and then dispatch on the ordinal instead of
//! comparing strings.
//!
//! Caches are meant to be built once, then frozen behind a
//! [`once_cell::sync::Lazy`] static: [`BufferCache::add`] needs `&mut self`,
//! every lookup only `&self`.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use bytes::Bytes;

use crate::buffer::view::{case_insensitive_hash, View};

/// An interned, immutable token together with its ordinal.
#[derive(Clone)]
pub struct CachedBuffer {
    value: Bytes,
    ordinal: usize,
}

impl CachedBuffer {
    #[inline]
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// The canonical bytes. Cloning them is a reference count bump on static data.
    #[inline]
    pub fn bytes(&self) -> &Bytes {
        &self.value
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.value
    }

    pub fn as_str(&self) -> &str {
        // only ever built from `&'static str`
        std::str::from_utf8(&self.value).unwrap_or_default()
    }

    pub fn view(&self) -> View<'_> {
        View::detached(&self.value)
    }
}

impl PartialEq for CachedBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.value.eq_ignore_ascii_case(&other.value)
    }
}

impl Eq for CachedBuffer {}

impl PartialEq<View<'_>> for CachedBuffer {
    fn eq(&self, other: &View<'_>) -> bool {
        self.value.eq_ignore_ascii_case(other.as_slice())
    }
}

impl PartialEq<CachedBuffer> for View<'_> {
    fn eq(&self, other: &CachedBuffer) -> bool {
        other == self
    }
}

impl Hash for CachedBuffer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(case_insensitive_hash(&self.value));
    }
}

impl fmt::Debug for CachedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedBuffer").field("value", &self.as_str()).field("ordinal", &self.ordinal).finish()
    }
}

impl fmt::Display for CachedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default)]
pub struct BufferCache {
    /// dense table, indexed by ordinal
    by_ordinal: Vec<Option<CachedBuffer>>,
    /// case-insensitive content hash -> ordinals sharing that hash
    by_hash: HashMap<u64, Vec<usize>>,
}

impl BufferCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `value` under `ordinal`.
    ///
    /// A value registered twice keeps its first ordinal for content lookups,
    /// while the later ordinal still resolves through [`BufferCache::get`].
    pub fn add(&mut self, value: &'static str, ordinal: usize) -> &CachedBuffer {
        if self.by_ordinal.len() <= ordinal {
            self.by_ordinal.resize(ordinal + 1, None);
        }

        let hash = case_insensitive_hash(value.as_bytes());
        let bucket = self.by_hash.entry(hash).or_default();
        let known = bucket.iter().any(|&o| self.by_ordinal[o].as_ref().is_some_and(|c| c.value.eq_ignore_ascii_case(value.as_bytes())));
        if !known {
            bucket.push(ordinal);
        }

        self.by_ordinal[ordinal].insert(CachedBuffer { value: Bytes::from_static(value.as_bytes()), ordinal })
    }

    /// O(1) lookup by ordinal.
    #[inline]
    pub fn get(&self, ordinal: usize) -> Option<&CachedBuffer> {
        self.by_ordinal.get(ordinal).and_then(Option::as_ref)
    }

    /// Finds the canonical cached buffer with the same content, ignoring case.
    pub fn lookup(&self, bytes: &[u8]) -> Option<&CachedBuffer> {
        self.by_hash
            .get(&case_insensitive_hash(bytes))?
            .iter()
            .filter_map(|&ordinal| self.get(ordinal))
            .find(|cached| cached.value.eq_ignore_ascii_case(bytes))
    }

    #[inline]
    pub fn ordinal(&self, bytes: &[u8]) -> Option<usize> {
        self.lookup(bytes).map(CachedBuffer::ordinal)
    }

    /// The canonical bytes when cached, otherwise an independent copy.
    pub fn lookup_or_copy(&self, bytes: &[u8]) -> Bytes {
        match self.lookup(bytes) {
            Some(cached) => cached.value.clone(),
            None => Bytes::copy_from_slice(bytes),
        }
    }

    /// The cached bytes when `bytes` is spelled exactly like a cached entry,
    /// otherwise an independent copy. Unlike [`BufferCache::lookup_or_copy`]
    /// the content is never changed.
    pub fn share_or_copy(&self, bytes: &[u8]) -> Bytes {
        match self.lookup(bytes) {
            Some(cached) if cached.as_slice() == bytes => cached.value.clone(),
            _ => Bytes::copy_from_slice(bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.by_ordinal.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
