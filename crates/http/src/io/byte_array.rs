use std::collections::VecDeque;
use std::io;

use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::buffer::Buffer;
use crate::io::{ByteSink, ByteSource, Fill};

/// An in-memory end point.
///
/// Input is a queue of pieces, each delivered by separate fills, so a test can
/// split one message at any offset. An empty piece simulates a read that found
/// nothing. Once the queue is drained the source reports [`Fill::Eof`], unless
/// it was built with [`ByteArrayEndPoint::keep_open`].
///
/// Output accumulates in memory.
#[derive(Debug, Default)]
pub struct ByteArrayEndPoint {
    input: VecDeque<Bytes>,
    max_fill: Option<usize>,
    max_flush: Option<usize>,
    output: BytesMut,
    keep_open: bool,
    closed: bool,
}

impl ByteArrayEndPoint {
    pub fn new(input: impl Into<Bytes>) -> Self {
        Self::from_pieces([input.into()])
    }

    pub fn from_pieces<I, B>(pieces: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self { input: pieces.into_iter().map(Into::into).collect(), ..Self::default() }
    }

    /// A sink-only end point with no input.
    pub fn sink() -> Self {
        Self::default()
    }

    /// Caps every fill at `max` bytes.
    #[must_use]
    pub fn with_max_fill(mut self, max: usize) -> Self {
        self.max_fill = Some(max);
        self
    }

    /// Caps every flush at `max` bytes, to exercise partial writes.
    #[must_use]
    pub fn with_max_flush(mut self, max: usize) -> Self {
        self.max_flush = Some(max);
        self
    }

    /// Report "nothing available" instead of EOF once the input is drained.
    #[must_use]
    pub fn keep_open(mut self) -> Self {
        self.keep_open = true;
        self
    }

    pub fn push_input(&mut self, piece: impl Into<Bytes>) {
        self.input.push_back(piece.into());
    }

    /// Bytes not yet handed to a fill.
    pub fn remaining_input(&self) -> usize {
        self.input.iter().map(Bytes::len).sum()
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn take_output(&mut self) -> Bytes {
        self.output.split().freeze()
    }

    pub fn set_max_flush(&mut self, max: Option<usize>) {
        self.max_flush = max;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl ByteSource for ByteArrayEndPoint {
    fn fill(&mut self, buffer: &mut Buffer) -> io::Result<Fill> {
        if self.closed {
            return Ok(Fill::Eof);
        }

        let Some(piece) = self.input.front_mut() else {
            return Ok(if self.keep_open { Fill::Filled(0) } else { Fill::Eof });
        };

        let len = piece.len().min(buffer.space()).min(self.max_fill.unwrap_or(usize::MAX));
        buffer.put_slice(&piece.split_to(len))?;
        if piece.is_empty() {
            self.input.pop_front();
        }

        trace!(len, "filled from byte array");
        Ok(Fill::Filled(len))
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        self.input.clear();
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.closed
    }
}

impl ByteSink for ByteArrayEndPoint {
    fn flush(&mut self, buffer: &mut Buffer) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }

        let view = buffer.get_bytes(self.max_flush.unwrap_or(usize::MAX));
        self.output.extend_from_slice(&view);
        Ok(view.len())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        Ok(())
    }
}
