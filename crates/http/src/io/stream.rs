use std::io::{self, Read, Write};

use tracing::trace;

use crate::buffer::Buffer;
use crate::io::{fill_from, flush_into, ByteSink, ByteSource, Fill};

/// Adapts a blocking std stream, e.g. a `std::net::TcpStream` or a pipe.
///
/// Fills block until the stream yields bytes; flushes block until it takes
/// some. A stream switched to non-blocking mode reports would-block as zero
/// progress.
#[derive(Debug)]
pub struct StreamEndPoint<S> {
    stream: S,
    open: bool,
}

impl<S> StreamEndPoint<S> {
    pub fn new(stream: S) -> Self {
        Self { stream, open: true }
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Read> ByteSource for StreamEndPoint<S> {
    fn fill(&mut self, buffer: &mut Buffer) -> io::Result<Fill> {
        if !self.open {
            return Ok(Fill::Eof);
        }

        let fill = fill_from(&mut self.stream, buffer)?;
        if fill.is_eof() {
            trace!("stream reached eof");
            self.open = false;
        }
        Ok(fill)
    }

    fn close(&mut self) -> io::Result<()> {
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

impl<S: Write> ByteSink for StreamEndPoint<S> {
    fn flush(&mut self, buffer: &mut Buffer) -> io::Result<usize> {
        let written = flush_into(&mut self.stream, buffer)?;
        if buffer.is_empty() {
            self.stream.flush()?;
        }
        Ok(written)
    }

    fn close(&mut self) -> io::Result<()> {
        self.open = false;
        self.stream.flush()
    }
}
