use std::io::{self, IoSlice};
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpStream;
use tracing::{trace, warn};

use crate::buffer::Buffer;
use crate::io::{ByteSink, ByteSource, Fill};

/// A non-blocking end point over a tokio [`TcpStream`].
///
/// Fills and flushes never wait: they use `try_read`/`try_write`, and a
/// would-block becomes zero progress. Wait for readiness with
/// [`TcpEndPoint::readable`] / [`TcpEndPoint::writable`] before retrying.
///
/// Clones share the stream, so one clone can feed an
/// [`HttpInput`](crate::connection::HttpInput) while another drains an
/// [`HttpOutput`](crate::connection::HttpOutput).
#[derive(Debug)]
pub struct TcpEndPoint {
    stream: Arc<TcpStream>,
    open: bool,
}

impl TcpEndPoint {
    pub fn new(stream: TcpStream) -> Self {
        Self { stream: Arc::new(stream), open: true }
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.stream.peer_addr()
    }

    /// Waits until the stream may have bytes to read.
    pub async fn readable(&self) -> io::Result<()> {
        self.stream.readable().await
    }

    /// Waits until the stream may accept bytes.
    pub async fn writable(&self) -> io::Result<()> {
        self.stream.writable().await
    }
}

impl Clone for TcpEndPoint {
    fn clone(&self) -> Self {
        Self { stream: Arc::clone(&self.stream), open: self.open }
    }
}

fn would_block(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted)
}

impl ByteSource for TcpEndPoint {
    fn fill(&mut self, buffer: &mut Buffer) -> io::Result<Fill> {
        if !self.open {
            return Ok(Fill::Eof);
        }

        let spare = buffer.spare_mut()?;
        if spare.is_empty() {
            return Ok(Fill::Filled(0));
        }

        match self.stream.try_read(spare) {
            Ok(0) => {
                trace!("peer closed the connection");
                self.open = false;
                Ok(Fill::Eof)
            }
            Ok(n) => {
                buffer.advance_put(n)?;
                trace!(len = n, "filled from tcp stream");
                Ok(Fill::Filled(n))
            }
            Err(e) if would_block(&e) => Ok(Fill::Filled(0)),
            Err(e) => {
                warn!(cause = %e, "failed to read from tcp stream");
                Err(e)
            }
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

impl ByteSink for TcpEndPoint {
    fn flush(&mut self, buffer: &mut Buffer) -> io::Result<usize> {
        if buffer.is_empty() {
            return Ok(0);
        }

        let result = self.stream.try_write(&buffer.slice());
        match result {
            Ok(n) => Ok(buffer.skip(n)),
            Err(e) if would_block(&e) => Ok(0),
            Err(e) => Err(e),
        }
    }

    /// One vectored write for the three buffers.
    fn flush_gathered(&mut self, header: &mut Buffer, body: &mut Buffer, trailer: &mut Buffer) -> io::Result<usize> {
        let result = {
            let (h, b, t) = (header.slice(), body.slice(), trailer.slice());
            self.stream.try_write_vectored(&[IoSlice::new(&h), IoSlice::new(&b), IoSlice::new(&t)])
        };

        let mut written = match result {
            Ok(n) => n,
            Err(e) if would_block(&e) => return Ok(0),
            Err(e) => return Err(e),
        };
        let total = written;
        for buffer in [header, body, trailer] {
            written -= buffer.skip(written);
        }
        trace!(len = total, "gathered write to tcp stream");
        Ok(total)
    }

    fn close(&mut self) -> io::Result<()> {
        self.open = false;
        Ok(())
    }
}
