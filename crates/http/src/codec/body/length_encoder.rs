use tracing::warn;

use crate::ensure;
use crate::protocol::SendError;

/// Accounts content against a declared `Content-Length`. The content is sent
/// unframed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthEncoder {
    length: u64,
    written: u64,
}

impl LengthEncoder {
    pub fn new(length: u64) -> Self {
        Self { length, written: 0 }
    }

    pub fn encode(&mut self, len: usize) -> Result<(), SendError> {
        let written = self.written + len as u64;
        if written > self.length {
            warn!(declared = self.length, written, "content exceeds the declared length");
            return Err(SendError::content_length_exceeded(written - self.length));
        }
        self.written = written;
        Ok(())
    }

    pub fn encode_eof(&mut self) -> Result<(), SendError> {
        ensure!(self.is_finish(), SendError::content_length_mismatch(self.length, self.written));
        Ok(())
    }

    #[inline]
    pub fn length(&self) -> u64 {
        self.length
    }

    #[inline]
    pub fn remaining(&self) -> u64 {
        self.length - self.written
    }

    #[inline]
    pub fn is_finish(&self) -> bool {
        self.written == self.length
    }
}
