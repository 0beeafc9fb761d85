use std::io::{self, Read};

use alloc::{vec, vec::Vec};

use tracing::{debug, trace};

use super::source::WireSource;
use crate::{
    error::{DecodeError, DecodeErrorKind},
    rope::ByteBuffer,
};

/// Buffered input from a [`Read`] implementation.
///
/// Bytes are pulled in `buffer_size` blocks. Consumption is capped twice: by
/// the active limit, like every source, and by a size budget counted from the
/// last [`reset_size_counter`](WireSource::reset_size_counter), which guards
/// against unbounded input.
pub struct StreamSource<R> {
    reader: R,
    buf: Vec<u8>,
    pos: usize,
    filled: usize,
    /// Bytes discarded from before `buf[0]`.
    retired: usize,
    limit: Option<usize>,
    size_limit: usize,
    size_base: usize,
    eof: bool,
}

impl<R: Read> StreamSource<R> {
    /// Wraps `reader` with a buffer of `buffer_size` bytes (at least one).
    pub fn new(reader: R, buffer_size: usize, size_limit: usize) -> Self {
        Self {
            reader,
            buf: vec![0; buffer_size.max(1)],
            pos: 0,
            filled: 0,
            retired: 0,
            limit: None,
            size_limit,
            size_base: 0,
            eof: false,
        }
    }

    /// Gives back the wrapped reader. Buffered but unconsumed bytes are lost.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn error(&self, kind: DecodeErrorKind) -> DecodeError {
        DecodeError::new(kind, self.position())
    }

    /// Fails unless `len` more bytes may be consumed under both the limit and
    /// the size budget.
    fn check_budget(&self, len: usize) -> Result<(), DecodeError> {
        let end = self.position().saturating_add(len);
        if self.limit.is_some_and(|limit| end > limit) {
            return Err(self.error(DecodeErrorKind::TruncatedMessage));
        }
        if end - self.size_base > self.size_limit {
            debug!(
                position = self.position(),
                size_limit = self.size_limit,
                "stream size limit exceeded"
            );
            return Err(self.error(DecodeErrorKind::SizeLimitExceeded));
        }
        Ok(())
    }

    /// Refills an exhausted buffer. Returns `false` at end of stream.
    fn refill(&mut self) -> Result<bool, DecodeError> {
        debug_assert_eq!(self.pos, self.filled);
        if self.eof {
            return Ok(false);
        }
        self.retired += self.filled;
        self.pos = 0;
        self.filled = 0;
        loop {
            match self.reader.read(&mut self.buf) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(false);
                }
                Ok(n) => {
                    self.filled = n;
                    trace!(retired = self.retired, read = n, "refilled stream buffer");
                    return Ok(true);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(self.error(DecodeErrorKind::Io(e.kind()))),
            }
        }
    }

    /// Hands `len` bytes to `sink` piece by piece, refilling as needed.
    fn consume_with(
        &mut self,
        mut len: usize,
        mut sink: impl FnMut(&[u8]),
    ) -> Result<(), DecodeError> {
        self.check_budget(len)?;
        while len > 0 {
            if self.pos == self.filled && !self.refill()? {
                return Err(self.error(DecodeErrorKind::TruncatedMessage));
            }
            let n = len.min(self.filled - self.pos);
            sink(&self.buf[self.pos..self.pos + n]);
            self.pos += n;
            len -= n;
        }
        Ok(())
    }
}

impl<R: Read> WireSource for StreamSource<R> {
    fn position(&self) -> usize {
        self.retired + self.pos
    }

    fn limit(&self) -> Option<usize> {
        self.limit
    }

    fn set_limit(&mut self, limit: Option<usize>) {
        self.limit = limit;
    }

    fn is_at_end(&mut self) -> Result<bool, DecodeError> {
        if self.limit.is_some_and(|limit| self.position() >= limit) {
            return Ok(true);
        }
        if self.pos < self.filled {
            return Ok(false);
        }
        Ok(!self.refill()?)
    }

    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        self.check_budget(1)?;
        if self.pos == self.filled && !self.refill()? {
            return Err(self.error(DecodeErrorKind::TruncatedMessage));
        }
        let byte = self.buf[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    fn read_into(&mut self, dst: &mut [u8]) -> Result<(), DecodeError> {
        let mut written = 0;
        self.consume_with(dst.len(), |piece| {
            dst[written..written + piece.len()].copy_from_slice(piece);
            written += piece.len();
        })
    }

    /// Small fields come back as one leaf. Longer ones are gathered in
    /// buffer-sized pieces and joined into a rope, so a bogus length prefix
    /// cannot make the reader allocate more than the stream actually holds.
    fn read_buffer(&mut self, len: usize) -> Result<ByteBuffer, DecodeError> {
        let chunk = self.buf.len();
        if len <= chunk {
            let mut out = vec![0; len];
            self.read_into(&mut out)?;
            return Ok(ByteBuffer::from(out));
        }
        self.check_budget(len)?;
        let mut pieces = Vec::with_capacity(len.div_ceil(chunk).min(64));
        let mut remaining = len;
        while remaining > 0 {
            let mut piece = vec![0; remaining.min(chunk)];
            self.read_into(&mut piece)?;
            remaining -= piece.len();
            pieces.push(ByteBuffer::from(piece));
        }
        Ok(pieces.into_iter().collect())
    }

    fn skip(&mut self, len: usize) -> Result<(), DecodeError> {
        self.consume_with(len, |_| {})
    }

    fn set_size_limit(&mut self, limit: usize) -> usize {
        core::mem::replace(&mut self.size_limit, limit)
    }

    fn reset_size_counter(&mut self) {
        self.size_base = self.position();
    }
}
