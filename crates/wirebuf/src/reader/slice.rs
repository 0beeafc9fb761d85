use bytes::Bytes;

use super::source::WireSource;
use crate::{
    error::{DecodeError, DecodeErrorKind},
    rope::ByteBuffer,
    varint,
};

enum Storage<'a> {
    Borrowed(&'a [u8]),
    Shared(Bytes),
}

impl Storage<'_> {
    fn as_slice(&self) -> &[u8] {
        match self {
            Storage::Borrowed(slice) => slice,
            Storage::Shared(bytes) => bytes,
        }
    }
}

/// In-memory input: a borrowed slice or shared [`Bytes`].
///
/// Byte fields are copied out of borrowed input. Shared input that was declared
/// immutable is sliced instead, so the returned buffers keep the input alive
/// rather than duplicating it.
pub struct SliceSource<'a> {
    storage: Storage<'a>,
    pos: usize,
    limit: Option<usize>,
    alias: bool,
}

impl<'a> SliceSource<'a> {
    /// Reads from `slice`, copying byte fields.
    #[must_use]
    pub fn borrowed(slice: &'a [u8]) -> Self {
        Self {
            storage: Storage::Borrowed(slice),
            pos: 0,
            limit: None,
            alias: false,
        }
    }
}

impl SliceSource<'static> {
    /// Reads from shared storage. With `alias` set, byte fields share `bytes`
    /// instead of being copied.
    #[must_use]
    pub fn shared(bytes: Bytes, alias: bool) -> Self {
        Self {
            storage: Storage::Shared(bytes),
            pos: 0,
            limit: None,
            alias,
        }
    }
}

impl SliceSource<'_> {
    /// The readable part of the input: everything up to the limit.
    fn window(&self) -> &[u8] {
        let data = self.storage.as_slice();
        match self.limit {
            Some(limit) if limit < data.len() => &data[..limit],
            _ => data,
        }
    }

    fn claim(&mut self, len: usize) -> Result<usize, DecodeError> {
        let start = self.pos;
        match start.checked_add(len) {
            Some(end) if end <= self.window().len() => {
                self.pos = end;
                Ok(start)
            }
            _ => Err(DecodeError::new(DecodeErrorKind::TruncatedMessage, start)),
        }
    }
}

impl WireSource for SliceSource<'_> {
    fn position(&self) -> usize {
        self.pos
    }

    fn limit(&self) -> Option<usize> {
        self.limit
    }

    fn set_limit(&mut self, limit: Option<usize>) {
        self.limit = limit;
    }

    fn is_at_end(&mut self) -> Result<bool, DecodeError> {
        Ok(self.pos >= self.window().len())
    }

    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        let start = self.claim(1)?;
        Ok(self.storage.as_slice()[start])
    }

    fn read_into(&mut self, dst: &mut [u8]) -> Result<(), DecodeError> {
        let start = self.claim(dst.len())?;
        dst.copy_from_slice(&self.storage.as_slice()[start..self.pos]);
        Ok(())
    }

    fn read_buffer(&mut self, len: usize) -> Result<ByteBuffer, DecodeError> {
        let start = self.claim(len)?;
        Ok(match &self.storage {
            Storage::Shared(bytes) if self.alias => ByteBuffer::wrap(bytes.slice(start..self.pos)),
            storage => ByteBuffer::copy_from(&storage.as_slice()[start..self.pos]),
        })
    }

    fn skip(&mut self, len: usize) -> Result<(), DecodeError> {
        self.claim(len).map(|_| ())
    }

    fn read_varint64(&mut self) -> Result<u64, DecodeError> {
        let (value, next) = varint::decode_varint64(self.window(), self.pos)?;
        self.pos = next;
        Ok(value)
    }
}
