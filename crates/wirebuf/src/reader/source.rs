use crate::{
    error::{DecodeError, DecodeErrorKind},
    rope::ByteBuffer,
    wire_format::{FIXED32_SIZE, FIXED64_SIZE},
};

/// A cursor over raw wire bytes.
///
/// [`WireReader`](super::WireReader) does all of its tag and field handling
/// through this trait, so the same decoding logic runs over in-memory input
/// ([`SliceSource`](super::SliceSource)) and over a
/// [`std::io::Read`] stream (`StreamSource`).
///
/// Positions are absolute byte counts from the start of the input. A limit,
/// when set, is an absolute position the source must not read past; reads that
/// would cross it fail with `TruncatedMessage`, and [`is_at_end`] reports
/// `true` once it is reached.
///
/// [`is_at_end`]: WireSource::is_at_end
pub trait WireSource {
    /// Bytes consumed so far.
    fn position(&self) -> usize;

    /// The active limit, if any.
    fn limit(&self) -> Option<usize>;

    /// Replaces the active limit.
    fn set_limit(&mut self, limit: Option<usize>);

    /// Whether no more bytes can be read, either because the limit was
    /// reached or the input ran out.
    ///
    /// # Errors
    ///
    /// Stream sources may fail while checking for more input.
    fn is_at_end(&mut self) -> Result<bool, DecodeError>;

    /// Reads one byte.
    ///
    /// # Errors
    ///
    /// `TruncatedMessage` at the end of input or the limit.
    fn read_byte(&mut self) -> Result<u8, DecodeError>;

    /// Fills `dst` completely.
    ///
    /// # Errors
    ///
    /// `TruncatedMessage` if fewer than `dst.len()` bytes remain.
    fn read_into(&mut self, dst: &mut [u8]) -> Result<(), DecodeError>;

    /// Reads the next `len` bytes as a buffer. Implementations may share
    /// storage with their input instead of copying.
    ///
    /// # Errors
    ///
    /// `TruncatedMessage` if fewer than `len` bytes remain.
    fn read_buffer(&mut self, len: usize) -> Result<ByteBuffer, DecodeError>;

    /// Discards the next `len` bytes.
    ///
    /// # Errors
    ///
    /// `TruncatedMessage` if fewer than `len` bytes remain.
    fn skip(&mut self, len: usize) -> Result<(), DecodeError>;

    /// Reads a varint of up to ten bytes.
    ///
    /// # Errors
    ///
    /// `MalformedVarint` if the tenth byte still has its continuation bit set.
    fn read_varint64(&mut self) -> Result<u64, DecodeError> {
        let start = self.position();
        let mut result = 0u64;
        for shift in (0..64).step_by(7) {
            let byte = self.read_byte()?;
            result |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(DecodeError::new(DecodeErrorKind::MalformedVarint, start))
    }

    /// Reads a varint and keeps the low 32 bits.
    ///
    /// # Errors
    ///
    /// Same as [`read_varint64`](WireSource::read_varint64).
    #[allow(clippy::cast_possible_truncation)]
    fn read_varint32(&mut self) -> Result<u32, DecodeError> {
        self.read_varint64().map(|value| value as u32)
    }

    /// Reads a little-endian `u32`.
    ///
    /// # Errors
    ///
    /// `TruncatedMessage` if fewer than four bytes remain.
    fn read_fixed32(&mut self) -> Result<u32, DecodeError> {
        let mut raw = [0; FIXED32_SIZE];
        self.read_into(&mut raw)?;
        Ok(u32::from_le_bytes(raw))
    }

    /// Reads a little-endian `u64`.
    ///
    /// # Errors
    ///
    /// `TruncatedMessage` if fewer than eight bytes remain.
    fn read_fixed64(&mut self) -> Result<u64, DecodeError> {
        let mut raw = [0; FIXED64_SIZE];
        self.read_into(&mut raw)?;
        Ok(u64::from_le_bytes(raw))
    }

    /// Sets the byte budget checked against by
    /// [`reset_size_counter`](WireSource::reset_size_counter). Returns the
    /// previous budget. Sources that hold their whole input ignore it.
    fn set_size_limit(&mut self, limit: usize) -> usize {
        limit
    }

    /// Starts a fresh size budget at the current position.
    fn reset_size_counter(&mut self) {}
}
