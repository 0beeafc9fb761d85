//! Field-by-field decoding of tag-length-value input.
//!
//! A [`WireReader`] walks a message one field at a time. The caller drives it:
//! [`next_field`](WireReader::next_field) yields the next field number, and
//! the caller picks the accessor matching the field's declared type, skips
//! the field, or stores it raw for later.
//!
//! ```rust
//! use wirebuf::WireReader;
//!
//! // field 1 = 150, field 2 = "hi"
//! let input = [0x08, 0x96, 0x01, 0x12, 0x02, b'h', b'i'];
//! let mut reader = WireReader::from_slice(&input);
//!
//! let mut id = 0;
//! let mut name = String::new();
//! while let Some(field) = reader.next_field()? {
//!     match field {
//!         1 => id = reader.read_int32()?,
//!         2 => name = reader.read_string(true)?,
//!         _ => {
//!             reader.skip_field()?;
//!         }
//!     }
//! }
//! assert_eq!((id, name.as_str()), (150, "hi"));
//! # Ok::<(), wirebuf::DecodeError>(())
//! ```
//!
//! Every error is terminal. After an `Err` the reader's state is unspecified
//! and it should be dropped.

pub mod kinds;
mod lists;
mod skip;
mod slice;
mod source;
#[cfg(feature = "std")]
mod stream;

use alloc::string::String;

use bytes::Bytes;
use tracing::debug;

pub use self::{slice::SliceSource, source::WireSource};
#[cfg(feature = "std")]
pub use self::stream::StreamSource;
use self::kinds::PackableScalar;
use crate::{
    error::{DecodeError, DecodeErrorKind},
    options::ReaderOptions,
    rope::ByteBuffer,
    utf8,
    wire_format::{WireType, make_tag, tag_field_number, tag_wire_type},
};

/// Decodes fields from a [`WireSource`].
pub struct WireReader<S> {
    source: S,
    /// Tag of the current field. 0 once the message is done.
    tag: u32,
    /// A tag read ahead while collecting an unpacked repeated field.
    next_tag: Option<u32>,
    /// End tag of the innermost open group.
    end_group_tag: Option<u32>,
    depth: usize,
    options: ReaderOptions,
}

impl<'a> WireReader<SliceSource<'a>> {
    /// Reads from a borrowed slice. Byte and string fields are copied out.
    #[must_use]
    pub fn from_slice(input: &'a [u8]) -> Self {
        Self::from_slice_with_options(input, ReaderOptions::default())
    }

    /// [`from_slice`](Self::from_slice) with explicit options.
    #[must_use]
    pub fn from_slice_with_options(input: &'a [u8], options: ReaderOptions) -> Self {
        Self::new(SliceSource::borrowed(input), options)
    }
}

impl WireReader<SliceSource<'static>> {
    /// Reads from shared storage.
    ///
    /// When `immutable` is set (and [`ReaderOptions::alias_immutable`] allows
    /// it) byte fields are returned as slices of `input` without copying.
    #[must_use]
    pub fn from_bytes(input: impl Into<Bytes>, immutable: bool) -> Self {
        Self::from_bytes_with_options(input, immutable, ReaderOptions::default())
    }

    /// [`from_bytes`](Self::from_bytes) with explicit options.
    #[must_use]
    pub fn from_bytes_with_options(
        input: impl Into<Bytes>,
        immutable: bool,
        options: ReaderOptions,
    ) -> Self {
        let alias = immutable && options.alias_immutable;
        Self::new(SliceSource::shared(input.into(), alias), options)
    }
}

#[cfg(feature = "std")]
impl<R: std::io::Read> WireReader<StreamSource<R>> {
    /// Reads from a stream through a buffer of
    /// [`ReaderOptions::buffer_size`] bytes.
    pub fn from_stream(input: R) -> Self {
        Self::from_stream_with_options(input, ReaderOptions::default())
    }

    /// [`from_stream`](Self::from_stream) with explicit options.
    pub fn from_stream_with_options(input: R, options: ReaderOptions) -> Self {
        let source = StreamSource::new(input, options.buffer_size, options.size_limit);
        Self::new(source, options)
    }
}

impl<S: WireSource> WireReader<S> {
    /// Wraps any source.
    pub fn new(source: S, options: ReaderOptions) -> Self {
        Self {
            source,
            tag: 0,
            next_tag: None,
            end_group_tag: None,
            depth: 0,
            options,
        }
    }

    /// The underlying source.
    pub fn into_source(self) -> S {
        self.source
    }

    pub(crate) fn error(&self, kind: DecodeErrorKind) -> DecodeError {
        DecodeError::new(kind, self.source.position())
    }

    /// Reads a tag from the source, or returns 0 at the end of input or of the
    /// current limit.
    fn read_tag(&mut self) -> Result<u32, DecodeError> {
        if self.source.is_at_end()? {
            return Ok(0);
        }
        let start = self.source.position();
        let tag = self.source.read_varint32()?;
        if tag_field_number(tag) == 0 {
            return Err(DecodeError::new(DecodeErrorKind::InvalidTag(tag), start));
        }
        Ok(tag)
    }

    /// Advances to the next field and returns its number.
    ///
    /// Returns `None` at the end of input, at the end of the enclosing nested
    /// message, or on the end tag of the enclosing group.
    ///
    /// # Errors
    ///
    /// `InvalidTag` for a tag with field number 0, or any error reading the
    /// tag varint.
    pub fn next_field(&mut self) -> Result<Option<u32>, DecodeError> {
        self.tag = match self.next_tag.take() {
            Some(tag) => tag,
            None => self.read_tag()?,
        };
        if self.tag == 0 || Some(self.tag) == self.end_group_tag {
            return Ok(None);
        }
        Ok(Some(tag_field_number(self.tag)))
    }

    /// The tag of the current field, or 0 when the last
    /// [`next_field`](Self::next_field) reached the end.
    #[must_use]
    pub fn last_tag(&self) -> u32 {
        self.tag
    }

    /// Fails unless the last tag read equals `expected`.
    ///
    /// # Errors
    ///
    /// `ParseFailure` on mismatch.
    pub fn check_last_tag_was(&self, expected: u32) -> Result<(), DecodeError> {
        if self.tag == expected {
            Ok(())
        } else {
            Err(self.error(DecodeErrorKind::ParseFailure("unexpected end tag")))
        }
    }

    /// Wire type of the current field.
    ///
    /// # Errors
    ///
    /// `InvalidWireType` for the undefined wire types 6 and 7.
    pub fn current_wire_type(&self) -> Result<WireType, DecodeError> {
        let bits = tag_wire_type(self.tag);
        WireType::from_bits(bits).ok_or_else(|| self.error(DecodeErrorKind::InvalidWireType(bits)))
    }

    /// Fails unless the current field has wire type `expected`.
    ///
    /// # Errors
    ///
    /// `InvalidWireType` carrying the actual wire type.
    pub fn require_wire_type(&self, expected: WireType) -> Result<(), DecodeError> {
        let bits = tag_wire_type(self.tag);
        if bits == expected as u8 {
            Ok(())
        } else {
            Err(self.error(DecodeErrorKind::InvalidWireType(bits)))
        }
    }

    fn read_scalar<K: PackableScalar>(&mut self) -> Result<K::Value, DecodeError> {
        self.require_wire_type(K::WIRE_TYPE)?;
        K::decode(&mut self.source)
    }

    /// Reads an `int32` field.
    ///
    /// # Errors
    ///
    /// `InvalidWireType` if the field is not a varint, or any error decoding it.
    pub fn read_int32(&mut self) -> Result<i32, DecodeError> {
        self.read_scalar::<kinds::Int32>()
    }

    /// Reads an `int64` field.
    ///
    /// # Errors
    ///
    /// As for [`read_int32`](Self::read_int32).
    pub fn read_int64(&mut self) -> Result<i64, DecodeError> {
        self.read_scalar::<kinds::Int64>()
    }

    /// Reads a `uint32` field.
    ///
    /// # Errors
    ///
    /// As for [`read_int32`](Self::read_int32).
    pub fn read_uint32(&mut self) -> Result<u32, DecodeError> {
        self.read_scalar::<kinds::UInt32>()
    }

    /// Reads a `uint64` field.
    ///
    /// # Errors
    ///
    /// As for [`read_int32`](Self::read_int32).
    pub fn read_uint64(&mut self) -> Result<u64, DecodeError> {
        self.read_scalar::<kinds::UInt64>()
    }

    /// Reads a zigzag-encoded `sint32` field.
    ///
    /// # Errors
    ///
    /// As for [`read_int32`](Self::read_int32).
    pub fn read_sint32(&mut self) -> Result<i32, DecodeError> {
        self.read_scalar::<kinds::SInt32>()
    }

    /// Reads a zigzag-encoded `sint64` field.
    ///
    /// # Errors
    ///
    /// As for [`read_int32`](Self::read_int32).
    pub fn read_sint64(&mut self) -> Result<i64, DecodeError> {
        self.read_scalar::<kinds::SInt64>()
    }

    /// Reads a `bool` field.
    ///
    /// # Errors
    ///
    /// As for [`read_int32`](Self::read_int32).
    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        self.read_scalar::<kinds::Bool>()
    }

    /// Reads an enum field's number.
    ///
    /// # Errors
    ///
    /// As for [`read_int32`](Self::read_int32).
    pub fn read_enum(&mut self) -> Result<i32, DecodeError> {
        self.read_scalar::<kinds::Enum>()
    }

    /// Reads a `fixed32` field.
    ///
    /// # Errors
    ///
    /// `InvalidWireType` if the field is not fixed32, `TruncatedMessage` if
    /// fewer than four bytes remain.
    pub fn read_fixed32(&mut self) -> Result<u32, DecodeError> {
        self.read_scalar::<kinds::Fixed32>()
    }

    /// Reads a `fixed64` field.
    ///
    /// # Errors
    ///
    /// `InvalidWireType` if the field is not fixed64, `TruncatedMessage` if
    /// fewer than eight bytes remain.
    pub fn read_fixed64(&mut self) -> Result<u64, DecodeError> {
        self.read_scalar::<kinds::Fixed64>()
    }

    /// Reads an `sfixed32` field.
    ///
    /// # Errors
    ///
    /// As for [`read_fixed32`](Self::read_fixed32).
    pub fn read_sfixed32(&mut self) -> Result<i32, DecodeError> {
        self.read_scalar::<kinds::SFixed32>()
    }

    /// Reads an `sfixed64` field.
    ///
    /// # Errors
    ///
    /// As for [`read_fixed64`](Self::read_fixed64).
    pub fn read_sfixed64(&mut self) -> Result<i64, DecodeError> {
        self.read_scalar::<kinds::SFixed64>()
    }

    /// Reads a `float` field.
    ///
    /// # Errors
    ///
    /// As for [`read_fixed32`](Self::read_fixed32).
    pub fn read_float(&mut self) -> Result<f32, DecodeError> {
        self.read_scalar::<kinds::Float>()
    }

    /// Reads a `double` field.
    ///
    /// # Errors
    ///
    /// As for [`read_fixed64`](Self::read_fixed64).
    pub fn read_double(&mut self) -> Result<f64, DecodeError> {
        self.read_scalar::<kinds::Double>()
    }

    /// Reads a length prefix.
    fn read_length(&mut self) -> Result<usize, DecodeError> {
        let start = self.source.position();
        let len = self.source.read_varint32()?;
        match i32::try_from(len) {
            Ok(_) => Ok(len as usize),
            Err(_) => Err(DecodeError::new(DecodeErrorKind::NegativeSize, start)),
        }
    }

    /// Reads a length-delimited field as raw bytes.
    ///
    /// # Errors
    ///
    /// `InvalidWireType` unless the field is length-delimited, `NegativeSize`
    /// if the length does not fit an `i32`, `TruncatedMessage` if the input
    /// or enclosing message ends first.
    pub fn read_bytes(&mut self) -> Result<ByteBuffer, DecodeError> {
        self.require_wire_type(WireType::LengthDelimited)?;
        let len = self.read_length()?;
        self.source.read_buffer(len)
    }

    /// Reads a length-delimited field as text.
    ///
    /// With `strict` set the bytes must be well-formed UTF-8; otherwise
    /// ill-formed sequences are replaced with U+FFFD.
    ///
    /// # Errors
    ///
    /// As for [`read_bytes`](Self::read_bytes), plus `InvalidUtf8` in strict
    /// mode.
    pub fn read_string(&mut self, strict: bool) -> Result<String, DecodeError> {
        self.require_wire_type(WireType::LengthDelimited)?;
        let len = self.read_length()?;
        let start = self.source.position();
        let bytes = self.source.read_buffer(len)?;
        if strict {
            utf8::decode(&bytes.contiguous())
                .map_err(|e| DecodeError::new(DecodeErrorKind::InvalidUtf8, start + e.offset()))
        } else {
            Ok(bytes.to_string_utf8())
        }
    }

    /// Decodes an embedded message with `merge`.
    ///
    /// The length prefix becomes a limit for the duration of `merge`, which is
    /// expected to call [`next_field`](Self::next_field) until it returns
    /// `None`. The nesting depth is checked against
    /// [`ReaderOptions::recursion_limit`] before any of the payload is read.
    ///
    /// # Errors
    ///
    /// `RecursionLimitExceeded`, any error from `merge`, or `ParseFailure` if
    /// `merge` stopped before reaching the end of the message.
    pub fn merge_nested_message<T>(
        &mut self,
        merge: impl FnOnce(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        self.require_wire_type(WireType::LengthDelimited)?;
        let len = self.read_length()?;
        self.enter()?;
        let saved = self.push_limit(len)?;
        let value = merge(self)?;
        if self.tag != 0 || self.next_tag.is_some() {
            return Err(self.error(DecodeErrorKind::ParseFailure(
                "nested message did not end at its length",
            )));
        }
        if self.source.limit() != Some(self.source.position()) {
            return Err(self.error(DecodeErrorKind::ParseFailure(
                "nested message ended before its length",
            )));
        }
        self.pop_limit(saved);
        self.depth -= 1;
        Ok(value)
    }

    /// Decodes a group with `merge`.
    ///
    /// While `merge` runs, [`next_field`](Self::next_field) returns `None` on
    /// the group's end tag, `(field_number << 3) | 4`.
    ///
    /// # Errors
    ///
    /// `InvalidWireType` unless the current field starts a group,
    /// `RecursionLimitExceeded`, any error from `merge`, or `ParseFailure` if
    /// the group was not closed by its own end tag.
    pub fn merge_group<T>(
        &mut self,
        field_number: u32,
        merge: impl FnOnce(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        self.require_wire_type(WireType::StartGroup)?;
        self.enter()?;
        let end_tag = make_tag(field_number, WireType::EndGroup);
        let saved = self.end_group_tag.replace(end_tag);
        let value = merge(self)?;
        if self.tag != end_tag {
            return Err(self.error(DecodeErrorKind::ParseFailure(
                "group was not closed by its end tag",
            )));
        }
        self.end_group_tag = saved;
        self.depth -= 1;
        Ok(value)
    }

    fn enter(&mut self) -> Result<(), DecodeError> {
        if self.depth >= self.options.recursion_limit {
            debug!(
                depth = self.depth,
                limit = self.options.recursion_limit,
                "recursion limit exceeded"
            );
            return Err(self.error(DecodeErrorKind::RecursionLimitExceeded));
        }
        self.depth += 1;
        Ok(())
    }

    /// Restricts reading to the next `len` bytes and returns the previous
    /// limit, to be handed back to [`pop_limit`](Self::pop_limit).
    ///
    /// # Errors
    ///
    /// `TruncatedMessage` if the new limit reaches past the current one,
    /// `SizeLimitExceeded` if it overflows.
    pub fn push_limit(&mut self, len: usize) -> Result<Option<usize>, DecodeError> {
        let Some(new_limit) = self.source.position().checked_add(len) else {
            return Err(self.error(DecodeErrorKind::SizeLimitExceeded));
        };
        let old_limit = self.source.limit();
        if old_limit.is_some_and(|old| new_limit > old) {
            return Err(self.error(DecodeErrorKind::TruncatedMessage));
        }
        self.source.set_limit(Some(new_limit));
        Ok(old_limit)
    }

    /// Restores a limit returned by [`push_limit`](Self::push_limit).
    pub fn pop_limit(&mut self, saved: Option<usize>) {
        self.source.set_limit(saved);
    }

    /// Bytes left before the current limit, or `None` without one.
    #[must_use]
    pub fn bytes_until_limit(&self) -> Option<usize> {
        self.source
            .limit()
            .map(|limit| limit.saturating_sub(self.source.position()))
    }

    /// Whether the input or the current limit is exhausted.
    ///
    /// # Errors
    ///
    /// Stream sources may fail while checking for more input.
    pub fn is_at_end(&mut self) -> Result<bool, DecodeError> {
        self.source.is_at_end()
    }

    /// Bytes consumed since the reader was created.
    #[must_use]
    pub fn total_bytes_read(&self) -> usize {
        self.source.position()
    }

    /// Replaces the recursion limit and returns the old one.
    pub fn set_recursion_limit(&mut self, limit: usize) -> usize {
        core::mem::replace(&mut self.options.recursion_limit, limit)
    }

    /// Replaces the stream size budget and returns the old one.
    pub fn set_size_limit(&mut self, limit: usize) -> usize {
        self.options.size_limit = limit;
        self.source.set_size_limit(limit)
    }

    /// Starts a new size budget at the current position, for callers that
    /// decode a long run of messages from one stream.
    pub fn reset_size_counter(&mut self) {
        self.source.reset_size_counter();
    }

    /// Reads a bare varint, no tag.
    ///
    /// # Errors
    ///
    /// `MalformedVarint` or `TruncatedMessage`.
    pub fn read_raw_varint32(&mut self) -> Result<u32, DecodeError> {
        self.source.read_varint32()
    }

    /// Reads a bare varint, no tag.
    ///
    /// # Errors
    ///
    /// `MalformedVarint` or `TruncatedMessage`.
    pub fn read_raw_varint64(&mut self) -> Result<u64, DecodeError> {
        self.source.read_varint64()
    }

    /// Reads four bytes, little endian.
    ///
    /// # Errors
    ///
    /// `TruncatedMessage`.
    pub fn read_raw_little_endian32(&mut self) -> Result<u32, DecodeError> {
        self.source.read_fixed32()
    }

    /// Reads eight bytes, little endian.
    ///
    /// # Errors
    ///
    /// `TruncatedMessage`.
    pub fn read_raw_little_endian64(&mut self) -> Result<u64, DecodeError> {
        self.source.read_fixed64()
    }

    /// Reads a single byte.
    ///
    /// # Errors
    ///
    /// `TruncatedMessage`.
    pub fn read_raw_byte(&mut self) -> Result<u8, DecodeError> {
        self.source.read_byte()
    }

    /// Reads `len` bytes, sharing storage with the input where the backend can.
    ///
    /// # Errors
    ///
    /// `TruncatedMessage`.
    pub fn read_raw_bytes(&mut self, len: usize) -> Result<ByteBuffer, DecodeError> {
        self.source.read_buffer(len)
    }

    /// Discards the next `len` bytes.
    ///
    /// # Errors
    ///
    /// `TruncatedMessage`.
    pub fn skip_raw_bytes(&mut self, len: usize) -> Result<(), DecodeError> {
        self.source.skip(len)
    }
}
