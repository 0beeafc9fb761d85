//! Varint, zigzag and little-endian fixed-width codecs.
//!
//! Decoders work on a byte slice and a start position and return the decoded
//! value together with the position just past it, so callers can keep their
//! own cursor. Encoders write into any [`BufMut`].

use bytes::BufMut;

use crate::{
    error::{DecodeError, DecodeErrorKind},
    wire_format::{FIXED32_SIZE, FIXED64_SIZE, MAX_VARINT_SIZE},
};

/// Decodes a base-128 varint of up to ten bytes starting at `pos`.
///
/// # Errors
///
/// `TruncatedMessage` if `buf` ends before the last byte of the varint,
/// `MalformedVarint` if the tenth byte still has its continuation bit set.
#[inline]
pub fn decode_varint64(buf: &[u8], pos: usize) -> Result<(u64, usize), DecodeError> {
    let mut result = 0u64;
    let mut cursor = pos;
    for shift in (0..64).step_by(7) {
        let Some(&byte) = buf.get(cursor) else {
            return Err(DecodeError::new(DecodeErrorKind::TruncatedMessage, cursor));
        };
        cursor += 1;
        result |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok((result, cursor));
        }
    }
    Err(DecodeError::new(DecodeErrorKind::MalformedVarint, pos))
}

/// Decodes a varint and keeps its low 32 bits.
///
/// Wider encodings are legal here: a negative `int32` is written as a ten-byte
/// varint, and the bits above the 32nd are discarded without complaint.
///
/// # Errors
///
/// Same as [`decode_varint64`].
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub fn decode_varint32(buf: &[u8], pos: usize) -> Result<(u32, usize), DecodeError> {
    decode_varint64(buf, pos).map(|(value, next)| (value as u32, next))
}

/// Reads a little-endian `u32` at `pos`.
///
/// # Errors
///
/// `TruncatedMessage` if fewer than four bytes remain.
#[inline]
pub fn decode_fixed32(buf: &[u8], pos: usize) -> Result<(u32, usize), DecodeError> {
    let end = pos + FIXED32_SIZE;
    match buf.get(pos..end).and_then(|b| <[u8; FIXED32_SIZE]>::try_from(b).ok()) {
        Some(raw) => Ok((u32::from_le_bytes(raw), end)),
        None => Err(DecodeError::new(DecodeErrorKind::TruncatedMessage, pos)),
    }
}

/// Reads a little-endian `u64` at `pos`.
///
/// # Errors
///
/// `TruncatedMessage` if fewer than eight bytes remain.
#[inline]
pub fn decode_fixed64(buf: &[u8], pos: usize) -> Result<(u64, usize), DecodeError> {
    let end = pos + FIXED64_SIZE;
    match buf.get(pos..end).and_then(|b| <[u8; FIXED64_SIZE]>::try_from(b).ok()) {
        Some(raw) => Ok((u64::from_le_bytes(raw), end)),
        None => Err(DecodeError::new(DecodeErrorKind::TruncatedMessage, pos)),
    }
}

/// Writes `value` as a varint.
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub fn encode_varint64<B: BufMut + ?Sized>(mut value: u64, buf: &mut B) {
    while value >= 0x80 {
        buf.put_u8((value as u8) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Writes `value` as a varint.
#[inline]
pub fn encode_varint32<B: BufMut + ?Sized>(value: u32, buf: &mut B) {
    encode_varint64(u64::from(value), buf);
}

/// Number of bytes [`encode_varint64`] writes for `value`.
#[inline]
#[must_use]
pub const fn varint_size64(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    let size = bits.div_ceil(7);
    if size > MAX_VARINT_SIZE {
        MAX_VARINT_SIZE
    } else {
        size
    }
}

/// Number of bytes [`encode_varint32`] writes for `value`.
#[inline]
#[must_use]
pub const fn varint_size32(value: u32) -> usize {
    varint_size64(value as u64)
}

/// Maps signed to unsigned so small magnitudes stay short: 0, -1, 1, -2 become
/// 0, 1, 2, 3.
#[inline]
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn zigzag32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

/// Inverse of [`zigzag32`].
#[inline]
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn decode_zigzag32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ (-((n & 1) as i32))
}

/// 64-bit [`zigzag32`].
#[inline]
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn zigzag64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Inverse of [`zigzag64`].
#[inline]
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn decode_zigzag64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ (-((n & 1) as i64))
}
