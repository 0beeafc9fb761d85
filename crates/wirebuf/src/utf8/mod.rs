//! Restricted UTF-8 validation that can be resumed across chunk boundaries.
//!
//! "Restricted" means the Unicode 3.1 rules: overlong forms, surrogate code
//! points (U+D800..=U+DFFF) and anything above U+10FFFF are rejected. This is
//! the same acceptance set as [`core::str::from_utf8`]; the difference is that
//! validation here can stop in the middle of a multi-byte sequence and pick up
//! again with the next chunk.

mod encode;

use alloc::{borrow::ToOwned, string::String};

pub use encode::{encode, encode_to_vec, encoded_length};

use crate::error::{DecodeError, DecodeErrorKind};

/// Where a chunked validation stands after the bytes seen so far.
///
/// Start from [`Utf8State::default`] and feed chunks through
/// [`partial_is_valid`]. Whether a `Pending` state at the end of input is an
/// error is up to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Utf8State {
    /// Everything seen so far is well formed and ends on a character boundary.
    #[default]
    Complete,
    /// An ill-formed sequence has been seen. This state is absorbing.
    Malformed,
    /// Well formed so far, but the last character is missing trailing bytes.
    Pending(Pending),
}

impl Utf8State {
    /// `true` only for [`Utf8State::Complete`].
    #[must_use]
    pub const fn is_complete(self) -> bool {
        matches!(self, Utf8State::Complete)
    }

    /// `true` once an ill-formed sequence has been seen.
    #[must_use]
    pub const fn is_malformed(self) -> bool {
        matches!(self, Utf8State::Malformed)
    }
}

/// The leading bytes of an unfinished character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pending {
    bytes: [u8; 3],
    len: u8,
}

impl Pending {
    #[allow(clippy::cast_possible_truncation)]
    fn new(prefix: &[u8]) -> Self {
        let mut bytes = [0; 3];
        let len = prefix.len().min(3);
        bytes[..len].copy_from_slice(&prefix[..len]);
        Self {
            bytes,
            len: len as u8,
        }
    }

    fn as_slice(&self) -> &[u8] {
        &self.bytes[..usize::from(self.len)]
    }
}

enum Step {
    /// A full character of this many bytes.
    Complete(usize),
    Incomplete,
    Invalid,
}

/// Total length of the character introduced by `lead`, or 0 when `lead` can
/// never start one.
const fn sequence_width(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

/// Legal range for the byte right after `lead`. The narrowed ranges exclude
/// overlong forms (E0, F0), surrogates (ED) and code points past U+10FFFF (F4).
const fn second_byte_range(lead: u8) -> (u8, u8) {
    match lead {
        0xE0 => (0xA0, 0xBF),
        0xED => (0x80, 0x9F),
        0xF0 => (0x90, 0xBF),
        0xF4 => (0x80, 0x8F),
        _ => (0x80, 0xBF),
    }
}

/// Checks the character starting at `seq[0]`. `seq` may be shorter than the
/// character, in which case every byte present must still be plausible.
fn check_sequence(seq: &[u8]) -> Step {
    let Some(&lead) = seq.first() else {
        return Step::Incomplete;
    };
    let width = sequence_width(lead);
    if width == 0 {
        return Step::Invalid;
    }
    for (i, &byte) in seq.iter().enumerate().take(width).skip(1) {
        let (lo, hi) = if i == 1 {
            second_byte_range(lead)
        } else {
            (0x80, 0xBF)
        };
        if !(lo..=hi).contains(&byte) {
            return Step::Invalid;
        }
    }
    if seq.len() < width {
        Step::Incomplete
    } else {
        Step::Complete(width)
    }
}

/// Length of the leading run of ASCII bytes, scanning eight bytes at a time.
fn ascii_prefix_len(bytes: &[u8]) -> usize {
    const HIGH_BITS: u64 = 0x8080_8080_8080_8080;

    let mut words = bytes.chunks_exact(8);
    let mut scanned = 0;
    for word in &mut words {
        let Ok(raw) = <[u8; 8]>::try_from(word) else {
            break;
        };
        let high = u64::from_le_bytes(raw) & HIGH_BITS;
        if high != 0 {
            return scanned + (high.trailing_zeros() / 8) as usize;
        }
        scanned += 8;
    }
    let tail = &bytes[scanned..];
    scanned + tail.iter().position(|b| !b.is_ascii()).unwrap_or(tail.len())
}

fn scan(bytes: &[u8]) -> Utf8State {
    let mut i = 0;
    while i < bytes.len() {
        i += ascii_prefix_len(&bytes[i..]);
        if i == bytes.len() {
            break;
        }
        let rest = &bytes[i..];
        match check_sequence(rest) {
            Step::Complete(width) => i += width,
            Step::Incomplete => return Utf8State::Pending(Pending::new(rest)),
            Step::Invalid => return Utf8State::Malformed,
        }
    }
    Utf8State::Complete
}

/// Continues validation from `state` over `bytes`.
///
/// Feeding a byte string through any partition into chunks yields the same
/// final state as validating it in one piece.
#[must_use]
pub fn partial_is_valid(state: Utf8State, bytes: &[u8]) -> Utf8State {
    match state {
        Utf8State::Malformed => Utf8State::Malformed,
        Utf8State::Complete => scan(bytes),
        Utf8State::Pending(pending) => {
            let have = pending.as_slice();
            let mut seq = [0u8; 4];
            seq[..have.len()].copy_from_slice(have);
            let take = (4 - have.len()).min(bytes.len());
            seq[have.len()..have.len() + take].copy_from_slice(&bytes[..take]);
            match check_sequence(&seq[..have.len() + take]) {
                Step::Complete(width) => scan(&bytes[width - have.len()..]),
                Step::Incomplete => Utf8State::Pending(Pending::new(&seq[..have.len() + take])),
                Step::Invalid => Utf8State::Malformed,
            }
        }
    }
}

/// Whether `bytes` is entirely well-formed UTF-8.
#[must_use]
pub fn is_valid(bytes: &[u8]) -> bool {
    scan(bytes).is_complete()
}

/// Decodes `bytes` strictly.
///
/// # Errors
///
/// `InvalidUtf8`, with the offset of the first byte that is not part of a
/// well-formed prefix.
pub fn decode(bytes: &[u8]) -> Result<String, DecodeError> {
    core::str::from_utf8(bytes)
        .map(ToOwned::to_owned)
        .map_err(|e| DecodeError::new(DecodeErrorKind::InvalidUtf8, e.valid_up_to()))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::ascii(b"hello", true)]
    #[case::empty(b"", true)]
    #[case::two_byte(b"\xC3\xA9", true)]
    #[case::overlong_two(b"\xC0\xAF", false)]
    #[case::overlong_c1(b"\xC1\xBF", false)]
    #[case::lowest_three(b"\xE0\xA0\x80", true)]
    #[case::overlong_three(b"\xE0\x9F\xBF", false)]
    #[case::last_before_surrogates(b"\xED\x9F\xBF", true)]
    #[case::surrogate(b"\xED\xA0\x80", false)]
    #[case::lowest_four(b"\xF0\x90\x80\x80", true)]
    #[case::overlong_four(b"\xF0\x8F\xBF\xBF", false)]
    #[case::max_code_point(b"\xF4\x8F\xBF\xBF", true)]
    #[case::beyond_max(b"\xF4\x90\x80\x80", false)]
    #[case::f5_lead(b"\xF5\x80\x80\x80", false)]
    #[case::stray_continuation(b"a\x80", false)]
    #[case::trailing_out_of_range(b"\xC3\xC0", false)]
    #[case::truncated(b"\xE2\x82", false)]
    fn validity(#[case] input: &[u8], #[case] expected: bool) {
        assert_eq!(is_valid(input), expected);
        assert_eq!(core::str::from_utf8(input).is_ok(), expected);
    }

    #[test]
    fn pending_resumes_across_chunks() {
        // U+20AC EURO SIGN split after every byte.
        let mut state = partial_is_valid(Utf8State::default(), b"\xE2");
        assert!(matches!(state, Utf8State::Pending(_)));
        state = partial_is_valid(state, b"\x82");
        assert!(matches!(state, Utf8State::Pending(_)));
        state = partial_is_valid(state, b"\xACok");
        assert_eq!(state, Utf8State::Complete);
    }

    #[test]
    fn pending_rejects_bad_continuation() {
        let state = partial_is_valid(Utf8State::default(), b"\xED");
        assert_eq!(partial_is_valid(state, b"\xA0\x80"), Utf8State::Malformed);
    }

    #[test]
    fn empty_chunk_keeps_state() {
        let state = partial_is_valid(Utf8State::default(), b"\xF0\x9F");
        assert_eq!(partial_is_valid(state, b""), state);
    }

    #[test]
    fn malformed_is_absorbing() {
        let state = partial_is_valid(Utf8State::default(), b"\xFF");
        assert!(state.is_malformed());
        assert!(partial_is_valid(state, b"abc").is_malformed());
    }

    #[test]
    fn ascii_fast_path_finds_first_high_byte() {
        assert_eq!(ascii_prefix_len(b"0123456789abcdef"), 16);
        assert_eq!(ascii_prefix_len(b"01234567\x80"), 8);
        assert_eq!(ascii_prefix_len(b"012\xC3\xA94567"), 3);
        assert_eq!(ascii_prefix_len(b"0123456789a\xC3"), 11);
    }

    #[test]
    fn decode_reports_offset() {
        assert_eq!(decode(b"caf\xC3\xA9").unwrap(), "café");
        let err = decode(b"ab\xFFcd").unwrap_err();
        assert_eq!(err.kind(), &DecodeErrorKind::InvalidUtf8);
        assert_eq!(err.offset(), 2);
    }
}
