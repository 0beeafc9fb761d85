use alloc::{string::String, vec::Vec};

use quickcheck::QuickCheck;

use super::{chunks::split_bytes, quickcheck_tests};
use crate::{
    EncodeError,
    utf8::{Utf8State, encode_to_vec, encoded_length, is_valid, partial_is_valid},
};

fn validate_chunks(bytes: &[u8], splits: &[usize]) -> Utf8State {
    split_bytes(bytes, splits)
        .into_iter()
        .fold(Utf8State::default(), partial_is_valid)
}

/// What chunked validation must end in, according to `core::str::from_utf8`.
fn expected_state(bytes: &[u8]) -> Utf8State {
    match core::str::from_utf8(bytes) {
        Ok(_) => Utf8State::Complete,
        Err(e) if e.error_len().is_some() => Utf8State::Malformed,
        // an unfinished character at the very end
        Err(e) => partial_is_valid(Utf8State::Complete, &bytes[e.valid_up_to()..]),
    }
}

/// Property: validating any byte string through any partition into chunks
/// agrees with the standard library's validator.
#[test]
fn chunked_validation_matches_core() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(bytes: Vec<u8>, splits: Vec<usize>) -> bool {
        let state = validate_chunks(&bytes, &splits);
        let expected = expected_state(&bytes);
        let pending_ok = match state {
            Utf8State::Pending(_) => core::str::from_utf8(&bytes).is_err_and(|e| e.error_len().is_none()),
            _ => true,
        };
        state == expected && pending_ok && is_valid(&bytes) == state.is_complete()
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(Vec<u8>, Vec<usize>) -> bool);
}

/// Property: well-formed text stays well formed however it is cut, and a
/// prefix cut inside a character is pending rather than malformed.
#[test]
fn text_prefixes_are_never_malformed() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(text: String, splits: Vec<usize>, cut: usize) -> bool {
        let bytes = text.as_bytes();
        let prefix = &bytes[..cut % (bytes.len() + 1)];
        validate_chunks(bytes, &splits).is_complete()
            && !validate_chunks(prefix, &splits).is_malformed()
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(String, Vec<usize>, usize) -> bool);
}

/// Property: the UTF-16 encoder accepts exactly what `String::from_utf16`
/// accepts and produces the same bytes.
#[test]
fn utf16_encoding_matches_std() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(units: Vec<u16>) -> bool {
        match (String::from_utf16(&units), encode_to_vec(&units)) {
            (Ok(text), Ok(bytes)) => {
                text.as_bytes() == bytes && encoded_length(&units) == Ok(bytes.len())
            }
            (Err(_), Err(EncodeError::UnpairedSurrogate { index, length })) => {
                length == units.len() && (0xD800..=0xDFFF).contains(&units[index])
            }
            _ => false,
        }
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(Vec<u16>) -> bool);
}

/// Property: text survives the UTF-16 detour unchanged.
#[test]
fn utf16_encoding_of_text() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(text: String) -> bool {
        let units: Vec<u16> = text.encode_utf16().collect();
        encode_to_vec(&units).is_ok_and(|bytes| bytes == text.as_bytes())
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(String) -> bool);
}
