use alloc::vec::Vec;

use quickcheck::QuickCheck;

use super::quickcheck_tests;
use crate::{
    DecodeErrorKind, WireReader, WireSource,
    varint::{decode_varint64, encode_varint64, varint_size64},
};

/// Skips every field, keeping the tags seen and the first error.
fn skim<S: WireSource>(reader: &mut WireReader<S>) -> (Vec<u32>, Option<DecodeErrorKind>) {
    let mut tags = Vec::new();
    loop {
        match reader.next_field() {
            Ok(Some(_)) => tags.push(reader.last_tag()),
            Ok(None) => return (tags, None),
            Err(e) => return (tags, Some(e.kind().clone())),
        }
        if let Err(e) = reader.skip_field() {
            return (tags, Some(e.kind().clone()));
        }
    }
}

/// Property: on arbitrary input, the slice and stream backends see the same
/// fields and fail with the same kind of error.
#[cfg(feature = "std")]
#[test]
fn stream_and_slice_agree() {
    use std::io::Cursor;

    use crate::ReaderOptions;

    #[allow(clippy::needless_pass_by_value)]
    fn prop(input: Vec<u8>, buffer_size: u8) -> bool {
        let options = ReaderOptions {
            buffer_size: usize::from(buffer_size % 16) + 1,
            size_limit: usize::MAX,
            ..Default::default()
        };
        let from_slice = skim(&mut WireReader::from_slice_with_options(&input, options));
        let from_stream = skim(&mut WireReader::from_stream_with_options(
            Cursor::new(&input),
            options,
        ));
        from_slice == from_stream
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(Vec<u8>, u8) -> bool);
}

/// Property: skipping a field and storing it reproduce the input byte for byte
/// whenever the input decodes.
#[test]
fn stored_fields_reproduce_input() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(input: Vec<u8>) -> bool {
        let mut reader = WireReader::from_slice(&input);
        let mut stored = Vec::new();
        loop {
            let tag = match reader.next_field() {
                Ok(Some(_)) => reader.last_tag(),
                Ok(None) => break,
                Err(_) => return true,
            };
            if reader.skip_or_store(tag, &mut stored).is_err() {
                return true;
            }
        }
        // Non-minimal varints are re-encoded minimally, so only compare
        // what the stored copy decodes to.
        skim(&mut WireReader::from_slice(&stored)) == skim(&mut WireReader::from_slice(&input))
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(Vec<u8>) -> bool);
}

/// Property: a varint decodes from the middle of a buffer back to its value,
/// with the cursor landing right after it.
#[test]
fn varints_decode_in_place() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(prefix: Vec<u8>, value: u64) -> bool {
        let mut buf = prefix.clone();
        encode_varint64(value, &mut buf);
        buf.push(0xFF);
        decode_varint64(&buf, prefix.len())
            == Ok((value, prefix.len() + varint_size64(value)))
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(Vec<u8>, u64) -> bool);
}
