#![no_main]
use std::{cell::RefCell, io::Cursor};

use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use wirebuf::{
    DecodeErrorKind, ReaderOptions, WireReader, WireSource, WireType,
    varint::{encode_varint32, encode_varint64},
    wire_format::make_tag,
};

thread_local! {
    static RNG: RefCell<SmallRng> = RefCell::new(SmallRng::from_os_rng());
}

fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SmallRng) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}

/// Appends a random but well-formed field, recursing into messages and groups.
fn append_field(rng: &mut SmallRng, out: &mut Vec<u8>, depth: u32) {
    let field = rng.random_range(1..=20);
    match rng.random_range(0..6) {
        0 => {
            encode_varint32(make_tag(field, WireType::Varint), out);
            encode_varint64(rng.random(), out);
        }
        1 => {
            encode_varint32(make_tag(field, WireType::Fixed64), out);
            out.extend_from_slice(&rng.random::<u64>().to_le_bytes());
        }
        2 => {
            encode_varint32(make_tag(field, WireType::Fixed32), out);
            out.extend_from_slice(&rng.random::<u32>().to_le_bytes());
        }
        3 => {
            let len = rng.random_range(0..300);
            encode_varint32(make_tag(field, WireType::LengthDelimited), out);
            encode_varint32(len, out);
            out.extend((0..len).map(|_| rng.random::<u8>()));
        }
        4 if depth < 8 => {
            let mut inner = Vec::new();
            for _ in 0..rng.random_range(0..4) {
                append_field(rng, &mut inner, depth + 1);
            }
            encode_varint32(make_tag(field, WireType::LengthDelimited), out);
            encode_varint32(u32::try_from(inner.len()).unwrap_or(0), out);
            out.extend_from_slice(&inner);
        }
        _ if depth < 8 => {
            encode_varint32(make_tag(field, WireType::StartGroup), out);
            for _ in 0..rng.random_range(0..4) {
                append_field(rng, out, depth + 1);
            }
            encode_varint32(make_tag(field, WireType::EndGroup), out);
        }
        _ => {
            encode_varint32(make_tag(field, WireType::Varint), out);
            encode_varint64(0, out);
        }
    }
}

fn mutator(data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
    if size == 0 || seed.is_multiple_of(10) {
        let mut message = Vec::new();
        with_rng(|rng| {
            for _ in 0..rng.random_range(1..16) {
                append_field(rng, &mut message, 0);
            }
        });
        let len = message.len().min(max_size);
        data[..len].copy_from_slice(&message[..len]);
        len
    } else {
        fuzzer_mutate(data, size, max_size)
    }
}

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    mutator(data, size, max_size, seed)
});

/// Skips every field, recording tags and the first error.
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

fuzz_target!(|data: &[u8]| {
    let options = ReaderOptions {
        buffer_size: 1 + data.first().map_or(0, |b| usize::from(b % 32)),
        size_limit: usize::MAX,
        ..Default::default()
    };
    let from_slice = skim(&mut WireReader::from_slice_with_options(data, options));
    let from_stream = skim(&mut WireReader::from_stream_with_options(
        Cursor::new(data),
        options,
    ));
    assert_eq!(from_slice, from_stream);

    if from_slice.1.is_none() {
        let mut reader = WireReader::from_slice(data);
        let mut stored = Vec::new();
        while reader.next_field().unwrap().is_some() {
            let tag = reader.last_tag();
            reader.skip_or_store(tag, &mut stored).unwrap();
        }
        assert_eq!(skim(&mut WireReader::from_slice(&stored)), from_slice);
    }
});
