#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use wirebuf::{ByteBuffer, utf8};

#[derive(Debug, Arbitrary)]
struct Input {
    bytes: Vec<u8>,
    splits: Vec<u16>,
    units: Vec<u16>,
}

fuzz_target!(|input: Input| {
    // Chunked validation must agree with one-shot validation, and with core.
    let mut state = utf8::Utf8State::default();
    let mut rope = ByteBuffer::new();
    let mut rest = input.bytes.as_slice();
    for split in input.splits {
        let at = usize::from(split) % (rest.len() + 1);
        let (chunk, tail) = rest.split_at(at);
        state = utf8::partial_is_valid(state, chunk);
        rope = rope.concat(&ByteBuffer::copy_from(chunk));
        rest = tail;
    }
    state = utf8::partial_is_valid(state, rest);
    rope = rope.concat(&ByteBuffer::copy_from(rest));

    let expected = core::str::from_utf8(&input.bytes).is_ok();
    assert_eq!(state.is_complete(), expected);
    assert_eq!(utf8::is_valid(&input.bytes), expected);
    assert_eq!(rope.is_valid_utf8(), expected);
    assert_eq!(rope.to_vec(), input.bytes);

    match (String::from_utf16(&input.units), utf8::encode_to_vec(&input.units)) {
        (Ok(text), Ok(bytes)) => assert_eq!(text.as_bytes(), bytes.as_slice()),
        (Err(_), Err(_)) => {}
        (left, right) => panic!("std says {left:?}, encoder says {right:?}"),
    }
});
