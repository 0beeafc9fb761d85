#![expect(missing_docs)]

mod common;

use std::io::Cursor;

use common::Message;
use rstest::rstest;
use wirebuf::{
    ByteBuffer, DecodeError, DecodeErrorKind, ReaderOptions, WireReader, WireSource, WireType,
    kinds, wire_format::make_tag,
};

#[derive(Debug, Default, PartialEq)]
struct Phone {
    number: String,
    kind: i32,
}

#[derive(Debug, Default, PartialEq)]
struct Person {
    name: String,
    id: i32,
    phones: Vec<Phone>,
    scores: Vec<i32>,
    legacy: Option<u64>,
    avatar: ByteBuffer,
    unknown: Vec<u8>,
}

const PHONE_KINDS: std::ops::RangeInclusive<i32> = 0..=2;

fn merge_phone<S: WireSource>(reader: &mut WireReader<S>) -> Result<Phone, DecodeError> {
    let mut phone = Phone::default();
    while let Some(field) = reader.next_field()? {
        match field {
            1 => phone.number = reader.read_string(true)?,
            2 => phone.kind = reader.read_enum()?,
            _ => {
                reader.skip_field()?;
            }
        }
    }
    Ok(phone)
}

fn merge_person<S: WireSource>(reader: &mut WireReader<S>) -> Result<Person, DecodeError> {
    let mut person = Person::default();
    while let Some(field) = reader.next_field()? {
        match field {
            1 => person.name = reader.read_string(true)?,
            2 => person.id = reader.read_int32()?,
            4 => reader.read_message_list(&mut person.phones, merge_phone)?,
            5 => reader.read_list::<kinds::SInt32>(&mut person.scores)?,
            6 => {
                person.legacy = reader.merge_group(6, |r| {
                    let mut value = None;
                    while r.next_field()?.is_some() {
                        value = Some(r.read_fixed64()?);
                    }
                    Ok(value)
                })?;
            }
            7 => person.avatar = reader.read_bytes()?,
            _ => {
                let tag = reader.last_tag();
                reader.skip_or_store(tag, &mut person.unknown)?;
            }
        }
    }
    Ok(person)
}

fn sample() -> (Vec<u8>, Person) {
    let home = Message::new().string(1, "555-0100").int32(2, 1);
    let work = Message::new().string(1, "555-0199").int32(2, 2);
    let scores = Message::new()
        .raw(&[0x01, 0x04])
        .raw(&[0xFE, 0x01]);
    let legacy = Message::new().fixed64(1, 0xDEAD_BEEF);
    let input = Message::new()
        .string(1, "Ada")
        .int32(2, 36)
        .message(4, &home)
        .message(4, &work)
        .bytes(5, scores.as_slice())
        .varint(99, 12)
        .group(6, &legacy)
        .bytes(7, &[0xAB; 200])
        .build();

    let expected = Person {
        name: "Ada".into(),
        id: 36,
        phones: vec![
            Phone {
                number: "555-0100".into(),
                kind: 1,
            },
            Phone {
                number: "555-0199".into(),
                kind: 2,
            },
        ],
        scores: vec![-1, 2, 127],
        legacy: Some(0xDEAD_BEEF),
        avatar: ByteBuffer::from(vec![0xAB; 200]),
        unknown: Message::new().varint(99, 12).build(),
    };
    (input, expected)
}

#[test]
fn decodes_from_every_backend() {
    let (input, expected) = sample();

    assert_eq!(merge_person(&mut WireReader::from_slice(&input)).unwrap(), expected);
    assert_eq!(
        merge_person(&mut WireReader::from_bytes(input.clone(), true)).unwrap(),
        expected
    );
    assert_eq!(
        merge_person(&mut WireReader::from_stream(Cursor::new(&input))).unwrap(),
        expected
    );

    let rope: ByteBuffer = input
        .chunks(7)
        .map(ByteBuffer::copy_from)
        .collect();
    assert_eq!(merge_person(&mut rope.new_wire_reader()).unwrap(), expected);
}

#[test]
fn fields_may_come_in_any_order() {
    let input = Message::new()
        .sint32(5, 3)
        .string(1, "Bob")
        .sint32(5, -3)
        .build();
    let person = merge_person(&mut WireReader::from_slice(&input)).unwrap();
    assert_eq!(person.name, "Bob");
    assert_eq!(person.scores, [3, -3]);
}

#[test]
fn unknown_fields_round_trip() {
    let unknown = Message::new()
        .varint(20, 1)
        .fixed32(21, 7)
        .string(22, "kept")
        .group(23, &Message::new().fixed64(1, 9))
        .build();
    let input = Message::new().string(1, "Eve").raw(&unknown).build();
    let person = merge_person(&mut WireReader::from_slice(&input)).unwrap();
    assert_eq!(person.unknown, unknown);
}

#[test]
fn unknown_enum_values_are_kept_as_unknown_fields() {
    let input = Message::new()
        .varint(2, 0)
        .varint(2, 5)
        .int32(3, -4)
        .build();
    let mut reader = WireReader::from_slice(&input);
    let mut known = Vec::new();
    let mut unknown = Vec::new();
    reader.next_field().unwrap();
    reader
        .read_enum_list_or_store(&mut known, |n| PHONE_KINDS.contains(&n), &mut unknown)
        .unwrap();
    reader.next_field().unwrap();
    assert_eq!(
        reader
            .read_enum_or_store(|n| PHONE_KINDS.contains(&n), &mut unknown)
            .unwrap(),
        None
    );
    assert_eq!(known, [0]);
    assert_eq!(unknown, Message::new().varint(2, 5).int32(3, -4).build());
}

fn nested(levels: usize) -> Vec<u8> {
    (0..levels).fold(Vec::new(), |inner, _| {
        Message::new().bytes(1, &inner).build()
    })
}

fn depth<S: WireSource>(reader: &mut WireReader<S>) -> Result<usize, DecodeError> {
    let mut deepest = 0;
    while reader.next_field()?.is_some() {
        deepest = reader.merge_nested_message(depth)? + 1;
    }
    Ok(deepest)
}

#[rstest]
#[case::default_limit(100, None)]
#[case::one_past(101, Some(DecodeErrorKind::RecursionLimitExceeded))]
fn default_recursion_limit(#[case] levels: usize, #[case] error: Option<DecodeErrorKind>) {
    let input = nested(levels);
    let result = depth(&mut WireReader::from_slice(&input));
    match error {
        None => assert_eq!(result.unwrap(), levels),
        Some(kind) => assert_eq!(result.unwrap_err().kind(), &kind),
    }
}

#[test]
fn raw_reads_follow_limits() {
    let input = Message::new().fixed32(1, 0x0102_0304).build();
    let mut reader = WireReader::from_slice(&input);
    assert_eq!(reader.read_raw_varint32().unwrap(), make_tag(1, WireType::Fixed32));
    let saved = reader.push_limit(2).unwrap();
    assert_eq!(reader.read_raw_byte().unwrap(), 0x04);
    assert_eq!(
        reader.read_raw_little_endian32().unwrap_err().kind(),
        &DecodeErrorKind::TruncatedMessage
    );
    reader.pop_limit(saved);
    reader.skip_raw_bytes(1).unwrap();
    assert_eq!(reader.read_raw_bytes(2).unwrap(), ByteBuffer::from(&[0x02, 0x01][..]));
    assert_eq!(
        reader.skip_raw_bytes(1).unwrap_err().kind(),
        &DecodeErrorKind::TruncatedMessage
    );
    assert!(reader.is_at_end().unwrap());
    assert_eq!(reader.total_bytes_read(), input.len());
}

#[test]
fn strict_string_lists() {
    let input = Message::new()
        .string(1, "fine")
        .bytes(1, b"\xC0\x80")
        .build();

    let mut lossy = Vec::new();
    let mut reader = WireReader::from_slice(&input);
    reader.next_field().unwrap();
    reader.read_string_list(&mut lossy).unwrap();
    assert_eq!(lossy.len(), 2);
    assert!(lossy[1].contains('\u{FFFD}'));

    let options = ReaderOptions {
        strict_utf8: true,
        ..Default::default()
    };
    let mut strict = Vec::new();
    let mut reader = WireReader::from_slice_with_options(&input, options);
    reader.next_field().unwrap();
    let err = reader.read_string_list(&mut strict).unwrap_err();
    assert_eq!(err.kind(), &DecodeErrorKind::InvalidUtf8);
    assert_eq!(strict, ["fine"]);
}

#[test]
fn large_fields_from_a_stream_are_chunked() {
    let payload: Vec<u8> = (0..=255u8).cycle().take(20_000).collect();
    let input = Message::new().bytes(1, &payload).build();
    let options = ReaderOptions {
        buffer_size: 1024,
        ..Default::default()
    };
    let mut reader = WireReader::from_stream_with_options(Cursor::new(input), options);
    reader.next_field().unwrap();
    let field = reader.read_bytes().unwrap();
    assert!(field.depth() > 0);
    assert!(field.chunks().all(|chunk| chunk.len() <= 1024));
    assert_eq!(field.to_vec(), payload);
}
