#![expect(missing_docs)]

use std::{
    collections::HashSet,
    io::{BufRead, Cursor, Read},
};

use rstest::rstest;
use wirebuf::{ByteBuffer, COPY_THRESHOLD, Charset};

/// A reader that returns at most `step` bytes per call and is interrupted
/// every other call.
struct Choppy {
    data: Cursor<Vec<u8>>,
    step: usize,
    calls: usize,
}

impl Read for Choppy {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.calls += 1;
        if self.calls % 2 == 0 {
            return Err(std::io::ErrorKind::Interrupted.into());
        }
        let n = buf.len().min(self.step);
        self.data.read(&mut buf[..n])
    }
}

fn numbered(len: usize) -> Vec<u8> {
    (0..len).map(|i| u8::try_from(i % 251).unwrap()).collect()
}

#[rstest]
#[case::empty(0)]
#[case::one_chunk(100)]
#[case::several_chunks(50_000)]
fn read_from_collects_everything(#[case] len: usize) {
    let data = numbered(len);
    let mut reader = Choppy {
        data: Cursor::new(data.clone()),
        step: 700,
        calls: 0,
    };
    let rope = ByteBuffer::read_from(&mut reader).unwrap();
    assert_eq!(rope.len(), len);
    assert_eq!(rope.to_vec(), data);
    assert!(rope.chunks().all(|chunk| chunk.len() <= 0x2000));
}

#[test]
fn write_and_read_back() {
    let rope: ByteBuffer = numbered(3000)
        .chunks(300)
        .map(ByteBuffer::copy_from)
        .collect();

    let mut out = Vec::new();
    rope.write_all_to(&mut out).unwrap();
    assert_eq!(out, rope.to_vec());

    let mut via_read = Vec::new();
    rope.reader().read_to_end(&mut via_read).unwrap();
    assert_eq!(via_read, out);

    let mut buffered = rope.reader();
    let first = buffered.fill_buf().unwrap().len();
    assert_eq!(first, 300);
    buffered.consume(first);
    assert_eq!(buffered.fill_buf().unwrap()[0], out[300]);
}

#[test]
fn bufread_lines_span_leaves() {
    let rope = ByteBuffer::from("alpha\nbe".repeat(20).as_str())
        .concat(&ByteBuffer::from("ta\ngamma\n".repeat(20).as_str()));
    assert!(rope.depth() > 0);
    let lines: Vec<String> = rope.reader().lines().map(Result::unwrap).collect();
    assert_eq!(lines.len(), 60);
    assert_eq!(lines[19], "bealpha");
    assert_eq!(lines[20], "beta");
}

#[test]
fn hash_sets_ignore_shape() {
    let text = "x".repeat(COPY_THRESHOLD * 3);
    let flat = ByteBuffer::from(text.as_str());
    let split = ByteBuffer::from(&text[..COPY_THRESHOLD])
        .concat(&ByteBuffer::from(&text[COPY_THRESHOLD..]));
    assert_ne!(flat.depth(), split.depth());

    let mut set = HashSet::new();
    set.insert(flat);
    assert!(set.contains(&split));
    assert!(!set.insert(split));
}

#[rstest]
#[case::utf8(Charset::Utf8, "caf\u{e9}\u{FFFD}")]
#[case::latin1(Charset::Latin1, "caf\u{c3}\u{a9}\u{ff}")]
#[case::ascii(Charset::Ascii, "caf\u{FFFD}\u{FFFD}\u{FFFD}")]
fn charsets(#[case] charset: Charset, #[case] expected: &str) {
    let rope = ByteBuffer::from(&b"caf\xC3\xA9\xFF"[..]);
    assert_eq!(rope.as_string(charset), expected);
}

#[test]
fn substrings_share_and_compare() {
    let rope = ByteBuffer::from(numbered(400)).concat(&ByteBuffer::from(numbered(400)));
    let left = rope.substring(0, 400);
    let right = rope.substring(400, 800);
    assert_eq!(left, right);
    assert_eq!(left.cmp(&right), std::cmp::Ordering::Equal);
    assert!(rope.substring(10, 20) < rope.substring(11, 20));
    assert_eq!(rope.substring(5, 5), ByteBuffer::new());
    assert_eq!((&rope).into_iter().count(), 800);
}

#[test]
fn copy_to_with_offset() {
    let rope = ByteBuffer::from(numbered(200)).concat(&ByteBuffer::from(numbered(200)));
    let mut dest = vec![0; 402];
    rope.copy_to(&mut dest, 2);
    assert_eq!(&dest[2..], rope.to_vec().as_slice());
}

#[cfg(feature = "serde")]
#[test]
fn serde_as_byte_array() {
    let rope = ByteBuffer::from(&b"\x01\x02"[..]).concat(&ByteBuffer::from(&b"\x03"[..]));
    let json = serde_json::to_string(&rope).unwrap();
    assert_eq!(json, "[1,2,3]");
    let back: ByteBuffer = serde_json::from_str(&json).unwrap();
    assert_eq!(back, rope);
}
