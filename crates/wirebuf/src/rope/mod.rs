//! Immutable byte sequences with cheap concatenation and slicing.
//!
//! A [`ByteBuffer`] is either empty, a single leaf of shared [`Bytes`], or a
//! concatenation node over two non-empty children. Nodes are never mutated
//! after construction, so cloning a buffer or taking a substring shares
//! storage instead of copying it.
//!
//! Trees are kept shallow with the Fibonacci balance criterion from Boehm,
//! Atkinson and Plass, "Ropes: an Alternative to Strings" (1995): a node of
//! depth `d` is balanced when it holds at least `F(d + 2)` bytes. See
//! [`ByteBuffer::concat`] for when a concatenation copies, splices or
//! rebalances.
//!
//! Equality, ordering and hashing only look at the byte contents; two buffers
//! with different tree shapes compare equal when their bytes do.

mod balance;
#[cfg(feature = "std")]
mod io;
mod pieces;
#[cfg(feature = "serde")]
mod serde_impl;

use alloc::{borrow::Cow, string::String, sync::Arc, vec::Vec};
use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    sync::atomic::{AtomicU32, Ordering as AtomicOrdering},
};

use bstr::ByteSlice;
use bytes::{BufMut, Bytes};

#[cfg(feature = "std")]
pub use io::RopeReader;
pub use pieces::{Chunks, Iter};

use crate::{
    reader::{SliceSource, WireReader},
    utf8::{self, Utf8State},
};

/// Concatenations shorter than this many bytes are flattened into a fresh leaf.
pub const COPY_THRESHOLD: usize = 128;

/// Longest prefix rendered by the `Debug` impl.
const DEBUG_CONTENTS_LIMIT: usize = 50;

/// A character set for [`ByteBuffer::as_string`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    /// Ill-formed sequences become U+FFFD.
    #[default]
    Utf8,
    /// ISO 8859-1: every byte maps to the code point of the same value.
    Latin1,
    /// Bytes above 0x7F become U+FFFD.
    Ascii,
}

/// An immutable, cheaply cloneable rope of bytes.
pub struct ByteBuffer {
    node: Node,
    /// Memoized [`ByteBuffer::hash_code`], 0 until computed.
    hash: AtomicU32,
}

#[derive(Clone)]
enum Node {
    Empty,
    /// Never empty.
    Leaf(Bytes),
    Concat(Arc<Concat>),
}

struct Concat {
    left: ByteBuffer,
    right: ByteBuffer,
    left_len: usize,
    total_len: usize,
    depth: usize,
}

impl ByteBuffer {
    /// The empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self::from_node(Node::Empty)
    }

    const fn from_node(node: Node) -> Self {
        Self {
            node,
            hash: AtomicU32::new(0),
        }
    }

    fn leaf(bytes: Bytes) -> Self {
        if bytes.is_empty() {
            Self::new()
        } else {
            Self::from_node(Node::Leaf(bytes))
        }
    }

    /// Builds a concatenation node without any copying or balancing. Both
    /// sides must be non-empty.
    fn join(left: ByteBuffer, right: ByteBuffer) -> Self {
        debug_assert!(!left.is_empty() && !right.is_empty());
        let left_len = left.len();
        let total_len = left_len + right.len();
        let depth = left.depth().max(right.depth()) + 1;
        Self::from_node(Node::Concat(Arc::new(Concat {
            left,
            right,
            left_len,
            total_len,
            depth,
        })))
    }

    /// Copies `bytes` into a new single-leaf buffer.
    #[must_use]
    pub fn copy_from(bytes: &[u8]) -> Self {
        Self::leaf(Bytes::copy_from_slice(bytes))
    }

    /// Copies the UTF-8 encoding of `text`.
    #[must_use]
    pub fn copy_from_utf8(text: &str) -> Self {
        Self::copy_from(text.as_bytes())
    }

    /// Adopts `bytes` without copying.
    ///
    /// The caller gives up the ability to mutate the storage; [`Bytes`] is
    /// immutable, so the buffer's contents cannot change afterwards.
    #[must_use]
    pub fn wrap(bytes: impl Into<Bytes>) -> Self {
        Self::leaf(bytes.into())
    }

    /// Number of bytes. O(1).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.node {
            Node::Empty => 0,
            Node::Leaf(bytes) => bytes.len(),
            Node::Concat(concat) => concat.total_len,
        }
    }

    /// Whether the buffer holds no bytes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.node, Node::Empty)
    }

    /// Height of the tree. Flat buffers have depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        match &self.node {
            Node::Empty | Node::Leaf(_) => 0,
            Node::Concat(concat) => concat.depth,
        }
    }

    /// The byte at `index`, or `None` past the end. O(depth).
    #[must_use]
    pub fn byte_at(&self, mut index: usize) -> Option<u8> {
        let mut current = self;
        loop {
            match &current.node {
                Node::Empty => return None,
                Node::Leaf(bytes) => return bytes.get(index).copied(),
                Node::Concat(concat) => {
                    if index < concat.left_len {
                        current = &concat.left;
                    } else {
                        index -= concat.left_len;
                        current = &concat.right;
                    }
                }
            }
        }
    }

    /// The bytes in `begin..end`, sharing storage with `self`.
    ///
    /// Only the leaves along the two edges of the range are sliced; whole
    /// subtrees in between are reused as they are.
    ///
    /// # Panics
    ///
    /// Panics if `begin > end` or `end > self.len()`.
    #[must_use]
    pub fn substring(&self, begin: usize, end: usize) -> ByteBuffer {
        assert!(
            begin <= end && end <= self.len(),
            "range {begin}..{end} out of bounds for buffer of length {}",
            self.len()
        );
        self.slice_within(begin, end)
    }

    fn slice_within(&self, begin: usize, end: usize) -> ByteBuffer {
        if begin == end {
            return ByteBuffer::new();
        }
        if begin == 0 && end == self.len() {
            return self.clone();
        }
        match &self.node {
            Node::Empty => ByteBuffer::new(),
            Node::Leaf(bytes) => ByteBuffer::leaf(bytes.slice(begin..end)),
            Node::Concat(concat) => {
                let split = concat.left_len;
                if end <= split {
                    concat.left.slice_within(begin, end)
                } else if begin >= split {
                    concat.right.slice_within(begin - split, end - split)
                } else {
                    let left = concat.left.slice_within(begin, split);
                    let right = concat.right.slice_within(0, end - split);
                    ByteBuffer::join(left, right)
                }
            }
        }
    }

    /// Leaf slices in order. Never yields an empty slice.
    #[must_use]
    pub fn chunks(&self) -> Chunks<'_> {
        Chunks::new(self)
    }

    /// Every byte in order.
    #[must_use]
    pub fn bytes(&self) -> Iter<'_> {
        Iter::new(self)
    }

    /// The contents as one contiguous slice, borrowed when the buffer is flat.
    #[must_use]
    pub fn contiguous(&self) -> Cow<'_, [u8]> {
        match &self.node {
            Node::Empty => Cow::Borrowed(&[]),
            Node::Leaf(bytes) => Cow::Borrowed(bytes.as_ref()),
            Node::Concat(_) => Cow::Owned(self.to_vec()),
        }
    }

    /// The contents as a single [`Bytes`]. Flat buffers are returned without
    /// copying.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        match &self.node {
            Node::Empty => Bytes::new(),
            Node::Leaf(bytes) => bytes.clone(),
            Node::Concat(_) => Bytes::from(self.to_vec()),
        }
    }

    /// Copies the contents into a new vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        self.write_to(&mut out);
        out
    }

    /// Copies the whole buffer into `dest` starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `dest` is shorter than `offset + self.len()`.
    pub fn copy_to(&self, dest: &mut [u8], offset: usize) {
        let mut at = offset;
        for chunk in self.chunks() {
            dest[at..at + chunk.len()].copy_from_slice(chunk);
            at += chunk.len();
        }
    }

    /// Appends the contents to `sink`, one leaf at a time.
    pub fn write_to<B: BufMut + ?Sized>(&self, sink: &mut B) {
        for chunk in self.chunks() {
            sink.put_slice(chunk);
        }
    }

    /// Whether the contents are well-formed UTF-8. The validator state is
    /// carried across leaf boundaries, so characters may straddle leaves.
    #[must_use]
    pub fn is_valid_utf8(&self) -> bool {
        self.chunks()
            .fold(Utf8State::default(), utf8::partial_is_valid)
            .is_complete()
    }

    /// Decodes the contents in `charset`, replacing what cannot be decoded.
    #[must_use]
    pub fn as_string(&self, charset: Charset) -> String {
        match charset {
            Charset::Utf8 => self.contiguous().to_str_lossy().into_owned(),
            Charset::Latin1 => self.bytes().map(char::from).collect(),
            Charset::Ascii => self
                .bytes()
                .map(|b| if b.is_ascii() { char::from(b) } else { '\u{FFFD}' })
                .collect(),
        }
    }

    /// Lossy UTF-8 decoding; shorthand for `as_string(Charset::Utf8)`.
    #[must_use]
    pub fn to_string_utf8(&self) -> String {
        self.as_string(Charset::Utf8)
    }

    /// Whether the contents begin with `prefix`.
    #[must_use]
    pub fn starts_with(&self, prefix: &ByteBuffer) -> bool {
        prefix.len() <= self.len() && self.slice_within(0, prefix.len()) == *prefix
    }

    /// Whether the contents end with `suffix`.
    #[must_use]
    pub fn ends_with(&self, suffix: &ByteBuffer) -> bool {
        let len = self.len();
        suffix.len() <= len && self.slice_within(len - suffix.len(), len) == *suffix
    }

    /// Content hash: starting from the length, `h = h * 31 + byte` over every
    /// byte, with 0 mapped to 1. Computed once and memoized.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn hash_code(&self) -> u32 {
        if let Some(hash) = self.cached_hash() {
            return hash;
        }
        let mut hash = self.len() as u32;
        for chunk in self.chunks() {
            hash = chunk
                .iter()
                .fold(hash, |h, &b| h.wrapping_mul(31).wrapping_add(u32::from(b)));
        }
        if hash == 0 {
            hash = 1;
        }
        // Racing writers store the same value.
        self.hash.store(hash, AtomicOrdering::Relaxed);
        hash
    }

    fn cached_hash(&self) -> Option<u32> {
        match self.hash.load(AtomicOrdering::Relaxed) {
            0 => None,
            hash => Some(hash),
        }
    }

    /// A wire reader over this buffer. Flat buffers are read in place; ropes
    /// are flattened first.
    #[must_use]
    pub fn new_wire_reader(&self) -> WireReader<SliceSource<'static>> {
        WireReader::from_bytes(self.to_bytes(), true)
    }
}

/// Compares two equally long leaf sequences chunk by chunk, without assuming
/// the two sides split their bytes at the same places.
fn equal_fragments(mut left: Chunks<'_>, mut right: Chunks<'_>) -> bool {
    let mut a: &[u8] = &[];
    let mut b: &[u8] = &[];
    loop {
        if a.is_empty() {
            match left.next() {
                Some(chunk) => a = chunk,
                None => return b.is_empty() && right.next().is_none(),
            }
        }
        if b.is_empty() {
            match right.next() {
                Some(chunk) => b = chunk,
                None => return false,
            }
        }
        let n = a.len().min(b.len());
        if a[..n] != b[..n] {
            return false;
        }
        a = &a[n..];
        b = &b[n..];
    }
}

impl Default for ByteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ByteBuffer {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            hash: AtomicU32::new(self.hash.load(AtomicOrdering::Relaxed)),
        }
    }
}

impl PartialEq for ByteBuffer {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        if let (Some(a), Some(b)) = (self.cached_hash(), other.cached_hash()) {
            if a != b {
                return false;
            }
        }
        match (&self.node, &other.node) {
            (Node::Empty, Node::Empty) => true,
            (Node::Leaf(a), Node::Leaf(b)) => a == b,
            _ => equal_fragments(self.chunks(), other.chunks()),
        }
    }
}

impl Eq for ByteBuffer {}

impl PartialOrd for ByteBuffer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Unsigned lexicographic order.
impl Ord for ByteBuffer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bytes().cmp(other.bytes())
    }
}

impl Hash for ByteBuffer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash_code());
    }
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.len();
        if len <= DEBUG_CONTENTS_LIMIT {
            let contents = self.contiguous();
            write!(f, "<ByteBuffer size={len} contents=\"{}\">", contents.escape_ascii())
        } else {
            let head = self.slice_within(0, DEBUG_CONTENTS_LIMIT - 3);
            let contents = head.contiguous();
            write!(f, "<ByteBuffer size={len} contents=\"{}...\">", contents.escape_ascii())
        }
    }
}

impl From<Bytes> for ByteBuffer {
    fn from(bytes: Bytes) -> Self {
        Self::leaf(bytes)
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::leaf(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for ByteBuffer {
    fn from(bytes: &'static [u8]) -> Self {
        Self::leaf(Bytes::from_static(bytes))
    }
}

impl From<&str> for ByteBuffer {
    fn from(text: &str) -> Self {
        Self::copy_from_utf8(text)
    }
}

impl<'a> IntoIterator for &'a ByteBuffer {
    type Item = u8;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.bytes()
    }
}
