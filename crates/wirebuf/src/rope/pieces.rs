use alloc::vec::Vec;
use core::{iter::FusedIterator, slice};

use super::{ByteBuffer, Node};

/// Iterator over the leaves of a [`ByteBuffer`], left to right.
///
/// Keeps the unvisited right siblings on an explicit stack, so it holds at most
/// `depth + 1` entries.
#[derive(Clone)]
pub struct Chunks<'a> {
    pending: Vec<&'a ByteBuffer>,
}

impl<'a> Chunks<'a> {
    pub(super) fn new(root: &'a ByteBuffer) -> Self {
        let mut pending = Vec::with_capacity(root.depth() + 1);
        pending.push(root);
        Self { pending }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        while let Some(buffer) = self.pending.pop() {
            match &buffer.node {
                Node::Empty => {}
                Node::Leaf(bytes) => return Some(bytes.as_ref()),
                Node::Concat(concat) => {
                    self.pending.push(&concat.right);
                    self.pending.push(&concat.left);
                }
            }
        }
        None
    }
}

impl FusedIterator for Chunks<'_> {}

/// Iterator over the bytes of a [`ByteBuffer`].
#[derive(Clone)]
pub struct Iter<'a> {
    chunks: Chunks<'a>,
    current: slice::Iter<'a, u8>,
}

impl<'a> Iter<'a> {
    pub(super) fn new(root: &'a ByteBuffer) -> Self {
        Self {
            chunks: Chunks::new(root),
            current: [].iter(),
        }
    }
}

impl Iterator for Iter<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        loop {
            if let Some(&byte) = self.current.next() {
                return Some(byte);
            }
            self.current = self.chunks.next()?.iter();
        }
    }
}

impl FusedIterator for Iter<'_> {}
