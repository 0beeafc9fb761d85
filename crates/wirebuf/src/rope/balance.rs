use alloc::vec::Vec;

use bytes::Bytes;
use tracing::trace;

use super::{ByteBuffer, COPY_THRESHOLD, Node};

const DEPTH_TABLE_LEN: usize = 93;

/// `MIN_LENGTH_BY_DEPTH[d]` is the shortest length a balanced tree of depth
/// `d` may have: 1, 2, 3, 5, 8, ... The final entry is `usize::MAX` so that
/// `d + 1` is always a valid index for any reachable depth bin.
static MIN_LENGTH_BY_DEPTH: [usize; DEPTH_TABLE_LEN] = min_lengths();

const fn min_lengths() -> [usize; DEPTH_TABLE_LEN] {
    let mut table = [usize::MAX; DEPTH_TABLE_LEN];
    let (mut prev, mut current) = (1usize, 1usize);
    let mut i = 0;
    while i < DEPTH_TABLE_LEN - 1 {
        table[i] = current;
        let next = prev.saturating_add(current);
        prev = current;
        current = next;
        i += 1;
    }
    table
}

fn min_length(depth: usize) -> usize {
    MIN_LENGTH_BY_DEPTH.get(depth).copied().unwrap_or(usize::MAX)
}

fn is_balanced(buffer: &ByteBuffer) -> bool {
    buffer.len() >= min_length(buffer.depth())
}

/// Index of the bin `[MIN_LENGTH_BY_DEPTH[i], MIN_LENGTH_BY_DEPTH[i + 1])`
/// holding `len`.
fn depth_bin(len: usize) -> usize {
    match MIN_LENGTH_BY_DEPTH.binary_search(&len) {
        Ok(depth) => depth,
        Err(insertion) => insertion.saturating_sub(1),
    }
}

fn flat_concat(left: &ByteBuffer, right: &ByteBuffer) -> ByteBuffer {
    let mut bytes = Vec::with_capacity(left.len() + right.len());
    left.write_to(&mut bytes);
    right.write_to(&mut bytes);
    ByteBuffer::leaf(Bytes::from(bytes))
}

impl ByteBuffer {
    /// The concatenation of `self` and `other`.
    ///
    /// In order of preference:
    /// 1. an empty side yields the other side unchanged;
    /// 2. results under [`COPY_THRESHOLD`] bytes are copied into one leaf;
    /// 3. if `self` is a concatenation whose right child plus `other` is under
    ///    the threshold, that child and `other` are copied into a new right
    ///    child, keeping the depth of `self`;
    /// 4. if `self` leans left and is deeper than `other`, `other` is hung
    ///    under a new right child, again keeping the depth of `self`;
    /// 5. a plain new node, if the result is balanced at its depth;
    /// 6. otherwise both trees are rebalanced together.
    ///
    /// # Panics
    ///
    /// Panics if the combined length overflows `usize`.
    #[must_use]
    pub fn concat(&self, other: &ByteBuffer) -> ByteBuffer {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let Some(new_len) = self.len().checked_add(other.len()) else {
            panic!("concatenated buffer length overflows usize");
        };
        if new_len < COPY_THRESHOLD {
            return flat_concat(self, other);
        }

        if let Node::Concat(left) = &self.node {
            if left.right.len() + other.len() < COPY_THRESHOLD {
                let right = flat_concat(&left.right, other);
                return ByteBuffer::join(left.left.clone(), right);
            }
            if left.left.depth() > left.right.depth() && left.depth > other.depth() {
                let right = ByteBuffer::join(left.right.clone(), other.clone());
                return ByteBuffer::join(left.left.clone(), right);
            }
        }

        let new_depth = self.depth().max(other.depth()) + 1;
        if new_len >= min_length(new_depth) {
            return ByteBuffer::join(self.clone(), other.clone());
        }

        Balancer::default().balance(self, other)
    }
}

/// Rebuilds a tree from its balanced subtrees.
///
/// The stack holds the already visited prefix of the result, bottom to top.
/// Adjacent entries are merged whenever a new piece would fall into a length
/// bin that is already occupied, so entry lengths strictly decrease towards the
/// top except right after a merge.
#[derive(Default)]
struct Balancer {
    stack: Vec<ByteBuffer>,
}

impl Balancer {
    fn balance(mut self, left: &ByteBuffer, right: &ByteBuffer) -> ByteBuffer {
        self.push_tree(left);
        self.push_tree(right);

        let mut result = self.stack.pop().unwrap_or_default();
        while let Some(prefix) = self.stack.pop() {
            result = ByteBuffer::join(prefix, result);
        }
        trace!(
            len = result.len(),
            depth = result.depth(),
            "rebalanced rope"
        );
        result
    }

    /// Inserts balanced subtrees whole and splits unbalanced ones.
    fn push_tree(&mut self, root: &ByteBuffer) {
        if is_balanced(root) {
            self.insert(root.clone());
        } else if let Node::Concat(concat) = &root.node {
            self.push_tree(&concat.left);
            self.push_tree(&concat.right);
        }
    }

    fn insert(&mut self, piece: ByteBuffer) {
        let bin = depth_bin(piece.len());
        let bin_end = min_length(bin + 1);

        let mut tree = match self.stack.pop() {
            Some(top) if top.len() < bin_end => top,
            Some(top) => {
                self.stack.push(top);
                self.stack.push(piece);
                return;
            }
            None => {
                self.stack.push(piece);
                return;
            }
        };

        // Fold in everything shorter than the piece's own bin.
        let bin_start = min_length(bin);
        while self.stack.last().is_some_and(|top| top.len() < bin_start) {
            if let Some(prefix) = self.stack.pop() {
                tree = ByteBuffer::join(prefix, tree);
            }
        }

        tree = ByteBuffer::join(tree, piece);

        // Keep merging until the result lands in an empty bin.
        while let Some(top) = self.stack.last() {
            let end = min_length(depth_bin(tree.len()) + 1);
            if top.len() >= end {
                break;
            }
            if let Some(prefix) = self.stack.pop() {
                tree = ByteBuffer::join(prefix, tree);
            }
        }
        self.stack.push(tree);
    }
}

impl FromIterator<ByteBuffer> for ByteBuffer {
    /// Concatenates the pieces pairwise by halves, so that the resulting tree
    /// is balanced regardless of how many pieces there are.
    fn from_iter<I: IntoIterator<Item = ByteBuffer>>(iter: I) -> Self {
        let pieces: Vec<ByteBuffer> = iter.into_iter().filter(|b| !b.is_empty()).collect();
        balanced_concat(&pieces)
    }
}

fn balanced_concat(pieces: &[ByteBuffer]) -> ByteBuffer {
    match pieces {
        [] => ByteBuffer::new(),
        [only] => only.clone(),
        _ => {
            let (left, right) = pieces.split_at(pieces.len() / 2);
            balanced_concat(left).concat(&balanced_concat(right))
        }
    }
}
