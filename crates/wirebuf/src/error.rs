use thiserror::Error;

/// An error produced while decoding wire-format input.
///
/// Every error is terminal for the decode call that produced it: the reader
/// never tries to resynchronise after a malformed field. `offset` is the number
/// of bytes the reader had consumed when the problem was detected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at byte {offset}")]
pub struct DecodeError {
    pub(crate) kind: DecodeErrorKind,
    pub(crate) offset: usize,
}

impl DecodeError {
    pub(crate) fn new(kind: DecodeErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }

    /// What went wrong.
    #[must_use]
    pub fn kind(&self) -> &DecodeErrorKind {
        &self.kind
    }

    /// Byte offset into the input at which the error was raised.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// The reason a decode failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// A varint kept its continuation bit set past the tenth byte.
    #[error("malformed varint")]
    MalformedVarint,
    /// The tag's wire type did not match what the caller asked for, or is not
    /// one of the six defined wire types.
    #[error("invalid wire type {0}")]
    InvalidWireType(u8),
    /// A tag carried field number zero.
    #[error("invalid tag {0:#x}")]
    InvalidTag(u32),
    /// A length prefix does not fit a signed 32-bit length.
    #[error("negative size")]
    NegativeSize,
    /// The input ended in the middle of a field, or a length ran past the
    /// enclosing limit.
    #[error("truncated message")]
    TruncatedMessage,
    /// A nested message or group did not end where its framing said it would.
    #[error("parse failure: {0}")]
    ParseFailure(&'static str),
    /// Nesting went deeper than the configured recursion limit.
    #[error("recursion limit exceeded")]
    RecursionLimitExceeded,
    /// A strictly validated string field was not well-formed UTF-8.
    #[error("invalid UTF-8")]
    InvalidUtf8,
    /// The reader would have to consume more than the configured size limit.
    #[error("size limit exceeded")]
    SizeLimitExceeded,
    /// The underlying stream failed.
    #[cfg(feature = "std")]
    #[error("I/O error: {0}")]
    Io(std::io::ErrorKind),
}

/// An error produced while encoding UTF-16 text as UTF-8.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// A high surrogate without a following low surrogate, or a lone low
    /// surrogate.
    #[error("unpaired surrogate at index {index} of {length}")]
    UnpairedSurrogate {
        /// Position of the offending code unit.
        index: usize,
        /// Length of the input, in code units.
        length: usize,
    },
    /// The output buffer ran out while encoding the code unit at `index`.
    #[error("output buffer too small when writing code unit at index {index}")]
    BufferTooSmall {
        /// Position of the code unit that did not fit.
        index: usize,
    },
}
