//! Decoding for the protobuf binary wire format, and the byte containers it
//! produces.
//!
//! - [`WireReader`] walks tag-length-value input field by field, over a slice,
//!   shared [`bytes::Bytes`], or (with `std`) any [`std::io::Read`].
//! - [`ByteBuffer`] is an immutable rope: concatenation and substrings share
//!   storage and the tree stays balanced.
//! - [`utf8`] validates UTF-8 a chunk at a time and encodes UTF-16 to UTF-8.
//! - [`varint`] holds the varint, zigzag and fixed-width codecs.
//!
//! ```rust
//! use wirebuf::{ByteBuffer, WireReader};
//!
//! let message = ByteBuffer::from(&[0x0A, 0x03][..]).concat(&ByteBuffer::from("abc"));
//! let mut reader = message.new_wire_reader();
//! assert_eq!(reader.next_field()?, Some(1));
//! assert_eq!(reader.read_string(true)?, "abc");
//! assert_eq!(reader.next_field()?, None);
//! # Ok::<(), wirebuf::DecodeError>(())
//! ```
//!
//! The crate is `no_std` with `alloc`; the `std` feature (on by default) adds
//! the stream reader and `std::io` adapters for [`ByteBuffer`].

#![no_std]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod error;
mod options;
mod reader;
mod rope;
pub mod utf8;
pub mod varint;
pub mod wire_format;

#[cfg(test)]
mod tests;

pub use error::{DecodeError, DecodeErrorKind, EncodeError};
pub use options::ReaderOptions;
#[cfg(feature = "std")]
pub use reader::StreamSource;
pub use reader::{SliceSource, WireReader, WireSource, kinds};
#[cfg(feature = "std")]
pub use rope::RopeReader;
pub use rope::{ByteBuffer, COPY_THRESHOLD, Charset, Chunks, Iter};
pub use wire_format::WireType;
