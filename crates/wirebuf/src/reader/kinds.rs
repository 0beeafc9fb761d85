//! Marker types naming the scalar field kinds.
//!
//! Each kind fixes a wire type and how one value is decoded. They let a single
//! [`WireReader::read_list`](super::WireReader::read_list) handle every
//! packable repeated field:
//!
//! ```rust
//! use wirebuf::{WireReader, kinds::SInt32};
//!
//! // field 4, packed: [-1, 1]
//! let mut reader = WireReader::from_slice(&[0x22, 0x02, 0x01, 0x02]);
//! reader.next_field().unwrap();
//! let mut values = Vec::new();
//! reader.read_list::<SInt32>(&mut values).unwrap();
//! assert_eq!(values, [-1, 1]);
//! ```

use super::source::WireSource;
use crate::{
    error::DecodeError,
    varint::{decode_zigzag32, decode_zigzag64},
    wire_format::{FIXED32_SIZE, FIXED64_SIZE, WireType},
};

mod sealed {
    pub trait Sealed {}
}

/// A scalar kind that may appear in packed form.
pub trait PackableScalar: sealed::Sealed {
    /// The decoded Rust value.
    type Value;
    /// Wire type of one unpacked element.
    const WIRE_TYPE: WireType;
    /// Encoded size of one element, for fixed-width kinds.
    const FIXED_SIZE: Option<usize>;

    /// Decodes one element, without a tag.
    ///
    /// # Errors
    ///
    /// Whatever the source reports for a short or malformed value.
    fn decode<S: WireSource + ?Sized>(source: &mut S) -> Result<Self::Value, DecodeError>;
}

macro_rules! scalar_kind {
    ($(#[$meta:meta])* $name:ident => $value:ty, $wire:ident, $size:expr, |$src:ident| $decode:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub enum $name {}

        impl sealed::Sealed for $name {}

        impl PackableScalar for $name {
            type Value = $value;
            const WIRE_TYPE: WireType = WireType::$wire;
            const FIXED_SIZE: Option<usize> = $size;

            #[inline]
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            fn decode<S: WireSource + ?Sized>($src: &mut S) -> Result<$value, DecodeError> {
                $decode
            }
        }
    };
}

scalar_kind!(
    /// `int32`: a varint whose low 32 bits are the two's complement value.
    Int32 => i32, Varint, None, |s| Ok(s.read_varint32()? as i32)
);
scalar_kind!(
    /// `int64`.
    Int64 => i64, Varint, None, |s| Ok(s.read_varint64()? as i64)
);
scalar_kind!(
    /// `uint32`.
    UInt32 => u32, Varint, None, |s| s.read_varint32()
);
scalar_kind!(
    /// `uint64`.
    UInt64 => u64, Varint, None, |s| s.read_varint64()
);
scalar_kind!(
    /// `sint32`: zigzag encoded.
    SInt32 => i32, Varint, None, |s| Ok(decode_zigzag32(s.read_varint32()?))
);
scalar_kind!(
    /// `sint64`: zigzag encoded.
    SInt64 => i64, Varint, None, |s| Ok(decode_zigzag64(s.read_varint64()?))
);
scalar_kind!(
    /// `bool`: any non-zero varint is `true`.
    Bool => bool, Varint, None, |s| Ok(s.read_varint64()? != 0)
);
scalar_kind!(
    /// An enum's numeric value, decoded like `int32`. Whether the number is a
    /// declared variant is for the caller to decide.
    Enum => i32, Varint, None, |s| Ok(s.read_varint32()? as i32)
);
scalar_kind!(
    /// `fixed32`.
    Fixed32 => u32, Fixed32, Some(FIXED32_SIZE), |s| s.read_fixed32()
);
scalar_kind!(
    /// `fixed64`.
    Fixed64 => u64, Fixed64, Some(FIXED64_SIZE), |s| s.read_fixed64()
);
scalar_kind!(
    /// `sfixed32`.
    SFixed32 => i32, Fixed32, Some(FIXED32_SIZE), |s| Ok(s.read_fixed32()? as i32)
);
scalar_kind!(
    /// `sfixed64`.
    SFixed64 => i64, Fixed64, Some(FIXED64_SIZE), |s| Ok(s.read_fixed64()? as i64)
);
scalar_kind!(
    /// `float`.
    Float => f32, Fixed32, Some(FIXED32_SIZE), |s| Ok(f32::from_bits(s.read_fixed32()?))
);
scalar_kind!(
    /// `double`.
    Double => f64, Fixed64, Some(FIXED64_SIZE), |s| Ok(f64::from_bits(s.read_fixed64()?))
);
