//! Tag layout and wire type constants.
//!
//! <https://protobuf.dev/programming-guides/encoding/#structure>

/// Size in bytes of a `fixed32`, `sfixed32` or `float` value.
pub const FIXED32_SIZE: usize = 4;
/// Size in bytes of a `fixed64`, `sfixed64` or `double` value.
pub const FIXED64_SIZE: usize = 8;
/// Longest legal varint encoding.
pub const MAX_VARINT_SIZE: usize = 10;
/// Largest field number a tag can carry.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

const TAG_TYPE_BITS: u32 = 3;
const TAG_TYPE_MASK: u32 = (1 << TAG_TYPE_BITS) - 1;

/// The protobuf wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    /// int32, int64, uint32, uint64, sint32, sint64, bool, enum
    Varint = 0,
    /// fixed64, sfixed64, double
    Fixed64 = 1,
    /// string, bytes, embedded messages, packed repeated fields
    LengthDelimited = 2,
    /// group start (deprecated)
    StartGroup = 3,
    /// group end (deprecated)
    EndGroup = 4,
    /// fixed32, sfixed32, float
    Fixed32 = 5,
}

impl WireType {
    /// Maps the low three bits of a tag to a wire type. `6` and `7` are not
    /// defined and yield `None`.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::LengthDelimited),
            3 => Some(WireType::StartGroup),
            4 => Some(WireType::EndGroup),
            5 => Some(WireType::Fixed32),
            _ => None,
        }
    }
}

/// Builds a tag from a field number and wire type.
#[inline]
#[must_use]
pub const fn make_tag(field_number: u32, wire_type: WireType) -> u32 {
    (field_number << TAG_TYPE_BITS) | wire_type as u32
}

/// The field number carried by `tag`.
#[inline]
#[must_use]
pub const fn tag_field_number(tag: u32) -> u32 {
    tag >> TAG_TYPE_BITS
}

/// The raw wire type bits of `tag`. Use [`WireType::from_bits`] to check them.
#[inline]
#[must_use]
pub const fn tag_wire_type(tag: u32) -> u8 {
    (tag & TAG_TYPE_MASK) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_layout() {
        assert_eq!(make_tag(1, WireType::Varint), 0x08);
        assert_eq!(make_tag(2, WireType::LengthDelimited), 0x12);
        assert_eq!(make_tag(MAX_FIELD_NUMBER, WireType::Fixed32), 0xFFFF_FFFD);
        assert_eq!(tag_field_number(0x12), 2);
        assert_eq!(tag_wire_type(0x12), 2);
    }

    #[test]
    fn undefined_wire_types() {
        assert_eq!(WireType::from_bits(4), Some(WireType::EndGroup));
        assert_eq!(WireType::from_bits(6), None);
        assert_eq!(WireType::from_bits(7), None);
    }
}
