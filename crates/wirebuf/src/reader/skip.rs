use alloc::vec::Vec;

use bytes::BufMut;

use super::{WireReader, kinds, source::WireSource};
use crate::{
    error::{DecodeError, DecodeErrorKind},
    varint::{encode_varint32, encode_varint64},
    wire_format::{WireType, make_tag, tag_field_number, tag_wire_type},
};

impl<S: WireSource> WireReader<S> {
    /// Skips the current field, including everything inside a group.
    ///
    /// Returns `false`, without consuming anything, when there is no field to
    /// skip: at the end of the message or on the end tag of the enclosing
    /// group.
    ///
    /// # Errors
    ///
    /// `InvalidWireType` for wire types 6 and 7, `ParseFailure` for an
    /// end-group tag that does not close the enclosing group or for a skipped
    /// group that is never closed, plus any error reading the field.
    pub fn skip_field(&mut self) -> Result<bool, DecodeError> {
        if self.tag == 0 || Some(self.tag) == self.end_group_tag {
            return Ok(false);
        }
        self.skip_tagged::<Vec<u8>>(self.tag, None)?;
        Ok(true)
    }

    /// Like [`skip_field`](Self::skip_field) for the field introduced by
    /// `tag`, but re-encodes the field (tag included) into `sink` so that it
    /// can be kept as unknown data.
    ///
    /// # Errors
    ///
    /// As for [`skip_field`](Self::skip_field).
    pub fn skip_or_store<B: BufMut + ?Sized>(
        &mut self,
        tag: u32,
        sink: &mut B,
    ) -> Result<bool, DecodeError> {
        if tag == 0 || Some(tag) == self.end_group_tag {
            return Ok(false);
        }
        self.skip_tagged(tag, Some(sink))?;
        Ok(true)
    }

    /// Skips fields until the end of the current message or group.
    ///
    /// # Errors
    ///
    /// As for [`skip_field`](Self::skip_field).
    pub fn skip_message(&mut self) -> Result<(), DecodeError> {
        while self.next_field()?.is_some() {
            if !self.skip_field()? {
                break;
            }
        }
        Ok(())
    }

    /// Reads an enum field, keeping numbers `is_known` rejects.
    ///
    /// Returns `Some` for a known number. An unknown number is written to
    /// `sink` as a varint field with the current field number, and `None` is
    /// returned.
    ///
    /// # Errors
    ///
    /// As for [`read_enum`](Self::read_enum).
    pub fn read_enum_or_store<B: BufMut + ?Sized>(
        &mut self,
        is_known: impl Fn(i32) -> bool,
        sink: &mut B,
    ) -> Result<Option<i32>, DecodeError> {
        let value = self.read_enum()?;
        if is_known(value) {
            return Ok(Some(value));
        }
        store_enum(tag_field_number(self.tag), value, sink);
        Ok(None)
    }

    /// The repeated-field counterpart of
    /// [`read_enum_or_store`](Self::read_enum_or_store): known numbers are
    /// appended to `target`, unknown ones are written to `sink` one varint
    /// field each.
    ///
    /// # Errors
    ///
    /// As for [`read_list`](Self::read_list).
    pub fn read_enum_list_or_store<B: BufMut + ?Sized>(
        &mut self,
        target: &mut Vec<i32>,
        is_known: impl Fn(i32) -> bool,
        sink: &mut B,
    ) -> Result<(), DecodeError> {
        let field_number = tag_field_number(self.tag);
        let mut values = Vec::new();
        self.read_list::<kinds::Enum>(&mut values)?;
        for value in values {
            if is_known(value) {
                target.push(value);
            } else {
                store_enum(field_number, value, sink);
            }
        }
        Ok(())
    }

    fn skip_tagged<B: BufMut + ?Sized>(
        &mut self,
        tag: u32,
        mut sink: Option<&mut B>,
    ) -> Result<(), DecodeError> {
        let bits = tag_wire_type(tag);
        let Some(wire_type) = WireType::from_bits(bits) else {
            return Err(self.error(DecodeErrorKind::InvalidWireType(bits)));
        };
        if wire_type == WireType::EndGroup {
            return Err(self.error(DecodeErrorKind::ParseFailure(
                "end-group tag outside of its group",
            )));
        }
        if let Some(sink) = sink.as_deref_mut() {
            encode_varint32(tag, sink);
        }

        match wire_type {
            WireType::Varint => {
                let value = self.source.read_varint64()?;
                if let Some(sink) = sink {
                    encode_varint64(value, sink);
                }
            }
            WireType::Fixed64 => {
                let value = self.source.read_fixed64()?;
                if let Some(sink) = sink {
                    sink.put_u64_le(value);
                }
            }
            WireType::Fixed32 => {
                let value = self.source.read_fixed32()?;
                if let Some(sink) = sink {
                    sink.put_u32_le(value);
                }
            }
            WireType::LengthDelimited => {
                let len = self.read_length()?;
                match sink {
                    Some(sink) => {
                        let data = self.source.read_buffer(len)?;
                        // read_length caps lengths at i32::MAX
                        #[allow(clippy::cast_possible_truncation)]
                        let prefix = len as u32;
                        encode_varint32(prefix, sink);
                        data.write_to(sink);
                    }
                    None => self.source.skip(len)?,
                }
            }
            WireType::StartGroup => {
                self.enter()?;
                let end_tag = make_tag(tag_field_number(tag), WireType::EndGroup);
                loop {
                    let inner = self.read_tag()?;
                    if inner == end_tag {
                        break;
                    }
                    if inner == 0 {
                        return Err(self.error(DecodeErrorKind::ParseFailure(
                            "group is missing its end tag",
                        )));
                    }
                    self.skip_tagged(inner, sink.as_deref_mut())?;
                }
                if let Some(sink) = sink {
                    encode_varint32(end_tag, sink);
                }
                self.depth -= 1;
            }
            WireType::EndGroup => unreachable!("rejected above"),
        }
        Ok(())
    }
}

#[allow(clippy::cast_sign_loss)]
fn store_enum<B: BufMut + ?Sized>(field_number: u32, value: i32, sink: &mut B) {
    encode_varint32(make_tag(field_number, WireType::Varint), sink);
    // Negative numbers are sign extended, as for any int32.
    encode_varint64(i64::from(value) as u64, sink);
}
