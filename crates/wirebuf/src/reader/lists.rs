use alloc::{string::String, vec::Vec};

use super::{WireReader, kinds::PackableScalar, source::WireSource};
use crate::{
    error::{DecodeError, DecodeErrorKind},
    rope::ByteBuffer,
    wire_format::{WireType, tag_field_number, tag_wire_type},
};

impl<S: WireSource> WireReader<S> {
    /// Appends the current repeated field to `target`, packed or not.
    ///
    /// A length-delimited field is taken as a packed blob of elements.
    /// Otherwise this reads the current element and every directly following
    /// element with the same tag; the first different tag is kept for the next
    /// [`next_field`](Self::next_field).
    ///
    /// # Errors
    ///
    /// `InvalidWireType` for a wire type that is neither packed nor `K`'s,
    /// `ParseFailure` for a packed fixed-width blob whose length is not a
    /// multiple of the element size, `TruncatedMessage` for a packed blob that
    /// ends in the middle of an element.
    pub fn read_list<K: PackableScalar>(
        &mut self,
        target: &mut Vec<K::Value>,
    ) -> Result<(), DecodeError> {
        if tag_wire_type(self.tag) != WireType::LengthDelimited as u8 {
            return self.read_repeated(K::WIRE_TYPE, target, |reader| {
                K::decode(&mut reader.source)
            });
        }

        let len = self.read_length()?;
        if let Some(size) = K::FIXED_SIZE {
            if len % size != 0 {
                return Err(self.error(DecodeErrorKind::ParseFailure(
                    "packed fixed-width field length is not a multiple of the element size",
                )));
            }
        }
        let saved = self.push_limit(len)?;
        while !self.source.is_at_end()? {
            target.push(K::decode(&mut self.source)?);
        }
        self.pop_limit(saved);
        Ok(())
    }

    /// Appends a run of `bytes` elements.
    ///
    /// # Errors
    ///
    /// As for [`read_bytes`](Self::read_bytes).
    pub fn read_bytes_list(&mut self, target: &mut Vec<ByteBuffer>) -> Result<(), DecodeError> {
        self.read_repeated(WireType::LengthDelimited, target, Self::read_bytes)
    }

    /// Appends a run of `string` elements, validated according to
    /// [`ReaderOptions::strict_utf8`](crate::ReaderOptions::strict_utf8).
    ///
    /// # Errors
    ///
    /// As for [`read_string`](Self::read_string).
    pub fn read_string_list(&mut self, target: &mut Vec<String>) -> Result<(), DecodeError> {
        let strict = self.options.strict_utf8;
        self.read_repeated(WireType::LengthDelimited, target, |reader| {
            reader.read_string(strict)
        })
    }

    /// Appends a run of embedded messages, each decoded by `merge` as in
    /// [`merge_nested_message`](Self::merge_nested_message).
    ///
    /// # Errors
    ///
    /// As for [`merge_nested_message`](Self::merge_nested_message).
    pub fn read_message_list<T>(
        &mut self,
        target: &mut Vec<T>,
        mut merge: impl FnMut(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<(), DecodeError> {
        self.read_repeated(WireType::LengthDelimited, target, |reader| {
            reader.merge_nested_message(&mut merge)
        })
    }

    /// Appends a run of groups, each decoded by `merge` as in
    /// [`merge_group`](Self::merge_group).
    ///
    /// # Errors
    ///
    /// As for [`merge_group`](Self::merge_group).
    pub fn read_group_list<T>(
        &mut self,
        target: &mut Vec<T>,
        mut merge: impl FnMut(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<(), DecodeError> {
        let field_number = tag_field_number(self.tag);
        self.read_repeated(WireType::StartGroup, target, |reader| {
            reader.merge_group(field_number, &mut merge)
        })
    }

    /// Reads elements with `read_one` for as long as the same tag repeats.
    fn read_repeated<T>(
        &mut self,
        expected: WireType,
        target: &mut Vec<T>,
        mut read_one: impl FnMut(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<(), DecodeError> {
        self.require_wire_type(expected)?;
        let list_tag = self.tag;
        loop {
            self.tag = list_tag;
            target.push(read_one(self)?);
            let next = self.read_tag()?;
            if next != list_tag {
                self.next_tag = Some(next);
                return Ok(());
            }
        }
    }
}
