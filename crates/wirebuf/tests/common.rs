#![allow(missing_docs, dead_code)]

use wirebuf::{
    WireType,
    varint::{encode_varint32, encode_varint64, zigzag32, zigzag64},
    wire_format::make_tag,
};

/// Hand-rolled message encoder for building test inputs.
#[derive(Default)]
pub struct Message {
    buf: Vec<u8>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(mut self, field: u32, wire_type: WireType) -> Self {
        encode_varint32(make_tag(field, wire_type), &mut self.buf);
        self
    }

    pub fn varint(self, field: u32, value: u64) -> Self {
        let mut this = self.tag(field, WireType::Varint);
        encode_varint64(value, &mut this.buf);
        this
    }

    pub fn int32(self, field: u32, value: i32) -> Self {
        self.varint(field, i64::from(value) as u64)
    }

    pub fn sint32(self, field: u32, value: i32) -> Self {
        self.varint(field, u64::from(zigzag32(value)))
    }

    pub fn sint64(self, field: u32, value: i64) -> Self {
        self.varint(field, zigzag64(value))
    }

    pub fn fixed32(self, field: u32, value: u32) -> Self {
        let mut this = self.tag(field, WireType::Fixed32);
        this.buf.extend_from_slice(&value.to_le_bytes());
        this
    }

    pub fn fixed64(self, field: u32, value: u64) -> Self {
        let mut this = self.tag(field, WireType::Fixed64);
        this.buf.extend_from_slice(&value.to_le_bytes());
        this
    }

    pub fn bytes(self, field: u32, payload: &[u8]) -> Self {
        let mut this = self.tag(field, WireType::LengthDelimited);
        encode_varint32(u32::try_from(payload.len()).unwrap(), &mut this.buf);
        this.buf.extend_from_slice(payload);
        this
    }

    pub fn string(self, field: u32, text: &str) -> Self {
        self.bytes(field, text.as_bytes())
    }

    pub fn message(self, field: u32, inner: &Message) -> Self {
        self.bytes(field, &inner.buf)
    }

    pub fn group(self, field: u32, inner: &Message) -> Self {
        let mut this = self.tag(field, WireType::StartGroup);
        this.buf.extend_from_slice(&inner.buf);
        this.tag(field, WireType::EndGroup)
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}
