//! Prints the top-level fields of a wire-format message read from stdin.
//!
//! ```text
//! printf '\x08\x96\x01\x12\x02hi' | cargo run --example dump_fields
//! 1  varint  150
//! 2  bytes   <ByteBuffer size=2 contents="hi">
//! ```
//!
//! Nothing about the schema is known, so length-delimited fields are shown as
//! bytes and groups are skipped.

use std::io;

use wirebuf::{DecodeError, WireReader, WireType};

fn main() -> Result<(), DecodeError> {
    let mut reader = WireReader::from_stream(io::stdin().lock());
    while let Some(field) = reader.next_field()? {
        match reader.current_wire_type()? {
            WireType::Varint => println!("{field}  varint  {}", reader.read_uint64()?),
            WireType::Fixed64 => println!("{field}  fixed64 {:#018x}", reader.read_fixed64()?),
            WireType::Fixed32 => println!("{field}  fixed32 {:#010x}", reader.read_fixed32()?),
            WireType::LengthDelimited => println!("{field}  bytes   {:?}", reader.read_bytes()?),
            WireType::StartGroup | WireType::EndGroup => {
                println!("{field}  group   (skipped)");
                reader.skip_field()?;
            }
        }
    }
    Ok(())
}
