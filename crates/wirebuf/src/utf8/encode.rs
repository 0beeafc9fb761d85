use alloc::{vec, vec::Vec};
use core::char::decode_utf16;

use crate::error::EncodeError;

/// Number of bytes needed to encode the UTF-16 `units` as UTF-8.
///
/// # Errors
///
/// [`EncodeError::UnpairedSurrogate`] for a high surrogate that is not
/// followed by a low surrogate, or a low surrogate on its own.
pub fn encoded_length(units: &[u16]) -> Result<usize, EncodeError> {
    let ascii = units.iter().take_while(|&&u| u < 0x80).count();
    let mut total = ascii;
    let mut index = ascii;
    for decoded in decode_utf16(units[ascii..].iter().copied()) {
        let ch = decoded.map_err(|_| EncodeError::UnpairedSurrogate {
            index,
            length: units.len(),
        })?;
        total += ch.len_utf8();
        index += ch.len_utf16();
    }
    Ok(total)
}

/// Encodes the UTF-16 `units` into `out` and returns the number of bytes
/// written. Nothing is ever replaced with U+FFFD.
///
/// # Errors
///
/// [`EncodeError::UnpairedSurrogate`] as for [`encoded_length`], and
/// [`EncodeError::BufferTooSmall`] when `out` runs out while encoding the code
/// unit at `index`. Bytes written before the error are left in `out`.
pub fn encode(units: &[u16], out: &mut [u8]) -> Result<usize, EncodeError> {
    let mut written = 0;
    let mut index = 0;
    for decoded in decode_utf16(units.iter().copied()) {
        let ch = decoded.map_err(|_| EncodeError::UnpairedSurrogate {
            index,
            length: units.len(),
        })?;
        let width = ch.len_utf8();
        let Some(dst) = out.get_mut(written..written + width) else {
            return Err(EncodeError::BufferTooSmall { index });
        };
        ch.encode_utf8(dst);
        written += width;
        index += ch.len_utf16();
    }
    Ok(written)
}

/// Encodes `units` into a freshly sized vector.
///
/// # Errors
///
/// Same as [`encoded_length`].
pub fn encode_to_vec(units: &[u16]) -> Result<Vec<u8>, EncodeError> {
    let mut out = vec![0; encoded_length(units)?];
    let written = encode(units, &mut out)?;
    debug_assert_eq!(written, out.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    fn utf16(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[test]
    fn lengths_by_width() {
        assert_eq!(encoded_length(&utf16("abc")).unwrap(), 3);
        assert_eq!(encoded_length(&utf16("é")).unwrap(), 2);
        assert_eq!(encoded_length(&utf16("€")).unwrap(), 3);
        assert_eq!(encoded_length(&utf16("a😀b")).unwrap(), 6);
        assert_eq!(encoded_length(&[]).unwrap(), 0);
    }

    #[test]
    fn encodes_like_str() {
        let text = "plain ascii, café, € and 😀";
        assert_eq!(encode_to_vec(&utf16(text)).unwrap(), text.as_bytes());
    }

    #[test]
    fn lone_high_surrogate() {
        let units = [u16::from(b'a'), 0xD83D, u16::from(b'b')];
        let expected = EncodeError::UnpairedSurrogate {
            index: 1,
            length: 3,
        };
        assert_eq!(encoded_length(&units), Err(expected));
        assert_eq!(encode(&units, &mut [0; 16]), Err(expected));
    }

    #[test]
    fn lone_low_surrogate_after_pair() {
        let mut units = utf16("😀");
        units.push(0xDE00);
        assert_eq!(
            encoded_length(&units),
            Err(EncodeError::UnpairedSurrogate {
                index: 2,
                length: 3,
            })
        );
    }

    #[test]
    fn high_surrogate_at_end() {
        assert_eq!(
            encoded_length(&[0xD800]),
            Err(EncodeError::UnpairedSurrogate {
                index: 0,
                length: 1,
            })
        );
    }

    #[test]
    fn short_output_buffer() {
        let units = utf16("ab€");
        let mut out = [0u8; 4];
        assert_eq!(
            encode(&units, &mut out),
            Err(EncodeError::BufferTooSmall { index: 2 })
        );
        assert_eq!(&out[..2], b"ab");
    }
}
