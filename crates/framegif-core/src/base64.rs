//! Standard base64 (RFC 4648, section 4) encoding and decoding.
//!
//! PNG buffers travel from host to UI as base64 text inside JSON
//! messages, and the finished GIF can travel back the same way.
//!
//! Every 3 input bytes become 4 characters from `A-Za-z0-9+/`. A final
//! group of 1 or 2 bytes is padded with `==` or `=` respectively.

/// The canonical base64 alphabet.
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const PAD: u8 = b'=';

/// Marker for bytes outside the alphabet in [`DECODE_TABLE`].
const INVALID: u8 = 0xFF;

/// Reverse lookup: ASCII byte → 6-bit value, or [`INVALID`].
const DECODE_TABLE: [u8; 256] = {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        #[allow(clippy::cast_possible_truncation)]
        {
            table[ALPHABET[i] as usize] = i as u8;
        }
        i += 1;
    }
    table
};

/// Errors from [`decode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Base64Error {
    /// A character outside the alphabet (and not padding or whitespace).
    #[error("invalid base64 character {character:?} at offset {offset}")]
    InvalidCharacter { character: char, offset: usize },

    /// The significant character count is not a multiple of 4.
    #[error("invalid base64 length {0}: must be a multiple of 4")]
    InvalidLength(usize),

    /// Padding in the middle of the input or more than two pad characters.
    #[error("misplaced base64 padding at offset {0}")]
    InvalidPadding(usize),
}

/// Encode bytes as padded standard base64.
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);

    for chunk in bytes.chunks(3) {
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied().unwrap_or(0);
        let b2 = chunk.get(2).copied().unwrap_or(0);
        let triple = (u32::from(b0) << 16) | (u32::from(b1) << 8) | u32::from(b2);

        // A chunk of n bytes carries n + 1 significant sextets.
        for sextet in 0..4 {
            if sextet <= chunk.len() {
                let index = (triple >> (6 * (3 - sextet))) & 0x3F;
                out.push(char::from(ALPHABET[index as usize]));
            } else {
                out.push(char::from(PAD));
            }
        }
    }

    out
}

/// Decode padded standard base64.
///
/// ASCII whitespace is ignored so line-wrapped input decodes.
///
/// # Errors
///
/// Returns [`Base64Error::InvalidCharacter`] for bytes outside the
/// alphabet, [`Base64Error::InvalidPadding`] for misplaced `=`, and
/// [`Base64Error::InvalidLength`] when the input does not form whole
/// 4-character groups.
pub fn decode(text: &str) -> Result<Vec<u8>, Base64Error> {
    let mut sextets: Vec<u8> = Vec::with_capacity(text.len());
    let mut padding = 0usize;

    for (offset, byte) in text.bytes().enumerate() {
        if byte.is_ascii_whitespace() {
            continue;
        }
        if byte == PAD {
            padding += 1;
            if padding > 2 {
                return Err(Base64Error::InvalidPadding(offset));
            }
            continue;
        }
        if padding > 0 {
            // Data after padding.
            return Err(Base64Error::InvalidPadding(offset));
        }
        let value = DECODE_TABLE[usize::from(byte)];
        if value == INVALID {
            let character = text[offset..].chars().next().unwrap_or(char::REPLACEMENT_CHARACTER);
            return Err(Base64Error::InvalidCharacter { character, offset });
        }
        sextets.push(value);
    }

    let total = sextets.len() + padding;
    if total % 4 != 0 {
        return Err(Base64Error::InvalidLength(total));
    }
    // "xx==" and "xxx=" are the only legal tails.
    if padding > 0 && sextets.len() % 4 + padding != 4 {
        return Err(Base64Error::InvalidPadding(text.len().saturating_sub(padding)));
    }

    let mut out = Vec::with_capacity(sextets.len() * 3 / 4);
    for group in sextets.chunks(4) {
        let mut acc = 0u32;
        for (i, &s) in group.iter().enumerate() {
            acc |= u32::from(s) << (6 * (3 - i));
        }
        let [_, b0, b1, b2] = acc.to_be_bytes();
        // A group of n sextets carries n - 1 bytes.
        out.extend_from_slice(&[b0, b1, b2][..group.len() - 1]);
    }

    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Test vectors from RFC 4648, section 10.
    const RFC_VECTORS: &[(&str, &str)] = &[
        ("", ""),
        ("f", "Zg=="),
        ("fo", "Zm8="),
        ("foo", "Zm9v"),
        ("foob", "Zm9vYg=="),
        ("fooba", "Zm9vYmE="),
        ("foobar", "Zm9vYmFy"),
    ];

    #[test]
    fn encodes_rfc_vectors() {
        for (plain, encoded) in RFC_VECTORS {
            assert_eq!(encode(plain.as_bytes()), *encoded, "encoding {plain:?}");
        }
    }

    #[test]
    fn decodes_rfc_vectors() {
        for (plain, encoded) in RFC_VECTORS {
            assert_eq!(decode(encoded).unwrap(), plain.as_bytes(), "decoding {encoded:?}");
        }
    }

    #[test]
    fn padding_count_follows_length() {
        for len in 0..=12usize {
            let bytes: Vec<u8> = (0..len).map(|i| (i * 37 % 256) as u8).collect();
            let text = encode(&bytes);
            assert_eq!(text.len(), len.div_ceil(3) * 4);
            let pads = text.bytes().filter(|&b| b == b'=').count();
            let expected = (3 - len % 3) % 3;
            assert_eq!(pads, expected, "length {len}");
            assert_eq!(decode(&text).unwrap(), bytes, "length {len}");
        }
    }

    #[test]
    fn round_trips_every_byte_value() {
        let bytes: Vec<u8> = (0..=255u8).rev().chain(0..=255u8).collect();
        let text = encode(&bytes);
        assert!(
            text.bytes().all(|b| ALPHABET.contains(&b) || b == b'='),
            "output must stay within the canonical alphabet"
        );
        assert_eq!(decode(&text).unwrap(), bytes);
    }

    #[test]
    fn uses_plus_and_slash() {
        assert_eq!(encode(&[0xFB, 0xFF]), "+/8=");
        assert_eq!(encode(&[0xFF, 0xFF, 0xFF]), "////");
    }

    #[test]
    fn decode_ignores_whitespace() {
        assert_eq!(decode("Zm9v\nYmFy\r\n").unwrap(), b"foobar");
    }

    #[test]
    fn decode_rejects_invalid_character() {
        assert_eq!(
            decode("Zm9-"),
            Err(Base64Error::InvalidCharacter {
                character: '-',
                offset: 3
            })
        );
    }

    #[test]
    fn decode_rejects_bad_length() {
        assert_eq!(decode("Zm9"), Err(Base64Error::InvalidLength(3)));
    }

    #[test]
    fn decode_rejects_misplaced_padding() {
        assert!(matches!(decode("Zg==Zg=="), Err(Base64Error::InvalidPadding(_))));
        assert!(matches!(decode("Z==="), Err(Base64Error::InvalidPadding(_))));
        assert!(matches!(decode("Zm9v===="), Err(Base64Error::InvalidPadding(_))));
    }
}
