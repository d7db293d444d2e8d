//! Width-nibble integer codec.
//!
//! Every packed integer in the stream is described by a 4-bit width
//! indicator and stored little-endian in exactly that many bytes:
//!
//! * `1..=8`  - a non-negative value in `w` bytes. In a signed context
//!   `w = 8` carries the raw two's complement value.
//! * `9..=15` - a negative value whose magnitude takes `w - 8` bytes.
//!
//! Indicators travel in pairs, two per byte ([`TwoNibbles`]), ahead of the
//! values they describe, so small values cost one byte plus half a byte of
//! header.

use crate::byte_cursor::ByteCursor;
use crate::error::{DecodeError, Result};

const MAX_BYTES: usize = 8;
const NEGATIVE_BASE: u8 = 8;

/// A pair of width indicators sharing one byte, low nibble first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TwoNibbles(pub u8);

impl TwoNibbles {
    pub fn new(first: u8, second: u8) -> Self {
        Self((first & 0x0f) | (second << 4))
    }

    #[inline]
    pub fn first(self) -> u8 {
        self.0 & 0x0f
    }

    #[inline]
    pub fn second(self) -> u8 {
        self.0 >> 4
    }

    /// Returns the `index`-th nibble of a packed nibble array.
    pub fn nth(nibbles: &[TwoNibbles], index: usize) -> u8 {
        let pair = nibbles[index / 2];
        if index % 2 == 0 {
            pair.first()
        } else {
            pair.second()
        }
    }
}

/// Decodes an unsigned value described by `nibble`.
pub fn decode_unsigned(cursor: &mut ByteCursor<'_>, nibble: u8) -> Result<u64> {
    match nibble {
        1..=8 => read_magnitude(cursor, nibble as usize),
        0 => Err(malformed(cursor, "zero width indicator")),
        _ => Err(malformed(cursor, "negative width indicator for an unsigned value")),
    }
}

/// Decodes a signed value described by `nibble`.
pub fn decode_signed(cursor: &mut ByteCursor<'_>, nibble: u8) -> Result<i64> {
    match nibble {
        1..=8 => Ok(read_magnitude(cursor, nibble as usize)? as i64),
        9..=15 => {
            let magnitude = read_magnitude(cursor, (nibble - NEGATIVE_BASE) as usize)?;
            Ok((magnitude as i64).wrapping_neg())
        }
        _ => Err(malformed(cursor, "zero width indicator")),
    }
}

/// Appends the canonical encoding of `value` and returns its indicator.
pub fn pack_unsigned(value: u64, out: &mut Vec<u8>) -> u8 {
    let width = bytes_needed(value);
    out.extend_from_slice(&value.to_le_bytes()[..width]);
    width as u8
}

/// Appends the canonical encoding of `value` and returns its indicator.
pub fn pack_signed(value: i64, out: &mut Vec<u8>) -> u8 {
    if value >= 0 {
        return pack_unsigned(value as u64, out);
    }

    let magnitude = value.unsigned_abs();
    let width = bytes_needed(magnitude);
    if width < MAX_BYTES {
        out.extend_from_slice(&magnitude.to_le_bytes()[..width]);
        NEGATIVE_BASE + width as u8
    } else {
        out.extend_from_slice(&value.to_le_bytes());
        MAX_BYTES as u8
    }
}

#[inline]
fn bytes_needed(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(8).max(1)
}

fn read_magnitude(cursor: &mut ByteCursor<'_>, len: usize) -> Result<u64> {
    let offset = cursor.position();
    let mut bytes = [0u8; MAX_BYTES];
    cursor.read_exact(&mut bytes[..len]).map_err(|e| match e {
        DecodeError::TruncatedRecord { .. } => DecodeError::MalformedVarint {
            offset,
            reason: "width indicator runs past the end of the stream",
        },
        other => other,
    })?;
    Ok(u64::from_le_bytes(bytes))
}

fn malformed(cursor: &ByteCursor<'_>, reason: &'static str) -> DecodeError {
    DecodeError::MalformedVarint {
        offset: cursor.position(),
        reason,
    }
}
