//! Strict UTF-8 decoding.
//!
//! The functions here work on a byte slice plus an offset into it and never
//! read outside the slice. Iterators built on top of them live in [iter].

use std::fmt;

use crate::util;

pub mod iter;
pub mod string;

/// The longest sequence the decoder accepts. Modern Unicode caps UTF-8 at 4
/// bytes, but 5- and 6-byte sequences are still decoded.
pub const MAX_SEQUENCE_LENGTH: usize = 6;

/// Byte order mark, as it appears at the start of a UTF-8 file.
pub const BYTE_ORDER_MARK: [u8; 3] = [0xef, 0xbb, 0xbf];

/* Maps a sequence length to the number of payload bits it can carry. */
const BITS_AVAILABLE: [u32; MAX_SEQUENCE_LENGTH + 1] = [
    0,
    7,      /* 0xxxxxxx */
    5 + 6,  /* 110xxxxx ... */
    4 + 12, /* 1110xxxx ... */
    3 + 18, /* 11110xxx ... */
    2 + 24, /* 111110xx ... */
    1 + 30, /* 1111110x ... */
];

/// A decoded scalar value. Never a surrogate or a noncharacter, but may lie
/// above U+10FFFF when it came from a 5- or 6-byte sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CodePoint(u32);

impl CodePoint {
    pub fn value(self) -> u32 {
        self.0
    }

    /// Returns None for values beyond the Unicode range.
    pub fn to_char(self) -> Option<char> {
        char::from_u32(self.0)
    }
}

impl From<char> for CodePoint {
    fn from(c: char) -> CodePoint {
        CodePoint(c as u32)
    }
}

impl From<CodePoint> for u32 {
    fn from(cp: CodePoint) -> u32 {
        cp.0
    }
}

impl PartialEq<char> for CodePoint {
    fn eq(&self, rhs: &char) -> bool {
        self.0 == *rhs as u32
    }
}

impl fmt::Display for CodePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U+{:04X}", self.0)
    }
}

/// Offsets are relative to the start of the slice being decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid UTF-8 start byte {byte:#04x} at offset {offset}")]
    InvalidStartByte { offset: usize, byte: u8 },

    #[error("UTF-8 bytes ended prematurely at offset {offset} (needed {needed}, had {available})")]
    Truncated { offset: usize, needed: usize, available: usize },

    #[error("invalid UTF-8 continuation byte {byte:#04x} at offset {offset}")]
    InvalidContinuation { offset: usize, byte: u8 },

    #[error("overlong UTF-8 character {value:#x} at offset {offset}")]
    Overlong { offset: usize, value: u32 },

    #[error("invalid UTF-16 surrogate {value:#x} at offset {offset}")]
    Surrogate { offset: usize, value: u32 },

    #[error("reserved noncharacter {value:#x} at offset {offset}")]
    Noncharacter { offset: usize, value: u32 },
}

impl DecodeError {
    pub fn offset(&self) -> usize {
        match *self {
            DecodeError::InvalidStartByte { offset, .. } => offset,
            DecodeError::Truncated { offset, .. } => offset,
            DecodeError::InvalidContinuation { offset, .. } => offset,
            DecodeError::Overlong { offset, .. } => offset,
            DecodeError::Surrogate { offset, .. } => offset,
            DecodeError::Noncharacter { offset, .. } => offset,
        }
    }

    /// The same error, with its offset moved `by` bytes later.
    pub fn shifted(self, by: usize) -> DecodeError {
        match self {
            DecodeError::InvalidStartByte { offset, byte } => DecodeError::InvalidStartByte { offset: offset + by, byte },
            DecodeError::Truncated { offset, needed, available } => DecodeError::Truncated { offset: offset + by, needed, available },
            DecodeError::InvalidContinuation { offset, byte } => DecodeError::InvalidContinuation { offset: offset + by, byte },
            DecodeError::Overlong { offset, value } => DecodeError::Overlong { offset: offset + by, value },
            DecodeError::Surrogate { offset, value } => DecodeError::Surrogate { offset: offset + by, value },
            DecodeError::Noncharacter { offset, value } => DecodeError::Noncharacter { offset: offset + by, value },
        }
    }
}

/// A successfully decoded sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub value: CodePoint,
    pub len: usize,
}

/// Length of the sequence introduced by `lead`, or None if `lead` cannot
/// start a sequence (continuation bytes, 0xfe, 0xff).
pub fn sequence_length(lead: u8) -> Option<usize> {
    match (!lead).leading_zeros() {
        0 => Some(1),
        1 => None,
        n @ 2..=6 => Some(n as usize),
        _ => None,
    }
}

pub fn is_continuation(byte: u8) -> bool {
    byte & 0xc0 == 0x80
}

fn first_byte_mask(length: usize) -> u8 {
    match length {
        1 => 0x7f,
        n => (1u8 << (7 - n)) - 1,
    }
}

/// True if `value` could have been encoded in fewer than `used` bytes.
pub fn is_overlong(value: u32, used: usize) -> bool {
    debug_assert!((1..=MAX_SEQUENCE_LENGTH).contains(&used));

    let bits = u32::BITS - value.leading_zeros();
    match (1..=MAX_SEQUENCE_LENGTH).find(|&n| BITS_AVAILABLE[n] >= bits) {
        Some(minimum) => minimum < used,
        /* can't happen for anything the decoder accumulates; 6 bytes carry 31 bits */
        None => false,
    }
}

pub fn is_surrogate(value: u32) -> bool {
    (0xd800..=0xdfff).contains(&value)
}

/// Noncharacters are U+FDD0..U+FDEF plus the last two code points of each of
/// the 17 planes.
pub fn is_noncharacter(value: u32) -> bool {
    (0xfdd0..=0xfdef).contains(&value) || (value & 0xfffe == 0xfffe && value >> 16 <= 0x10)
}

/// Decodes the sequence starting at `offset`. An offset at or past the end
/// of the slice is reported as a truncated sequence.
pub fn decode_at(bytes: &[u8], offset: usize) -> Result<Decoded, DecodeError> {
    let result = decode_unlogged(bytes, offset);

    if let Err(e) = &result {
        let tail = bytes.get(offset..).unwrap_or(&[]);
        let window = &tail[..tail.len().min(MAX_SEQUENCE_LENGTH)];
        tracing::debug!(offset, bytes = %util::fmt_hex(window), error = %e, "rejected UTF-8 sequence");
    }

    result
}

fn decode_unlogged(bytes: &[u8], offset: usize) -> Result<Decoded, DecodeError> {
    let Some(&lead) = bytes.get(offset) else {
        return Err(DecodeError::Truncated { offset, needed: 1, available: 0 });
    };
    let length = sequence_length(lead).ok_or(DecodeError::InvalidStartByte { offset, byte: lead })?;

    let sequence = bytes.get(offset..offset + length).ok_or(DecodeError::Truncated {
        offset,
        needed: length,
        available: bytes.len() - offset,
    })?;

    let mut value = u32::from(lead & first_byte_mask(length));
    for (i, &byte) in sequence.iter().enumerate().skip(1) {
        if !is_continuation(byte) {
            return Err(DecodeError::InvalidContinuation { offset: offset + i, byte });
        }
        value = (value << 6) | u32::from(byte & 0x3f);
    }

    if is_overlong(value, length) {
        return Err(DecodeError::Overlong { offset, value });
    }

    if is_surrogate(value) {
        return Err(DecodeError::Surrogate { offset, value });
    }

    if is_noncharacter(value) {
        return Err(DecodeError::Noncharacter { offset, value });
    }

    Ok(Decoded { value: CodePoint(value), len: length })
}

/// Finds where the sequence ending at `offset` starts by scanning backwards
/// for a byte that isn't a continuation byte. Returns None at the start of the
/// slice. The scan looks at no more than [MAX_SEQUENCE_LENGTH] bytes.
pub fn find_previous(bytes: &[u8], offset: usize) -> Result<Option<usize>, DecodeError> {
    let offset = offset.min(bytes.len());
    if offset == 0 {
        return Ok(None);
    }

    let floor = offset.saturating_sub(MAX_SEQUENCE_LENGTH);
    match (floor..offset).rev().find(|&i| !is_continuation(bytes[i])) {
        Some(i) => Ok(Some(i)),
        None => Err(DecodeError::InvalidStartByte { offset: floor, byte: bytes[floor] }),
    }
}

/// Decodes the code point that ends at `offset`. The sequence found must end
/// exactly there; stray continuation bytes in between are rejected.
pub fn decode_before(bytes: &[u8], offset: usize) -> Result<Option<(usize, Decoded)>, DecodeError> {
    let Some(start) = find_previous(bytes, offset)? else { return Ok(None) };
    let decoded = decode_at(bytes, start)?;

    let end = start + decoded.len;
    if end != offset {
        debug_assert!(end < offset);
        return Err(DecodeError::InvalidStartByte { offset: end, byte: bytes[end] });
    }

    Ok(Some((start, decoded)))
}

/// Length of a leading byte order mark, if there is one.
pub fn bom_length(bytes: &[u8]) -> usize {
    if bytes.starts_with(&BYTE_ORDER_MARK) {
        BYTE_ORDER_MARK.len()
    } else {
        0
    }
}
