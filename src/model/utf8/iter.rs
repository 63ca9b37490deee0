use std::iter;

use crate::model::utf8;
use crate::model::utf8::CodePoint;
use crate::model::utf8::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// One past the last code point. Never dereferenced.
    End,
    At { value: CodePoint, start: usize, end: usize },
}

/// A bidirectional cursor over the code points in a byte slice. Every step
/// decodes and validates the code point it lands on; a step that fails leaves
/// the iterator where it was.
#[derive(Debug, Clone, Copy)]
pub struct CodePointIter<'a> {
    bytes: &'a [u8],
    position: Position,
}

impl<'a> CodePointIter<'a> {
    /// Positions the iterator on the first code point of `bytes`, or at the
    /// end if `bytes` is empty.
    pub fn new(bytes: &'a [u8]) -> Result<Self, DecodeError> {
        Self::at(bytes, 0)
    }

    /// Positions the iterator on the code point starting at `offset`.
    /// Offsets at or past the end of the slice produce the end iterator.
    pub fn at(bytes: &'a [u8], offset: usize) -> Result<Self, DecodeError> {
        if offset >= bytes.len() {
            return Ok(Self::end(bytes));
        }

        let decoded = utf8::decode_at(bytes, offset)?;
        Ok(CodePointIter {
            bytes,
            position: Position::At { value: decoded.value, start: offset, end: offset + decoded.len },
        })
    }

    pub fn end(bytes: &'a [u8]) -> Self {
        CodePointIter {
            bytes,
            position: Position::End,
        }
    }

    pub fn is_end(&self) -> bool {
        self.position == Position::End
    }

    pub fn get(&self) -> Option<CodePoint> {
        match self.position {
            Position::At { value, .. } => Some(value),
            Position::End => None,
        }
    }

    /// Byte offset of the current code point; the slice length at the end.
    pub fn offset(&self) -> usize {
        match self.position {
            Position::At { start, .. } => start,
            Position::End => self.bytes.len(),
        }
    }

    /// True on the first code point of the slice, or at the end of an empty
    /// slice. Retreating from here does nothing.
    pub fn is_first(&self) -> bool {
        self.offset() == 0
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Moves to the next code point. No-op at the end.
    pub fn advance(&mut self) -> Result<(), DecodeError> {
        match self.position {
            Position::At { end, .. } => {
                *self = Self::at(self.bytes, end)?;
                Ok(())
            },
            Position::End => Ok(()),
        }
    }

    /// Moves to the previous code point. No-op on the first code point.
    pub fn retreat(&mut self) -> Result<(), DecodeError> {
        match utf8::decode_before(self.bytes, self.offset())? {
            Some((start, decoded)) => {
                self.position = Position::At { value: decoded.value, start, end: start + decoded.len };
                Ok(())
            },
            None => Ok(()),
        }
    }
}

impl Default for CodePointIter<'_> {
    fn default() -> Self {
        CodePointIter::end(&[])
    }
}

impl PartialEq for CodePointIter<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self.position, other.position) {
            /* end iterators from any range are equal */
            (Position::End, Position::End) => true,
            (Position::At { start: a, .. }, Position::At { start: b, .. }) => a == b && std::ptr::eq(self.bytes.as_ptr(), other.bytes.as_ptr()),
            _ => false,
        }
    }
}

impl Eq for CodePointIter<'_> {
}

/// Reverse adaptor over [CodePointIter]. Advancing moves towards the start of
/// the slice.
#[derive(Debug, Clone, Copy)]
pub struct ReverseCodePointIter<'a> {
    inner: CodePointIter<'a>,
    /// Stepped off the front. Distinct from any dereferenceable position.
    pre_begin: bool,
}

impl<'a> ReverseCodePointIter<'a> {
    /// Steps back once from `forward`, the way a reverse iterator built from
    /// a forward one does. Built from a forward end, this dereferences the
    /// last code point; built from the first position, it is pre-begin.
    pub fn new(forward: CodePointIter<'a>) -> Result<Self, DecodeError> {
        let mut rev = ReverseCodePointIter {
            inner: forward,
            pre_begin: false,
        };
        rev.advance()?;
        Ok(rev)
    }

    pub fn get(&self) -> Option<CodePoint> {
        if self.pre_begin {
            None
        } else {
            self.inner.get()
        }
    }

    pub fn is_pre_begin(&self) -> bool {
        self.pre_begin
    }

    pub fn advance(&mut self) -> Result<(), DecodeError> {
        if self.pre_begin {
            Ok(())
        } else if self.inner.is_first() {
            self.pre_begin = true;
            Ok(())
        } else {
            self.inner.retreat()
        }
    }

    /// No-op at the reverse end of an empty range.
    pub fn retreat(&mut self) -> Result<(), DecodeError> {
        if self.pre_begin {
            if !self.inner.is_end() {
                self.pre_begin = false;
            }
            Ok(())
        } else {
            self.inner.advance()
        }
    }
}

impl Default for ReverseCodePointIter<'_> {
    fn default() -> Self {
        ReverseCodePointIter {
            inner: CodePointIter::default(),
            pre_begin: true,
        }
    }
}

impl PartialEq for ReverseCodePointIter<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self.pre_begin, other.pre_begin) {
            (true, true) => true,
            (false, false) => self.inner == other.inner,
            _ => false,
        }
    }
}

impl Eq for ReverseCodePointIter<'_> {
}

/// Double-ended Rust iterator over the code points in a byte slice. Yields
/// the first decode error it runs into, then stops.
#[derive(Debug, Clone)]
pub struct CodePoints<'a> {
    bytes: &'a [u8],
    front: usize,
    back: usize,
    failed: bool,
}

impl<'a> CodePoints<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        CodePoints {
            bytes,
            front: 0,
            back: bytes.len(),
            failed: false,
        }
    }

    fn fail(&mut self, e: DecodeError) -> Option<Result<CodePoint, DecodeError>> {
        self.failed = true;
        Some(Err(e))
    }
}

impl iter::Iterator for CodePoints<'_> {
    type Item = Result<CodePoint, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.front >= self.back {
            return None;
        }

        match utf8::decode_at(&self.bytes[..self.back], self.front) {
            Ok(decoded) => {
                self.front += decoded.len;
                Some(Ok(decoded.value))
            },
            Err(e) => self.fail(e),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            let remaining = self.back - self.front;
            (remaining.div_ceil(utf8::MAX_SEQUENCE_LENGTH), Some(remaining))
        }
    }
}

impl iter::DoubleEndedIterator for CodePoints<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.failed || self.front >= self.back {
            return None;
        }

        match utf8::decode_before(&self.bytes[self.front..self.back], self.back - self.front) {
            Ok(Some((start, decoded))) => {
                self.back = self.front + start;
                Some(Ok(decoded.value))
            },
            Ok(None) => None,
            Err(e) => self.fail(e.shifted(self.front)),
        }
    }
}

impl iter::FusedIterator for CodePoints<'_> {
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;

    const GREEK: [u8; 11] = [0xce, 0xba, 0xe1, 0xbd, 0xb9, 0xcf, 0x83, 0xce, 0xbc, 0xce, 0xb5];
    const GREEK_DECODED: [u32; 5] = [0x3ba, 0x1f79, 0x3c3, 0x3bc, 0x3b5];

    fn forward(bytes: &[u8]) -> Result<Vec<u32>, DecodeError> {
        let mut it = CodePointIter::new(bytes)?;
        let end = CodePointIter::end(bytes);
        let mut out = Vec::new();
        while it != end {
            out.push(it.get().unwrap().value());
            it.advance()?;
        }
        Ok(out)
    }

    fn reverse(bytes: &[u8]) -> Result<Vec<u32>, DecodeError> {
        let mut it = ReverseCodePointIter::new(CodePointIter::end(bytes))?;
        let end = ReverseCodePointIter::new(CodePointIter::new(bytes)?)?;
        let mut out = Vec::new();
        while it != end {
            out.push(it.get().unwrap().value());
            it.advance()?;
        }
        Ok(out)
    }

    /// Drops characters the decoder refuses, so arbitrary strings are valid input.
    fn acceptable(s: &str) -> String {
        s.chars().filter(|&c| !utf8::is_noncharacter(c as u32)).collect()
    }

    #[test]
    fn ascii_forward_and_reverse() {
        let text = b"this is a test file.";
        let expected: Vec<u32> = text.iter().map(|&b| b as u32).collect();

        assert_eq!(forward(text).unwrap(), expected);
        assert_eq!(reverse(text).unwrap(), expected.iter().rev().cloned().collect::<Vec<_>>());
    }

    #[test]
    fn multibyte_forward_and_reverse() {
        assert_eq!(forward(&GREEK).unwrap(), GREEK_DECODED.to_vec());
        assert_eq!(reverse(&GREEK).unwrap(), GREEK_DECODED.iter().rev().cloned().collect::<Vec<_>>());
    }

    #[test]
    fn iterator_identity() {
        let a = CodePointIter::at(&GREEK, 2).unwrap();
        let b = CodePointIter::at(&GREEK, 2).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.get(), b.get());

        let copy = a;
        assert_eq!(copy, a);

        assert_ne!(CodePointIter::at(&GREEK, 5).unwrap(), a);
        assert_ne!(CodePointIter::default(), a);
    }

    #[test]
    fn end_iterators_are_all_equal() {
        let other = *b"abc";
        assert_eq!(CodePointIter::default(), CodePointIter::end(&GREEK));
        assert_eq!(CodePointIter::end(&other), CodePointIter::end(&GREEK));
        assert_eq!(CodePointIter::at(&GREEK, 11).unwrap(), CodePointIter::end(&GREEK));
    }

    #[test]
    fn decrementing_end_lands_on_last() {
        let mut it = CodePointIter::end(&GREEK);
        it.retreat().unwrap();
        assert_eq!(it, CodePointIter::at(&GREEK, 9).unwrap());
        assert_eq!(it.get().map(CodePoint::value), Some(0x3b5));
    }

    #[test]
    fn retreat_at_first_is_noop() {
        let mut it = CodePointIter::new(&GREEK).unwrap();
        it.retreat().unwrap();
        assert_eq!(it, CodePointIter::new(&GREEK).unwrap());
        assert!(it.is_first());
    }

    #[test]
    fn advance_at_end_is_noop() {
        let mut it = CodePointIter::end(&GREEK);
        it.advance().unwrap();
        assert!(it.is_end());
        assert_eq!(it.get(), None);
    }

    #[test]
    fn empty_range() {
        let it = CodePointIter::new(&[]).unwrap();
        assert!(it.is_end());
        assert_eq!(it, CodePointIter::end(&[]));

        let rbegin = ReverseCodePointIter::new(CodePointIter::end(&[])).unwrap();
        let rend = ReverseCodePointIter::new(CodePointIter::new(&[]).unwrap()).unwrap();
        assert_eq!(rbegin, rend);
        assert_eq!(rbegin, ReverseCodePointIter::default());

        let mut stuck = rend;
        stuck.retreat().unwrap();
        assert!(stuck.is_pre_begin());
    }

    #[test]
    fn reverse_steps() {
        let mut rit = ReverseCodePointIter::new(CodePointIter::end(&GREEK)).unwrap();
        assert_eq!(rit.get().map(CodePoint::value), Some(0x3b5));
        rit.advance().unwrap();
        assert_eq!(rit.get().map(CodePoint::value), Some(0x3bc));
        rit.retreat().unwrap();
        assert_eq!(rit.get().map(CodePoint::value), Some(0x3b5));

        let mut rit = ReverseCodePointIter::new(CodePointIter::new(&GREEK).unwrap()).unwrap();
        assert!(rit.is_pre_begin());
        assert_eq!(rit.get(), None);
        rit.advance().unwrap();
        assert!(rit.is_pre_begin());
        rit.retreat().unwrap();
        assert_eq!(rit.get().map(CodePoint::value), Some(0x3ba));
    }

    #[test]
    fn failed_step_leaves_iterator_in_place() {
        /* 'a' then a surrogate */
        let bytes = [0x61, 0xed, 0xa0, 0x80];
        let mut it = CodePointIter::new(&bytes).unwrap();
        assert_matches!(it.advance(), Err(DecodeError::Surrogate { offset: 1, .. }));
        assert_eq!(it.offset(), 0);
        assert_eq!(it.get(), Some(CodePoint::from('a')));

        let mut it = CodePointIter::end(&bytes);
        assert_matches!(it.retreat(), Err(DecodeError::Surrogate { offset: 1, .. }));
        assert!(it.is_end());
    }

    #[test]
    fn construction_decodes_eagerly() {
        assert_matches!(CodePointIter::new(&[0xc0, 0x80]), Err(DecodeError::Overlong { .. }));
        assert_matches!(CodePointIter::new(&[0xbf]), Err(DecodeError::InvalidStartByte { .. }));
    }

    #[test]
    fn truncated_tail_fails_in_both_directions() {
        let bytes = [0x61, 0x62, 0xe2, 0x82];
        assert_matches!(forward(&bytes), Err(DecodeError::Truncated { offset: 2, .. }));
        assert_matches!(reverse(&bytes), Err(DecodeError::Truncated { offset: 2, .. }));
    }

    #[test]
    fn stray_continuation_fails_in_reverse() {
        let bytes = [0x61, 0x80];
        assert_matches!(forward(&bytes), Err(DecodeError::InvalidStartByte { offset: 1, byte: 0x80 }));
        assert_matches!(reverse(&bytes), Err(DecodeError::InvalidStartByte { offset: 1, byte: 0x80 }));
    }

    #[test]
    fn code_points_adaptor() {
        let decoded: Vec<u32> = CodePoints::new(&GREEK).map(|r| r.unwrap().value()).collect();
        assert_eq!(decoded, GREEK_DECODED.to_vec());

        let reversed: Vec<u32> = CodePoints::new(&GREEK).rev().map(|r| r.unwrap().value()).collect();
        assert_eq!(reversed, GREEK_DECODED.iter().rev().cloned().collect::<Vec<_>>());
    }

    #[test]
    fn code_points_meet_in_the_middle() {
        let mut it = CodePoints::new(&GREEK);
        assert_eq!(it.next().map(|r| r.unwrap().value()), Some(0x3ba));
        assert_eq!(it.next_back().map(|r| r.unwrap().value()), Some(0x3b5));
        assert_eq!(it.next().map(|r| r.unwrap().value()), Some(0x1f79));
        assert_eq!(it.next_back().map(|r| r.unwrap().value()), Some(0x3bc));
        assert_eq!(it.next().map(|r| r.unwrap().value()), Some(0x3c3));
        assert_eq!(it.next(), None);
        assert_eq!(it.next_back(), None);
    }

    #[test]
    fn code_points_stop_after_error() {
        let bytes = [0x61, 0xff, 0x62];
        let mut it = CodePoints::new(&bytes);
        assert_eq!(it.next(), Some(Ok(CodePoint::from('a'))));
        assert_matches!(it.next(), Some(Err(DecodeError::InvalidStartByte { offset: 1, byte: 0xff })));
        assert_eq!(it.next(), None);
        assert_eq!(it.next_back(), None);
    }

    #[quickcheck]
    fn forward_and_reverse_are_mirrors(s: String) -> bool {
        let s = acceptable(&s);
        let mut backwards = reverse(s.as_bytes()).unwrap();
        backwards.reverse();
        forward(s.as_bytes()).unwrap() == backwards
    }

    #[quickcheck]
    fn step_count_matches_scalar_count(s: String) -> bool {
        let s = acceptable(&s);
        let expected: Vec<u32> = s.chars().map(|c| c as u32).collect();
        forward(s.as_bytes()).unwrap() == expected && CodePoints::new(s.as_bytes()).count() == expected.len()
    }

    #[quickcheck]
    fn advance_and_retreat_are_inverses(s: String) -> bool {
        let s = acceptable(&s);
        let bytes = s.as_bytes();
        let mut it = CodePointIter::new(bytes).unwrap();

        while !it.is_end() {
            let here = it;
            it.advance().unwrap();
            let mut back = it;
            back.retreat().unwrap();
            if back != here {
                return false;
            }
        }
        true
    }
}
