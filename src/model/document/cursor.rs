//! Cursors walk the code points of a whole piece sequence, hopping from one
//! piece to the next as if the document were a single buffer. Empty pieces
//! are skipped in both directions.

use std::iter;

use crate::model::document::piece::Piece;
use crate::model::utf8::iter::CodePointIter;
use crate::model::utf8::CodePoint;
use crate::model::utf8::DecodeError;

#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    pieces: &'a [Piece],
    /* pieces.len() at the end */
    piece: usize,
    position: CodePointIter<'a>,
}

impl<'a> Cursor<'a> {
    pub(crate) fn begin(pieces: &'a [Piece]) -> Result<Cursor<'a>, DecodeError> {
        Self::first_from(pieces, 0)
    }

    pub(crate) fn end(pieces: &'a [Piece]) -> Cursor<'a> {
        Cursor {
            pieces,
            piece: pieces.len(),
            position: CodePointIter::default(),
        }
    }

    /// First code point of the first non-empty piece at or after `start`.
    fn first_from(pieces: &'a [Piece], start: usize) -> Result<Cursor<'a>, DecodeError> {
        match pieces.iter().enumerate().skip(start).find(|(_, p)| !p.is_empty()) {
            Some((piece, p)) => Ok(Cursor {
                pieces,
                piece,
                position: p.begin()?,
            }),
            None => Ok(Self::end(pieces)),
        }
    }

    fn previous_nonempty(&self) -> Option<usize> {
        self.pieces[..self.piece].iter().rposition(|p| !p.is_empty())
    }

    pub fn get(&self) -> Option<CodePoint> {
        self.position.get()
    }

    pub fn is_end(&self) -> bool {
        self.piece == self.pieces.len()
    }

    /// True when there is nothing before this position. That includes the
    /// end cursor of an empty document.
    pub fn is_first(&self) -> bool {
        (self.is_end() || self.position.is_first()) && self.previous_nonempty().is_none()
    }

    /// Moves to the next code point, crossing into the next non-empty piece
    /// when this one runs out. No-op at the end.
    pub fn advance(&mut self) -> Result<(), DecodeError> {
        if self.is_end() {
            return Ok(());
        }

        let mut next = self.position;
        next.advance()?;

        if next.is_end() {
            *self = Self::first_from(self.pieces, self.piece + 1)?;
        } else {
            self.position = next;
        }

        debug_assert!(self.is_end() || self.get().is_some());
        Ok(())
    }

    /// Moves to the previous code point, crossing back into the previous
    /// non-empty piece when at the start of this one. No-op at the first
    /// position.
    pub fn retreat(&mut self) -> Result<(), DecodeError> {
        if !self.is_end() && !self.position.is_first() {
            return self.position.retreat();
        }

        let Some(piece) = self.previous_nonempty() else { return Ok(()) };

        let mut position = self.pieces[piece].end();
        position.retreat()?;

        self.piece = piece;
        self.position = position;
        Ok(())
    }
}

impl PartialEq for Cursor<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self.is_end(), other.is_end()) {
            (true, true) => true,
            (false, false) => std::ptr::eq(self.pieces, other.pieces) && self.piece == other.piece && self.position == other.position,
            _ => false,
        }
    }
}

impl Eq for Cursor<'_> {
}

/// Walks a document from its last code point towards its first.
#[derive(Debug, Clone, Copy)]
pub struct ReverseCursor<'a> {
    cursor: Cursor<'a>,
    pre_begin: bool,
}

impl<'a> ReverseCursor<'a> {
    /// Steps back once from `cursor`. From the end cursor this lands on the
    /// last code point; from the first position it is pre-begin.
    pub fn new(cursor: Cursor<'a>) -> Result<ReverseCursor<'a>, DecodeError> {
        let mut rev = ReverseCursor {
            cursor,
            pre_begin: false,
        };
        rev.advance()?;
        Ok(rev)
    }

    pub fn get(&self) -> Option<CodePoint> {
        if self.pre_begin {
            None
        } else {
            self.cursor.get()
        }
    }

    pub fn is_pre_begin(&self) -> bool {
        self.pre_begin
    }

    pub fn advance(&mut self) -> Result<(), DecodeError> {
        if self.pre_begin {
            Ok(())
        } else if self.cursor.is_first() {
            self.pre_begin = true;
            Ok(())
        } else {
            self.cursor.retreat()
        }
    }

    /// No-op at the reverse end of an empty document.
    pub fn retreat(&mut self) -> Result<(), DecodeError> {
        if self.pre_begin {
            if !self.cursor.is_end() {
                self.pre_begin = false;
            }
            Ok(())
        } else {
            self.cursor.advance()
        }
    }
}

impl PartialEq for ReverseCursor<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self.pre_begin, other.pre_begin) {
            (true, true) => true,
            (false, false) => self.cursor == other.cursor,
            _ => false,
        }
    }
}

impl Eq for ReverseCursor<'_> {
}

/// Double-ended Rust iterator over a document's code points. Yields the first
/// decode error it runs into from either end, then stops.
#[derive(Debug, Clone)]
pub struct CodePoints<'a> {
    pieces: &'a [Piece],
    /* None until the first call to next(); placing it decodes */
    front: Option<Cursor<'a>>,
    /* one past the last code point not yet yielded from the back */
    back: Cursor<'a>,
    /* an advance past the last yielded code point failed */
    pending: Option<DecodeError>,
    done: bool,
}

impl<'a> CodePoints<'a> {
    pub(crate) fn new(pieces: &'a [Piece]) -> CodePoints<'a> {
        CodePoints {
            pieces,
            front: None,
            back: Cursor::end(pieces),
            pending: None,
            done: false,
        }
    }

    fn fail(&mut self, e: DecodeError) -> Option<Result<CodePoint, DecodeError>> {
        self.done = true;
        Some(Err(e))
    }

    fn exhausted(&self) -> bool {
        match &self.front {
            Some(front) => *front == self.back,
            None => self.back.is_first(),
        }
    }
}

impl iter::Iterator for CodePoints<'_> {
    type Item = Result<CodePoint, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if let Some(e) = self.pending.take() {
            return self.fail(e);
        }

        if self.exhausted() {
            return None;
        }

        let mut front = match self.front {
            Some(front) => front,
            None => match Cursor::begin(self.pieces) {
                Ok(front) => front,
                Err(e) => return self.fail(e),
            },
        };

        let value = front.get()?;
        if let Err(e) = front.advance() {
            self.pending = Some(e);
        }
        self.front = Some(front);
        Some(Ok(value))
    }
}

impl iter::DoubleEndedIterator for CodePoints<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if let Some(e) = self.pending.take() {
            return self.fail(e);
        }

        if self.exhausted() {
            return None;
        }

        let mut back = self.back;
        if let Err(e) = back.retreat() {
            return self.fail(e);
        }

        self.back = back;
        back.get().map(Ok)
    }
}

impl iter::FusedIterator for CodePoints<'_> {
}
