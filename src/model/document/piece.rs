use std::fmt;
use std::iter;
use std::ops;
use std::slice;
use std::sync;

use crate::model::space::TextResource;
use crate::model::utf8::iter::CodePointIter;
use crate::model::utf8::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PieceError {
    #[error("piece {start}..{end} extends past the end of a {size} byte resource")]
    OutOfBounds { start: usize, end: usize, size: usize },

    #[error("piece {start}..{end} ends before it starts")]
    Inverted { start: usize, end: usize },
}

/// A contiguous span of one resource. The resource is shared with every other
/// piece that refers to it and lives as long as the last of them.
#[derive(Clone)]
pub struct Piece {
    resource: sync::Arc<dyn TextResource>,
    range: ops::Range<usize>,
}

impl Piece {
    pub fn new(resource: sync::Arc<dyn TextResource>, range: ops::Range<usize>) -> Result<Piece, PieceError> {
        if range.start > range.end {
            return Err(PieceError::Inverted { start: range.start, end: range.end });
        }

        let size = resource.size();
        if range.end > size {
            return Err(PieceError::OutOfBounds { start: range.start, end: range.end, size });
        }

        Ok(Piece { resource, range })
    }

    /// Spans the entire resource.
    pub fn whole(resource: sync::Arc<dyn TextResource>) -> Piece {
        let range = 0..resource.size();
        Piece { resource, range }
    }

    /// Spans the resource from `start` on, clamped to its size.
    pub(crate) fn from_offset(resource: sync::Arc<dyn TextResource>, start: usize) -> Piece {
        let size = resource.size();
        Piece { resource, range: start.min(size)..size }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.resource.data()[self.range.clone()]
    }

    pub fn range(&self) -> ops::Range<usize> {
        self.range.clone()
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn resource(&self) -> &sync::Arc<dyn TextResource> {
        &self.resource
    }

    pub fn begin(&self) -> Result<CodePointIter<'_>, DecodeError> {
        CodePointIter::new(self.bytes())
    }

    pub fn end(&self) -> CodePointIter<'_> {
        CodePointIter::end(self.bytes())
    }
}

impl fmt::Debug for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Piece")
            .field("range", &self.range)
            .field("resource_size", &self.resource.size())
            .finish()
    }
}

/// Pieces in document order. The document's contents are the concatenation
/// of every piece's bytes.
#[derive(Debug, Clone, Default)]
pub struct PieceSequence {
    pieces: Vec<Piece>,
}

impl PieceSequence {
    pub fn new() -> PieceSequence {
        PieceSequence::default()
    }

    pub fn push(&mut self, piece: Piece) {
        self.pieces.push(piece);
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Piece> {
        self.pieces.iter()
    }

    pub fn as_slice(&self) -> &[Piece] {
        &self.pieces
    }

    /// Total length of the document in bytes.
    pub fn byte_len(&self) -> usize {
        self.pieces.iter().map(Piece::len).sum()
    }
}

impl iter::FromIterator<Piece> for PieceSequence {
    fn from_iter<I: IntoIterator<Item = Piece>>(iter: I) -> PieceSequence {
        PieceSequence {
            pieces: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PieceSequence {
    type Item = &'a Piece;
    type IntoIter = slice::Iter<'a, Piece>;

    fn into_iter(self) -> Self::IntoIter {
        self.pieces.iter()
    }
}
